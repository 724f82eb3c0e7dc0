//! TOTP secret backed by a stored account.

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::authenticator::Authenticator;
use crate::error::AuthenticatorError;
use crate::model::Account;
use crate::store::Secret;

use super::getter::TotpSecretGetter;

#[derive(Debug)]
enum FetchState {
    Unfetched,
    Fetched(Option<Secret>),
}

/// Secret of one stored account, looked up at most once.
///
/// The first [`totp_secret`](TotpSecretGetter::totp_secret) call reads the
/// account; every later call on the same provider returns that result, even
/// if the account changes afterwards. Writes through
/// [`set_totp_secret`](Self::set_totp_secret) and
/// [`delete_totp_secret`](Self::delete_totp_secret) update the cached value
/// directly.
///
/// The cache has its own lock, separate from the [`Authenticator`] lock.
/// Callers racing on the first lookup wait for it, so the account is read
/// once.
///
/// Log events go to the caller's current `tracing` subscriber unless a
/// logger is set with [`with_logger`](Self::with_logger).
pub struct AccountSecretProvider {
    authenticator: Authenticator,
    namespace: String,
    account: String,
    logger: Option<tracing::Dispatch>,
    state: Mutex<FetchState>,
}

impl AccountSecretProvider {
    /// Bind a provider to one account.
    pub fn new(
        authenticator: Authenticator,
        namespace: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            authenticator,
            namespace: namespace.into(),
            account: account.into(),
            logger: None,
            state: Mutex::new(FetchState::Unfetched),
        }
    }

    /// Send this provider's log events to `logger`.
    pub fn with_logger(mut self, logger: tracing::Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Namespace the provider is bound to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Account the provider is bound to.
    pub fn account(&self) -> &str {
        &self.account
    }

    fn logged<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.logger {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    fn fetch(&self) -> Option<Secret> {
        if self.namespace.is_empty() {
            debug!(account = %self.account, "failed to fetch totp secret due to missing namespace");
            return None;
        }

        if self.account.is_empty() {
            debug!(namespace = %self.namespace, "failed to fetch totp secret due to missing account");
            return None;
        }

        match self.authenticator.get_account(&self.namespace, &self.account) {
            Ok(account) => Some(account.totp_secret).filter(|secret| !secret.is_empty()),
            Err(e) if e.is_account_not_found() => {
                debug!(namespace = %self.namespace, account = %self.account, error = %e, "could not get totp secret");
                None
            }
            Err(e) => {
                error!(namespace = %self.namespace, account = %self.account, error = %e, "could not get totp secret");
                None
            }
        }
    }

    /// Store a new secret and issuer for the account.
    ///
    /// Creates the namespace (named after its id) if needed, and keeps the
    /// account's other fields. On success the cached secret becomes `secret`.
    pub fn set_totp_secret(&self, secret: Secret, issuer: &str) -> Result<(), AuthenticatorError> {
        let mut state = self.state.lock();

        self.logged(|| self.store_secret(&secret, issuer))?;

        *state = FetchState::Fetched(Some(secret).filter(|s| !s.is_empty()));

        Ok(())
    }

    fn store_secret(&self, secret: &Secret, issuer: &str) -> Result<(), AuthenticatorError> {
        match self.authenticator.create_namespace(&self.namespace, &self.namespace) {
            Ok(()) => {}
            Err(e) if e.is_namespace_exists() => {}
            Err(e) => return Err(e),
        }

        let mut account = match self.authenticator.get_account(&self.namespace, &self.account) {
            Ok(account) => account,
            Err(e) if e.is_account_not_found() => Account::new(self.account.as_str()),
            Err(e) => return Err(e),
        };

        account.totp_secret = secret.clone();
        account.issuer = issuer.to_string();

        self.authenticator.set_account(&self.namespace, account)
    }

    /// Delete the account. The cached secret is cleared first.
    pub fn delete_totp_secret(&self) -> Result<(), AuthenticatorError> {
        let mut state = self.state.lock();

        *state = FetchState::Fetched(None);

        self.logged(|| {
            self.authenticator
                .delete_account(&self.namespace, &self.account)
        })
    }
}

impl TotpSecretGetter for AccountSecretProvider {
    fn totp_secret(&self) -> Option<Secret> {
        let mut state = self.state.lock();

        if let FetchState::Fetched(secret) = &*state {
            return secret.clone();
        }

        let secret = self.logged(|| self.fetch());
        *state = FetchState::Fetched(secret.clone());

        secret
    }
}

impl std::fmt::Debug for AccountSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSecretProvider")
            .field("namespace", &self.namespace)
            .field("account", &self.account)
            .field("logger", &self.logger.is_some())
            .field("state", &*self.state.lock())
            .finish()
    }
}
