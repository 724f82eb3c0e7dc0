//! Sources of TOTP secrets.

use std::sync::Arc;

use crate::store::Secret;

/// Environment variable consulted for a TOTP secret.
pub const TOTP_SECRET_ENV: &str = "AUTHENTICATOR_TOTP_SECRET";

/// A place a TOTP secret may come from.
///
/// `None` means "no secret here" and is a normal outcome, not a failure.
pub trait TotpSecretGetter: Send + Sync {
    /// Look up the secret.
    fn totp_secret(&self) -> Option<Secret>;
}

impl TotpSecretGetter for Secret {
    fn totp_secret(&self) -> Option<Secret> {
        (!self.is_empty()).then(|| self.clone())
    }
}

impl<G: TotpSecretGetter + ?Sized> TotpSecretGetter for Arc<G> {
    fn totp_secret(&self) -> Option<Secret> {
        (**self).totp_secret()
    }
}

/// Reads the secret from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvSecret {
    var: String,
}

impl EnvSecret {
    /// Read from the given variable.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvSecret {
    fn default() -> Self {
        Self::new(TOTP_SECRET_ENV)
    }
}

impl TotpSecretGetter for EnvSecret {
    fn totp_secret(&self) -> Option<Secret> {
        std::env::var(&self.var)
            .ok()
            .filter(|value| !value.is_empty())
            .map(Secret::new)
    }
}

/// Tries each getter in order and returns the first non-empty secret.
///
/// Getters after the first hit are never called.
#[derive(Clone, Default)]
pub struct SecretChain {
    getters: Vec<Arc<dyn TotpSecretGetter>>,
}

impl SecretChain {
    /// Chain the given getters, highest priority first.
    pub fn new(getters: Vec<Arc<dyn TotpSecretGetter>>) -> Self {
        Self { getters }
    }

    /// Append a lower-priority getter.
    pub fn push(&mut self, getter: Arc<dyn TotpSecretGetter>) {
        self.getters.push(getter);
    }

    /// Number of getters in the chain.
    pub fn len(&self) -> usize {
        self.getters.len()
    }

    /// Whether the chain has no getters.
    pub fn is_empty(&self) -> bool {
        self.getters.is_empty()
    }
}

impl TotpSecretGetter for SecretChain {
    fn totp_secret(&self) -> Option<Secret> {
        self.getters
            .iter()
            .find_map(|getter| getter.totp_secret().filter(|secret| !secret.is_empty()))
    }
}

impl std::fmt::Debug for SecretChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretChain")
            .field("getters", &self.getters.len())
            .finish()
    }
}
