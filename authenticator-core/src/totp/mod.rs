//! TOTP code generation.
//!
//! This module provides:
//! - [`TotpSecretGetter`] - Trait for anything that can supply a secret
//! - [`EnvSecret`], [`AccountSecretProvider`], [`SecretChain`] - Secret sources
//! - [`TotpGenerator`] - Computes codes from a secret and a point in time
//! - [`Clock`] - Injectable time source
//! - [`GenerateTotpOptions`] - Knobs for [`Authenticator::generate_totp`]
//!
//! # Secret Precedence
//!
//! [`Authenticator::generate_totp`] resolves the secret from, in order:
//!
//! 1. [`GenerateTotpOptions::secret`], if set
//! 2. [`GenerateTotpOptions::secret_getter`], if set
//! 3. otherwise `AUTHENTICATOR_TOTP_SECRET`, then the stored account
//!
//! # Example
//!
//! ```rust,ignore
//! use authenticator_core::{Authenticator, GenerateTotpOptions};
//!
//! let code = authenticator.generate_totp("team1", "alice", GenerateTotpOptions::default())?;
//! println!("{}", code);
//! ```

use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use totp_rs::{Algorithm, TOTP};

use crate::authenticator::Authenticator;
use crate::store::Secret;

mod getter;
mod provider;

pub use getter::{EnvSecret, SecretChain, TOTP_SECRET_ENV, TotpSecretGetter};
pub use provider::AccountSecretProvider;

/// Default number of digits in a code.
pub const DEFAULT_DIGITS: usize = 6;

/// Default time step in seconds.
pub const DEFAULT_STEP: u64 = 30;

/// Code lengths accepted by [`TotpGenerator`].
pub const DIGITS_RANGE: RangeInclusive<usize> = 6..=8;

/// Error type for code generation.
#[derive(Debug, Error)]
pub enum TotpError {
    /// None of the configured sources produced a secret.
    #[error("no totp secret")]
    NoSecret,

    /// The secret is not valid base32.
    #[error("invalid totp secret: {message}")]
    InvalidSecret { message: String },

    /// The generator settings cannot produce a code.
    #[error("invalid totp parameters: {message}")]
    InvalidParameters { message: String },

    /// The clock reported a time before the unix epoch.
    #[error("time is before the unix epoch: {0}")]
    InvalidTime(DateTime<Utc>),
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Computes RFC 6238 codes.
#[derive(Debug, Clone)]
pub struct TotpGenerator {
    algorithm: Algorithm,
    digits: usize,
    step: u64,
}

impl Default for TotpGenerator {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::SHA1,
            digits: DEFAULT_DIGITS,
            step: DEFAULT_STEP,
        }
    }
}

impl TotpGenerator {
    /// Use a different HMAC algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Produce codes with this many digits.
    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    /// Use a different time step, in seconds.
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Compute the code for `secret` at `at`.
    ///
    /// `secret` is unpadded RFC 4648 base32. Secrets shorter than the
    /// RFC 4226 minimum are accepted; the digit count and step are not.
    pub fn generate(&self, secret: &Secret, at: DateTime<Utc>) -> Result<String, TotpError> {
        self.validate()?;

        if secret.is_empty() {
            return Err(TotpError::NoSecret);
        }

        let bytes = totp_rs::Secret::Encoded(secret.expose().to_string())
            .to_bytes()
            .map_err(|e| TotpError::InvalidSecret {
                message: format!("{:?}", e),
            })?;

        let timestamp = u64::try_from(at.timestamp()).map_err(|_| TotpError::InvalidTime(at))?;

        let totp = TOTP::new_unchecked(self.algorithm, self.digits, 1, self.step, bytes);

        Ok(totp.generate(timestamp))
    }

    fn validate(&self) -> Result<(), TotpError> {
        if self.step == 0 {
            return Err(TotpError::InvalidParameters {
                message: "step must be at least one second".to_string(),
            });
        }

        if !DIGITS_RANGE.contains(&self.digits) {
            return Err(TotpError::InvalidParameters {
                message: format!(
                    "digits must be between {} and {}, got {}",
                    DIGITS_RANGE.start(),
                    DIGITS_RANGE.end(),
                    self.digits
                ),
            });
        }

        Ok(())
    }
}

/// Options for [`Authenticator::generate_totp`].
///
/// Every field is optional; `Default` gives the default secret chain, the
/// wall clock, no logging, and 6-digit SHA-1 codes with a 30 second step.
#[derive(Clone, Default)]
pub struct GenerateTotpOptions {
    /// Use this secret and nothing else.
    pub secret: Option<Secret>,

    /// Replace the default environment-then-account chain.
    pub secret_getter: Option<Arc<dyn TotpSecretGetter>>,

    /// Time source; the wall clock when unset.
    pub clock: Option<Arc<dyn Clock>>,

    /// Subscriber that receives log events emitted while generating.
    ///
    /// Unset means events are dropped, whatever subscriber the caller has
    /// installed.
    pub logger: Option<tracing::Dispatch>,

    /// Code parameters.
    pub generator: TotpGenerator,
}

impl std::fmt::Debug for GenerateTotpOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateTotpOptions")
            .field("secret", &self.secret)
            .field("secret_getter", &self.secret_getter.is_some())
            .field("clock", &self.clock.is_some())
            .field("logger", &self.logger.is_some())
            .field("generator", &self.generator)
            .finish()
    }
}

impl Authenticator {
    /// Generate the current code for an account.
    ///
    /// See the [module docs](crate::totp) for how the secret is chosen.
    pub fn generate_totp(
        &self,
        namespace: &str,
        account: &str,
        options: GenerateTotpOptions,
    ) -> Result<String, TotpError> {
        let dispatch = options.logger.clone().unwrap_or_else(tracing::Dispatch::none);

        tracing::dispatcher::with_default(&dispatch, || {
            self.generate_totp_with(namespace, account, options)
        })
    }

    fn generate_totp_with(
        &self,
        namespace: &str,
        account: &str,
        options: GenerateTotpOptions,
    ) -> Result<String, TotpError> {
        let chain = self.secret_chain(namespace, account, &options);

        let secret = chain.totp_secret().ok_or(TotpError::NoSecret)?;
        let now = options
            .clock
            .as_ref()
            .map_or_else(Utc::now, |clock| clock.now());

        options.generator.generate(&secret, now)
    }

    fn secret_chain(
        &self,
        namespace: &str,
        account: &str,
        options: &GenerateTotpOptions,
    ) -> SecretChain {
        let mut chain = SecretChain::default();

        if let Some(secret) = &options.secret {
            chain.push(Arc::new(secret.clone()));
        }

        match &options.secret_getter {
            Some(getter) => chain.push(Arc::clone(getter)),
            None if chain.is_empty() => {
                chain.push(Arc::new(EnvSecret::default()));
                chain.push(Arc::new(AccountSecretProvider::new(
                    self.clone(),
                    namespace,
                    account,
                )));
            }
            None => {}
        }

        chain
    }
}
