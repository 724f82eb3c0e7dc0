//! # Authenticator Core
//!
//! Namespaced TOTP account management.
//!
//! This crate provides:
//! - Domain types for namespaces and accounts
//! - [`Authenticator`], which keeps namespace records, account records, and
//!   the namespace index file consistent with each other
//! - A [`SecretStore`] trait with in-memory and (optionally) keyring-based
//!   implementations
//! - TOTP generation from a prioritized chain of secret sources
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use authenticator_core::{Account, Authenticator, GenerateTotpOptions};
//!
//! let authenticator = Authenticator::from_env(true)?;
//!
//! authenticator.create_namespace("team1", "Team One")?;
//! authenticator.set_account("team1", Account::new("alice").with_secret("JBSWY3DP"))?;
//!
//! let code = authenticator.generate_totp("team1", "alice", GenerateTotpOptions::default())?;
//! ```

mod account;
pub mod authenticator;
pub mod config;
pub mod error;
pub mod model;
mod namespace;
pub mod store;
pub mod totp;

// Re-export commonly used types at crate root
pub use model::{Account, Namespace, UriError};

pub use store::{MemoryStore, Secret, SecretStore, SecretStoreExt, StoreError, create_store};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use authenticator::{Authenticator, SERVICE_NAME};

pub use config::{CONFIG_ENV, ConfigError, ConfigIndex, IndexFile};

pub use error::AuthenticatorError;

pub use totp::{
    AccountSecretProvider,
    Clock,
    EnvSecret,
    FixedClock,
    GenerateTotpOptions,
    SecretChain,
    SystemClock,
    TOTP_SECRET_ENV,
    TotpError,
    TotpGenerator,
    TotpSecretGetter,
};
