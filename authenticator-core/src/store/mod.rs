//! Secret storage abstraction.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`SecretStore`] - Trait for secret storage backends
//! - [`SecretStoreExt`] - Typed record access on top of any [`SecretStore`]
//! - [`MemoryStore`] - In-memory implementation for testing
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_store`] - Helper to select backend based on availability
//!
//! # Storage Key Convention
//!
//! Every entry is addressed by a `(service, key)` pair. Namespaces live under
//! their id, accounts under `{namespace}/{account}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use authenticator_core::store::{Secret, SecretStore, create_store};
//!
//! let store = create_store(true); // Prefer keyring if available
//!
//! store.set("authenticator", "team1/alice", &Secret::new("{}")).unwrap();
//!
//! let retrieved = store.get("authenticator", "team1/alice").unwrap();
//! assert_eq!(retrieved.expose(), "{}");
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod memory;
#[cfg(feature = "keyring-store")]
mod keyring;

pub use memory::MemoryStore;
#[cfg(feature = "keyring-store")]
pub use self::keyring::KeyringStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the memory is wiped when the value is dropped.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    /// Whether the secret holds no value at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Error type for secret store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested secret was not found.
    #[error("secret not found: {service}/{key}")]
    NotFound { service: String, key: String },

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },
}

impl StoreError {
    /// Build a [`StoreError::NotFound`] for the given address.
    pub fn not_found(service: &str, key: &str) -> Self {
        Self::NotFound {
            service: service.to_string(),
            key: key.to_string(),
        }
    }

    /// Whether this error reports a missing entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Abstraction over secret storage backends.
///
/// All operations are blocking. Implementations include:
/// - [`MemoryStore`] - In-memory storage for testing
/// - [`KeyringStore`] (with `keyring-store` feature) - OS keyring
pub trait SecretStore: Send + Sync {
    /// Retrieve a secret by service and key.
    ///
    /// Returns [`StoreError::NotFound`] if the entry doesn't exist.
    fn get(&self, service: &str, key: &str) -> Result<Secret, StoreError>;

    /// Store a secret at the given service and key.
    ///
    /// Overwrites any existing value.
    fn set(&self, service: &str, key: &str, secret: &Secret) -> Result<(), StoreError>;

    /// Delete a secret by service and key.
    ///
    /// Returns [`StoreError::NotFound`] if the entry doesn't exist; callers
    /// decide whether that matters.
    fn delete(&self, service: &str, key: &str) -> Result<(), StoreError>;

    /// Check if an entry exists without exposing the value.
    fn exists(&self, service: &str, key: &str) -> Result<bool, StoreError> {
        match self.get(service, key) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Typed access to records kept in a [`SecretStore`].
///
/// Records are encoded as JSON text before they reach the backend, so any
/// store that can hold a string can hold a record.
pub trait SecretStoreExt: SecretStore {
    /// Load and decode the record stored at `(service, key)`.
    fn get_record<T: DeserializeOwned>(&self, service: &str, key: &str) -> Result<T, StoreError> {
        let secret = self.get(service, key)?;
        Ok(serde_json::from_str(secret.expose())?)
    }

    /// Encode and store a record at `(service, key)`.
    fn set_record<T: Serialize>(
        &self,
        service: &str,
        key: &str,
        record: &T,
    ) -> Result<(), StoreError> {
        let secret = Secret::new(serde_json::to_string(record)?);
        self.set(service, key, &secret)
    }
}

impl<S: SecretStore + ?Sized> SecretStoreExt for S {}

/// Create a secret store with automatic backend selection.
///
/// # Backend Selection Logic
///
/// - If `prefer_keyring` is `true` and the `keyring-store` feature is enabled:
///   - Attempts to create a [`KeyringStore`]
///   - Falls back to [`MemoryStore`] with a warning if keyring is unavailable
/// - Otherwise: Returns [`MemoryStore`]
pub fn create_store(prefer_keyring: bool) -> Arc<dyn SecretStore> {
    #[cfg(feature = "keyring-store")]
    if prefer_keyring {
        match KeyringStore::try_new() {
            Ok(store) => {
                tracing::info!("Using OS keyring for secret storage");
                return Arc::new(store);
            }
            Err(e) => {
                tracing::warn!(
                    "Keyring unavailable ({}), falling back to memory store. \
                     Secrets will not persist across restarts.",
                    e
                );
            }
        }
    }

    #[cfg(not(feature = "keyring-store"))]
    if prefer_keyring {
        tracing::warn!(
            "Keyring storage requested but keyring-store feature not enabled. \
             Using memory store. Secrets will not persist across restarts."
        );
    }

    tracing::debug!("Using in-memory secret storage");
    Arc::new(MemoryStore::new())
}
