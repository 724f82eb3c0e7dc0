//! OS keyring-backed secret storage implementation.

use keyring::Entry;

use super::{Secret, SecretStore, StoreError};

/// OS keyring-backed secret store.
///
/// This store uses the platform's native keyring service:
/// - macOS: Keychain
/// - Linux: Secret Service API (via libsecret)
/// - Windows: Credential Manager
///
/// # Storage Key Format
///
/// The `(service, key)` pair maps directly onto the keyring's
/// `(service, user)` pair, so entries show up in credential managers under
/// the service name.
///
/// # Example
///
/// ```rust,ignore
/// use authenticator_core::store::{KeyringStore, SecretStore, Secret};
///
/// let store = KeyringStore::try_new().unwrap();
/// store.set("authenticator", "team1/alice", &Secret::new("{}")).unwrap();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore {
    _private: (),
}

impl KeyringStore {
    /// Try to create a new keyring store.
    ///
    /// Returns an error if the keyring backend is not available on this platform.
    pub fn try_new() -> Result<Self, StoreError> {
        match Entry::new("authenticator/__test__", "availability_check") {
            Ok(_) => Ok(Self { _private: () }),
            Err(e) => Err(StoreError::KeyringUnavailable {
                message: format!("keyring backend not available: {}", e),
            }),
        }
    }

    /// Create a keyring entry for the given address.
    fn create_entry(&self, service: &str, key: &str) -> Result<Entry, StoreError> {
        Entry::new(service, key).map_err(|e| StoreError::BackendError {
            message: format!("failed to create keyring entry: {}", e),
        })
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, service: &str, key: &str) -> Result<Secret, StoreError> {
        let entry = self.create_entry(service, key)?;

        match entry.get_password() {
            Ok(password) => Ok(Secret::new(password)),
            Err(keyring::Error::NoEntry) => Err(StoreError::not_found(service, key)),
            Err(keyring::Error::Ambiguous(_)) => Err(StoreError::BackendError {
                message: format!("ambiguous keyring entry for key: {}/{}", service, key),
            }),
            Err(keyring::Error::PlatformFailure(e)) => Err(StoreError::BackendError {
                message: format!("platform keyring failure: {}", e),
            }),
            Err(e) => Err(StoreError::BackendError {
                message: format!("keyring error: {}", e),
            }),
        }
    }

    fn set(&self, service: &str, key: &str, secret: &Secret) -> Result<(), StoreError> {
        let entry = self.create_entry(service, key)?;

        entry
            .set_password(secret.expose())
            .map_err(|e| StoreError::BackendError {
                message: format!("failed to set keyring password: {}", e),
            })
    }

    fn delete(&self, service: &str, key: &str) -> Result<(), StoreError> {
        let entry = self.create_entry(service, key)?;

        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Err(StoreError::not_found(service, key)),
            Err(e) => Err(StoreError::BackendError {
                message: format!("failed to delete keyring entry: {}", e),
            }),
        }
    }
}
