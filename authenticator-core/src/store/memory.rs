//! In-memory secret storage implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{Secret, SecretStore, StoreError};

type Address = (String, String);

/// In-memory secret store for testing and development.
///
/// This store is not persistent; data is lost when the process exits.
///
/// # Thread Safety
///
/// This implementation uses interior mutability via `RwLock` and is
/// safe to share across threads.
pub struct MemoryStore {
    data: RwLock<HashMap<Address, Secret>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries across all services.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys_count", &self.len())
            .finish()
    }
}

fn address(service: &str, key: &str) -> Address {
    (service.to_string(), key.to_string())
}

fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::BackendError {
        message: format!("lock poisoned: {}", e),
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, service: &str, key: &str) -> Result<Secret, StoreError> {
        let data = self.data.read().map_err(poisoned)?;
        data.get(&address(service, key))
            .cloned()
            .ok_or_else(|| StoreError::not_found(service, key))
    }

    fn set(&self, service: &str, key: &str, secret: &Secret) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.insert(address(service, key), secret.clone());
        Ok(())
    }

    fn delete(&self, service: &str, key: &str) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.remove(&address(service, key))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(service, key))
    }
}
