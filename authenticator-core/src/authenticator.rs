//! Namespace and account coordination.
//!
//! [`Authenticator`] is the entry point for every namespace and account
//! operation. It owns the secret stores and the namespace index, and keeps
//! the two consistent:
//!
//! - creating a namespace writes the record, then the index, and undoes the
//!   record if the index cannot be saved
//! - storing an account adds it to its namespace's member list
//! - deleting a namespace deletes every account it lists
//!
//! # Locking
//!
//! One read/write lock covers all of it. Reads share the lock; anything that
//! writes, including swapping a backend, takes it exclusively. Handles are
//! cheap to clone and all clones share the same lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use authenticator_core::{Account, Authenticator, ConfigIndex, MemoryStore};
//!
//! # fn main() -> Result<(), authenticator_core::AuthenticatorError> {
//! let authenticator = Authenticator::new(
//!     Arc::new(MemoryStore::new()),
//!     ConfigIndex::at("/tmp/authenticator.toml"),
//! );
//!
//! authenticator.create_namespace("team1", "Team One")?;
//! authenticator.set_account("team1", Account::new("alice").with_secret("JBSWY3DP"))?;
//!
//! let namespace = authenticator.get_namespace("team1")?;
//! assert_eq!(namespace.accounts, vec!["alice"]);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{ConfigError, ConfigIndex};
use crate::error::AuthenticatorError;
use crate::model::{Account, Namespace};
use crate::store::{SecretStore, create_store};

/// Service name under which all records are stored.
pub const SERVICE_NAME: &str = "authenticator";

pub(crate) type Result<T> = std::result::Result<T, AuthenticatorError>;

/// Everything guarded by the coordinator lock.
pub(crate) struct Stores {
    pub(crate) namespaces: Arc<dyn SecretStore>,
    pub(crate) accounts: Arc<dyn SecretStore>,
    pub(crate) index: ConfigIndex,
    pub(crate) service: String,
}

/// Handle on the namespace and account stores.
#[derive(Clone)]
pub struct Authenticator {
    stores: Arc<RwLock<Stores>>,
}

impl Authenticator {
    /// Keep namespaces and accounts in the same store.
    pub fn new(store: Arc<dyn SecretStore>, index: ConfigIndex) -> Self {
        Self::with_stores(Arc::clone(&store), store, index)
    }

    /// Keep namespaces and accounts in separate stores.
    pub fn with_stores(
        namespaces: Arc<dyn SecretStore>,
        accounts: Arc<dyn SecretStore>,
        index: ConfigIndex,
    ) -> Self {
        Self::with_stores_and_service(namespaces, accounts, index, SERVICE_NAME.to_string())
    }

    fn with_stores_and_service(
        namespaces: Arc<dyn SecretStore>,
        accounts: Arc<dyn SecretStore>,
        index: ConfigIndex,
        service: String,
    ) -> Self {
        Self {
            stores: Arc::new(RwLock::new(Stores {
                namespaces,
                accounts,
                index,
                service,
            })),
        }
    }

    /// Build from the environment: the index named by `AUTHENTICATOR_CONFIG`
    /// (or the default location) and the best available secret store.
    pub fn from_env(prefer_keyring: bool) -> std::result::Result<Self, ConfigError> {
        let index = ConfigIndex::from_env()?;
        Ok(Self::new(create_store(prefer_keyring), index))
    }

    /// Store records under a different service name.
    ///
    /// Returns a handle with its own lock over the same backends and index.
    /// Clones of `self` keep the service name they had.
    pub fn with_service(self, service: impl Into<String>) -> Self {
        let stores = self.stores.read();
        Self::with_stores_and_service(
            Arc::clone(&stores.namespaces),
            Arc::clone(&stores.accounts),
            stores.index.clone(),
            service.into(),
        )
    }

    /// Path of the namespace index file.
    pub fn config_path(&self) -> std::path::PathBuf {
        self.stores.read().index.path().to_path_buf()
    }

    /// Replace the namespace store, returning the previous one.
    ///
    /// Waits for in-flight operations to finish first.
    pub fn set_namespace_store(&self, store: Arc<dyn SecretStore>) -> Arc<dyn SecretStore> {
        let mut stores = self.stores.write();
        std::mem::replace(&mut stores.namespaces, store)
    }

    /// Replace the account store, returning the previous one.
    ///
    /// Waits for in-flight operations to finish first.
    pub fn set_account_store(&self, store: Arc<dyn SecretStore>) -> Arc<dyn SecretStore> {
        let mut stores = self.stores.write();
        std::mem::replace(&mut stores.accounts, store)
    }

    /// List all namespace ids, as recorded in the index.
    pub fn namespace_ids(&self) -> Result<Vec<String>> {
        self.stores.read().namespace_ids()
    }

    /// Load a namespace record.
    pub fn get_namespace(&self, id: &str) -> Result<Namespace> {
        self.stores.read().get_namespace(id)
    }

    /// Create an empty namespace and list it in the index.
    pub fn create_namespace(&self, id: &str, name: &str) -> Result<()> {
        self.stores.write().create_namespace(id, name)
    }

    /// Overwrite a namespace record.
    ///
    /// Does not check that the namespace exists, so it can bring back a
    /// deleted id (without listing it in the index).
    pub fn update_namespace(&self, id: &str, namespace: &Namespace) -> Result<()> {
        self.stores.write().update_namespace(id, namespace)
    }

    /// Delete a namespace and every account it lists.
    pub fn delete_namespace(&self, id: &str) -> Result<()> {
        self.stores.write().delete_namespace(id)
    }

    /// Add an existing account name to a namespace's member list.
    pub fn add_account_to_namespace(&self, id: &str, account: &str) -> Result<()> {
        self.stores.write().add_account_to_namespace(id, account)
    }

    /// Drop an account from a namespace and delete its record.
    pub fn remove_account_from_namespace(&self, id: &str, account: &str) -> Result<()> {
        self.stores.write().remove_account_from_namespace(id, account)
    }

    /// Load an account record.
    pub fn get_account(&self, namespace: &str, account: &str) -> Result<Account> {
        self.stores.read().get_account(namespace, account)
    }

    /// Store an account and make sure its namespace lists it.
    pub fn set_account(&self, namespace: &str, account: Account) -> Result<()> {
        self.stores.write().set_account(namespace, &account)
    }

    /// Remove an account from its namespace and delete its record.
    pub fn delete_account(&self, namespace: &str, account: &str) -> Result<()> {
        self.stores.write().delete_account(namespace, account)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stores = self.stores.read();
        f.debug_struct("Authenticator")
            .field("service", &stores.service)
            .field("index", &stores.index)
            .finish()
    }
}
