//! Account records and namespace membership.
//!
//! Callers must already hold the coordinator lock; see
//! [`Authenticator`](crate::Authenticator).

use tracing::debug;

use crate::authenticator::{Result, Stores};
use crate::error::AuthenticatorError;
use crate::model::{Account, Namespace};
use crate::store::{SecretStoreExt, StoreError};

impl Stores {
    pub(crate) fn get_account(&self, namespace: &str, account: &str) -> Result<Account> {
        self.accounts
            .get_record(&self.service, &Account::storage_key(namespace, account))
            .map_err(|e| match e {
                StoreError::NotFound { .. } => AuthenticatorError::AccountNotFound {
                    namespace: namespace.to_string(),
                    account: account.to_string(),
                },
                e => AuthenticatorError::storage(
                    format!("failed to get account {} in namespace {}", account, namespace),
                    e,
                ),
            })
    }

    /// Write the record, then list it in the namespace. Never creates the
    /// namespace.
    pub(crate) fn set_account(&self, namespace: &str, account: &Account) -> Result<()> {
        self.accounts
            .set_record(
                &self.service,
                &Account::storage_key(namespace, &account.name),
                account,
            )
            .map_err(|e| {
                AuthenticatorError::storage(
                    format!(
                        "failed to store account {} in namespace {}",
                        account.name, namespace
                    ),
                    e,
                )
            })?;

        let mut record = self.get_namespace(namespace)?;

        if !record.insert_account(&account.name) {
            return Ok(());
        }

        debug!(namespace, account = %account.name, "added account to namespace");

        self.update_namespace(namespace, &record)
    }

    /// Unlist the account, then delete its record. A missing namespace counts
    /// as one with no members.
    pub(crate) fn delete_account(&self, namespace: &str, account: &str) -> Result<()> {
        let mut record = match self.get_namespace(namespace) {
            Ok(record) => record,
            Err(e) if e.is_namespace_not_found() => Namespace::default(),
            Err(e) => return Err(e),
        };

        if record.remove_account(account) {
            self.update_namespace(namespace, &record)?;
        }

        self.delete_account_record(namespace, account)
    }

    /// Delete only the record; a missing record is not an error.
    pub(crate) fn delete_account_record(&self, namespace: &str, account: &str) -> Result<()> {
        match self
            .accounts
            .delete(&self.service, &Account::storage_key(namespace, account))
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound { .. }) => {
                debug!(namespace, account, "account already deleted");
                Ok(())
            }
            Err(e) => Err(AuthenticatorError::storage(
                format!(
                    "failed to delete account {} in namespace {}",
                    account, namespace
                ),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::authenticator::SERVICE_NAME;
    use crate::config::ConfigIndex;
    use crate::model::Account;
    use crate::store::{MemoryStore, Secret, SecretStore};
    use crate::{Authenticator, AuthenticatorError};

    fn test_authenticator() -> (Authenticator, Arc<MemoryStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let index = ConfigIndex::at(temp_dir.path().join("authenticator.toml"));
        let authenticator = Authenticator::new(store.clone(), index);
        authenticator.create_namespace("team1", "Team One").unwrap();
        (authenticator, store, temp_dir)
    }

    fn account(name: &str) -> Account {
        Account::new(name)
            .with_secret("NBSWY3DP")
            .with_issuer("example.com")
    }

    #[test]
    fn test_get_account_not_found() {
        let (authenticator, _store, _temp) = test_authenticator();

        let err = authenticator
            .get_account("team1", "john.doe@example.com")
            .unwrap_err();

        assert!(err.is_account_not_found());
        assert_eq!(
            err.to_string(),
            "account john.doe@example.com not found in namespace team1"
        );
    }

    #[test]
    fn test_get_account_decode_error_is_storage_error() {
        let (authenticator, store, _temp) = test_authenticator();
        store
            .set(SERVICE_NAME, "team1/broken", &Secret::new("{"))
            .unwrap();

        let err = authenticator.get_account("team1", "broken").unwrap_err();

        assert!(matches!(err, AuthenticatorError::Storage { .. }));
        assert!(
            err.to_string()
                .starts_with("failed to get account broken in namespace team1")
        );
    }

    #[test]
    fn test_set_account_roundtrip() {
        let (authenticator, _store, _temp) = test_authenticator();
        let mut expected = account("john.doe@example.com");
        expected.insert_metadata("message", "foobar").unwrap();

        authenticator.set_account("team1", expected.clone()).unwrap();

        let actual = authenticator
            .get_account("team1", "john.doe@example.com")
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_set_account_keeps_members_sorted_and_unique() {
        let (authenticator, _store, _temp) = test_authenticator();

        for name in ["carol", "alice", "bob", "alice"] {
            authenticator.set_account("team1", account(name)).unwrap();
        }

        assert_eq!(
            authenticator.get_namespace("team1").unwrap().accounts,
            vec!["alice", "bob", "carol"]
        );
    }

    #[test]
    fn test_set_account_updates_existing_record() {
        let (authenticator, _store, _temp) = test_authenticator();

        authenticator.set_account("team1", account("alice")).unwrap();
        authenticator
            .set_account("team1", account("alice").with_issuer("other.com"))
            .unwrap();

        assert_eq!(
            authenticator.get_account("team1", "alice").unwrap().issuer,
            "other.com"
        );
        assert_eq!(
            authenticator.get_namespace("team1").unwrap().accounts,
            vec!["alice"]
        );
    }

    #[test]
    fn test_set_account_without_namespace_fails() {
        let (authenticator, _store, _temp) = test_authenticator();

        let err = authenticator
            .set_account("missing", account("alice"))
            .unwrap_err();

        assert!(err.is_namespace_not_found());
        assert!(
            authenticator
                .get_namespace("missing")
                .unwrap_err()
                .is_namespace_not_found()
        );
    }

    #[test]
    fn test_delete_account() {
        let (authenticator, _store, _temp) = test_authenticator();
        authenticator.set_account("team1", account("alice")).unwrap();
        authenticator.set_account("team1", account("bob")).unwrap();

        authenticator.delete_account("team1", "alice").unwrap();

        assert_eq!(
            authenticator.get_namespace("team1").unwrap().accounts,
            vec!["bob"]
        );
        assert!(
            authenticator
                .get_account("team1", "alice")
                .unwrap_err()
                .is_account_not_found()
        );
    }

    #[test]
    fn test_delete_account_is_idempotent() {
        let (authenticator, _store, _temp) = test_authenticator();

        authenticator.delete_account("team1", "nobody").unwrap();
        authenticator.delete_account("team1", "nobody").unwrap();
    }

    #[test]
    fn test_delete_account_without_namespace() {
        let (authenticator, store, _temp) = test_authenticator();
        authenticator.set_account("team1", account("alice")).unwrap();
        store.delete(SERVICE_NAME, "team1").unwrap();

        authenticator.delete_account("team1", "alice").unwrap();

        assert!(store.is_empty());
    }
}
