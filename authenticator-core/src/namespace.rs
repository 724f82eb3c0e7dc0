//! Namespace records and their index entries.
//!
//! Callers must already hold the coordinator lock; see
//! [`Authenticator`](crate::Authenticator).

use tracing::{debug, error, info, warn};

use crate::authenticator::{Result, Stores};
use crate::error::AuthenticatorError;
use crate::model::Namespace;
use crate::store::{SecretStoreExt, StoreError};

impl Stores {
    pub(crate) fn namespace_ids(&self) -> Result<Vec<String>> {
        Ok(self.index.load()?.namespaces)
    }

    pub(crate) fn get_namespace(&self, id: &str) -> Result<Namespace> {
        self.namespaces
            .get_record(&self.service, id)
            .map_err(|e| match e {
                StoreError::NotFound { .. } => AuthenticatorError::NamespaceNotFound {
                    id: id.to_string(),
                },
                e => AuthenticatorError::storage(format!("failed to get namespace {}", id), e),
            })
    }

    pub(crate) fn create_namespace(&self, id: &str, name: &str) -> Result<()> {
        let mut index = self.index.load()?;

        if index.contains(id) {
            return Err(AuthenticatorError::NamespaceExists { id: id.to_string() });
        }

        match self.get_namespace(id) {
            Ok(_) => {
                return Err(AuthenticatorError::NamespaceExistsInStorage { id: id.to_string() });
            }
            Err(e) if e.is_namespace_not_found() => {}
            Err(e) => return Err(e),
        }

        self.namespaces
            .set_record(&self.service, id, &Namespace::new(name))
            .map_err(|e| AuthenticatorError::storage(format!("failed to create namespace {}", id), e))?;

        index.insert(id);

        if let Err(source) = self.index.save(&index) {
            warn!(namespace = id, error = %source, "failed to save namespace index, rolling back");

            return match self.namespaces.delete(&self.service, id) {
                Ok(()) => Err(source.into()),
                Err(rollback) => {
                    error!(namespace = id, error = %rollback, "failed to roll back namespace");

                    Err(AuthenticatorError::Rollback {
                        id: id.to_string(),
                        source,
                        rollback,
                    })
                }
            };
        }

        info!(namespace = id, "created namespace");

        Ok(())
    }

    pub(crate) fn update_namespace(&self, id: &str, namespace: &Namespace) -> Result<()> {
        self.namespaces
            .set_record(&self.service, id, namespace)
            .map_err(|e| AuthenticatorError::storage(format!("failed to update namespace {}", id), e))
    }

    pub(crate) fn delete_namespace(&self, id: &str) -> Result<()> {
        let mut index = self.index.load()?;

        if index.remove(id) {
            self.index.save(&index)?;
        }

        let namespace = match self.get_namespace(id) {
            Ok(namespace) => namespace,
            Err(e) if e.is_namespace_not_found() => {
                debug!(namespace = id, "namespace already deleted");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.namespaces
            .delete(&self.service, id)
            .map_err(|e| AuthenticatorError::storage(format!("failed to delete namespace {}", id), e))?;

        // The namespace is gone either way; keep cleaning up and report the
        // first account that could not be removed.
        let mut first_error = None;
        for account in &namespace.accounts {
            if let Err(e) = self.delete_account_record(id, account) {
                warn!(namespace = id, account = %account, error = %e, "failed to delete account");
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        info!(namespace = id, accounts = namespace.accounts.len(), "deleted namespace");

        Ok(())
    }

    pub(crate) fn add_account_to_namespace(&self, id: &str, account: &str) -> Result<()> {
        let mut namespace = self.get_namespace(id)?;

        if !namespace.insert_account(account) {
            return Ok(());
        }

        self.update_namespace(id, &namespace)
    }

    pub(crate) fn remove_account_from_namespace(&self, id: &str, account: &str) -> Result<()> {
        let mut namespace = self.get_namespace(id)?;

        if namespace.remove_account(account) {
            self.update_namespace(id, &namespace)?;
        }

        self.delete_account_record(id, account)
    }
}
