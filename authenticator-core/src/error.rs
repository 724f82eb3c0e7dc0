//! Top-level error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Error type for namespace and account operations.
#[derive(Debug, Error)]
pub enum AuthenticatorError {
    /// No namespace record exists for the id.
    #[error("namespace not found: {id}")]
    NamespaceNotFound { id: String },

    /// The id is already listed in the namespace index.
    #[error("namespace already exists: {id}")]
    NamespaceExists { id: String },

    /// A record exists in the secret store although the index does not list
    /// the id.
    #[error("namespace already exists in storage: {id}")]
    NamespaceExistsInStorage { id: String },

    /// No account record exists for the name.
    #[error("account {account} not found in namespace {namespace}")]
    AccountNotFound { namespace: String, account: String },

    /// The secret store failed.
    #[error("{context}: {source}")]
    Storage {
        context: String,
        source: StoreError,
    },

    /// The namespace index failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Saving the index failed and so did undoing the namespace write.
    #[error("{source}; failed to roll back namespace {id}: {rollback}")]
    Rollback {
        id: String,
        source: ConfigError,
        rollback: StoreError,
    },
}

impl AuthenticatorError {
    pub(crate) fn storage(context: impl Into<String>, source: StoreError) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    /// Whether the namespace or account does not exist.
    pub fn is_not_found(&self) -> bool {
        self.is_namespace_not_found() || self.is_account_not_found()
    }

    /// Whether the namespace does not exist.
    pub fn is_namespace_not_found(&self) -> bool {
        matches!(self, Self::NamespaceNotFound { .. })
    }

    /// Whether the account does not exist.
    pub fn is_account_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound { .. })
    }

    /// Whether the namespace already exists, in the index or in storage.
    pub fn is_namespace_exists(&self) -> bool {
        matches!(
            self,
            Self::NamespaceExists { .. } | Self::NamespaceExistsInStorage { .. }
        )
    }
}
