//! Domain model types.
//!
//! This module defines the records kept in the secret store:
//! - [`Namespace`] - A named grouping of accounts
//! - [`Account`] - A single enrolled TOTP credential
//!
//! Accounts also convert to and from `otpauth://totp/` enrollment URIs, the
//! payload carried by authenticator QR codes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::store::Secret;

const OTPAUTH_TOTP_PREFIX: &str = "otpauth://totp/";
const SECRET_PARAM: &str = "secret";
const ISSUER_PARAM: &str = "issuer";

/// A named grouping of accounts.
///
/// The namespace id is not part of the record; it is the key the record is
/// stored under.
///
/// # Invariants
///
/// `accounts` is sorted ascending and holds no duplicates as long as it is
/// only edited through [`insert_account`](Self::insert_account) and
/// [`remove_account`](Self::remove_account).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Display name, independent of the namespace id.
    pub name: String,

    /// Names of the accounts in this namespace.
    #[serde(default)]
    pub accounts: Vec<String>,
}

impl Namespace {
    /// Create an empty namespace with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accounts: Vec::new(),
        }
    }

    /// Whether `account` is a member of this namespace.
    pub fn contains_account(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| a == account)
    }

    /// Add `account`, keeping the list sorted.
    ///
    /// Returns `false` if it was already a member.
    pub fn insert_account(&mut self, account: &str) -> bool {
        if self.contains_account(account) {
            return false;
        }

        self.accounts.push(account.to_string());
        self.accounts.sort();

        true
    }

    /// Remove `account` from the list.
    ///
    /// Returns `false` if it was not a member.
    pub fn remove_account(&mut self, account: &str) -> bool {
        let before = self.accounts.len();
        self.accounts.retain(|a| a != account);
        self.accounts.sort();

        self.accounts.len() != before
    }
}

/// A single enrolled TOTP credential, scoped to one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account name, unique within its namespace.
    pub name: String,

    /// Base32 TOTP secret.
    pub totp_secret: Secret,

    /// Issuer shown next to the code and encoded into enrollment URIs.
    pub issuer: String,

    /// Free-form metadata, stored and returned unchanged.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Account {
    /// Create an account shell with only the name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the TOTP secret.
    pub fn with_secret(mut self, secret: impl Into<Secret>) -> Self {
        self.totp_secret = secret.into();
        self
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Insert a metadata entry.
    ///
    /// Fails if `value` cannot be represented as JSON, leaving the metadata
    /// unchanged.
    pub fn insert_metadata<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.metadata.insert(key.into(), value);
        Ok(())
    }

    /// Storage key of an account within a namespace.
    pub fn storage_key(namespace: &str, account: &str) -> String {
        format!("{}/{}", namespace, account)
    }

    /// Render the `otpauth://totp/` enrollment URI for this account.
    ///
    /// # Examples
    ///
    /// ```
    /// use authenticator_core::Account;
    ///
    /// let account = Account::new("alice").with_secret("JBSWY3DP").with_issuer("example.com");
    /// assert_eq!(
    ///     account.to_otpauth_uri(),
    ///     "otpauth://totp/alice?issuer=example.com&secret=JBSWY3DP"
    /// );
    /// ```
    pub fn to_otpauth_uri(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(ISSUER_PARAM, &self.issuer)
            .append_pair(SECRET_PARAM, self.totp_secret.expose())
            .finish();

        format!(
            "{}{}?{}",
            OTPAUTH_TOTP_PREFIX,
            urlencoding::encode(&self.name),
            query
        )
    }

    /// Parse an `otpauth://totp/` enrollment URI.
    ///
    /// The label becomes the account name; metadata is left empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use authenticator_core::Account;
    ///
    /// let account = Account::from_otpauth_uri(
    ///     "otpauth://totp/john.doe%40example.com?secret=NBSWY3DP&issuer=example.com",
    /// )
    /// .unwrap();
    /// assert_eq!(account.name, "john.doe@example.com");
    /// assert_eq!(account.totp_secret.expose(), "NBSWY3DP");
    /// assert_eq!(account.issuer, "example.com");
    /// ```
    pub fn from_otpauth_uri(uri: &str) -> Result<Self, UriError> {
        let uri = uri.trim();
        if !uri.starts_with(OTPAUTH_TOTP_PREFIX) {
            return Err(UriError::InvalidScheme {
                uri: uri.to_string(),
            });
        }

        let parsed = Url::parse(uri)?;
        let name = urlencoding::decode(parsed.path().trim_matches('/'))?.into_owned();

        let mut account = Self::new(name);
        for (param, value) in parsed.query_pairs() {
            match param.as_ref() {
                SECRET_PARAM => account.totp_secret = Secret::new(value.into_owned()),
                ISSUER_PARAM => account.issuer = value.into_owned(),
                _ => {}
            }
        }

        Ok(account)
    }
}

/// Error parsing an enrollment URI.
#[derive(Debug, thiserror::Error)]
pub enum UriError {
    #[error("invalid otpauth uri: {uri}")]
    InvalidScheme { uri: String },

    #[error("failed to parse otpauth uri: {0}")]
    Parse(#[from] url::ParseError),

    #[error("invalid otpauth label: {0}")]
    Label(#[from] std::string::FromUtf8Error),
}
