//! Namespace index persistence.
//!
//! The index is a small TOML document listing every namespace id:
//!
//! ```toml
//! namespaces = ["personal", "team1"]
//! ```
//!
//! # Storage Location
//!
//! The file lives at `$HOME/.authenticator.toml` unless the
//! `AUTHENTICATOR_CONFIG` environment variable names another path. A missing
//! file reads as an empty index; the file is created on the first save.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the index location.
pub const CONFIG_ENV: &str = "AUTHENTICATOR_CONFIG";

/// File name of the index inside the home directory.
pub const CONFIG_FILE: &str = ".authenticator.toml";

/// Error type for index file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home directory could be determined for the default location.
    #[error("failed to get user home directory")]
    HomeDirUnavailable,

    /// The index file exists but could not be read.
    #[error("failed to open config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The index file is not valid TOML.
    #[error("failed to decode config file {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The index could not be rendered as TOML.
    #[error("failed to encode config file: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The index file could not be written.
    #[error("failed to write config file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// On-disk contents of the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFile {
    /// Known namespace ids.
    #[serde(default)]
    pub namespaces: Vec<String>,
}

impl IndexFile {
    /// Whether `id` is listed.
    pub fn contains(&self, id: &str) -> bool {
        self.namespaces.iter().any(|n| n == id)
    }

    /// Add `id` and re-sort the list.
    pub fn insert(&mut self, id: &str) {
        self.namespaces.push(id.to_string());
        self.namespaces.sort();
    }

    /// Remove `id`, returning whether it was listed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.namespaces.len();
        self.namespaces.retain(|n| n != id);
        self.namespaces.len() != before
    }
}

/// Handle on the index file.
///
/// Every call reads or writes the file; nothing is cached in memory, so
/// edits made by another process are picked up on the next load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIndex {
    path: PathBuf,
}

impl ConfigIndex {
    /// Use the index at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the index named by `AUTHENTICATOR_CONFIG`, or the default location.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = resolve_path(std::env::var_os(CONFIG_ENV), home_dir())?;
        Ok(Self::at(path))
    }

    /// Path of the index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the index. A missing file yields an empty index.
    pub fn load(&self) -> Result<IndexFile, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IndexFile::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the index, creating or truncating the file.
    ///
    /// Parent directories are not created.
    pub fn save(&self, index: &IndexFile) -> Result<(), ConfigError> {
        let contents = toml::to_string(index)?;

        let write = |contents: &str| -> io::Result<()> {
            let mut options = fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }

            let mut file = options.open(&self.path)?;
            file.write_all(contents.as_bytes())?;
            file.flush()
        };

        write(&contents).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Pick the index path from an override value and a home directory.
fn resolve_path(
    override_path: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    match override_path {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => home
            .map(|home| home.join(CONFIG_FILE))
            .ok_or(ConfigError::HomeDirUnavailable),
    }
}
