//! Session token sources.
//!
//! The account screens only ever read the token. Writing and clearing are
//! exposed on the concrete stores for login/logout flows that live elsewhere.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use thiserror::Error;
use tracing::warn;

/// Fixed storage key the session token lives under.
pub const TOKEN_KEY: &str = "token";

pub trait TokenProvider: Send + Sync {
    /// Current bearer token, or `None` when the user is not logged in.
    fn token(&self) -> Option<String>;
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("failed to access token storage at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("token storage at '{path}' is not a JSON object: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = Some(token.into());
    }

    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }
}

impl TokenProvider for InMemoryTokenStore {
    fn token(&self) -> Option<String> {
        let guard = self.token.read().unwrap_or_else(|p| p.into_inner());
        guard.clone().filter(|token| !token.is_empty())
    }
}

/// Key/value JSON file standing in for browser local storage.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_entries(&entries)
    }

    pub fn clear(&self) -> Result<(), TokenStoreError> {
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, TokenStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(TokenStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| TokenStoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), TokenStoreError> {
        let io_err = |source: std::io::Error| TokenStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|source| TokenStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, raw).map_err(io_err)
    }
}

impl TokenProvider for FileTokenStore {
    fn token(&self) -> Option<String> {
        match self.read_entries() {
            Ok(mut entries) => entries.remove(TOKEN_KEY).filter(|token| !token.is_empty()),
            Err(err) => {
                warn!("token storage unreadable; treating session as logged out: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/token_store_tests.rs"]
mod tests;
