//! Persistent storage for the session token.
//!
//! One value survives restarts: the last session id the server returned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Storage key, also used as the file name.
pub const SESSION_KEY: &str = "cernSessionId";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Data directory not available")]
    NoDataDir,
}

/// Where the client keeps its session token between runs.
pub trait SessionStorage: Send + Sync {
    /// The stored token, if any.
    fn load(&self) -> Result<Option<String>, StorageError>;

    fn save(&self, session_id: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}

/// Token kept in a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File under the platform data directory.
    pub fn with_default_path() -> Result<Self, StorageError> {
        default_session_path()
            .map(Self::new)
            .ok_or(StorageError::NoDataDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let id = contents.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session_id: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, session_id)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Token kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    value: Mutex<Option<String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded with a token, as if left over from a previous run.
    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(session_id.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot().clone())
    }

    fn save(&self, session_id: &str) -> Result<(), StorageError> {
        *self.slot() = Some(session_id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Returns the default token file location.
///
/// Platform paths:
/// - macOS: `~/Library/Application Support/cern/cernSessionId`
/// - Linux: `~/.local/share/cern/cernSessionId`
/// - Windows: `%APPDATA%\cern\cernSessionId`
pub fn default_session_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("cern").join(SESSION_KEY))
}
