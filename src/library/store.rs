//! Persistent prior state.
//!
//! The state file is rewritten whole on every save: the new content goes to
//! a temporary file in the same directory which is then renamed over the
//! old one. Writers hold an exclusive lock on a sibling lock file from load
//! through save, so overlapping passes cannot drop each other's entries.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::domain::PriorState;

/// Current state file format version
pub const STATE_VERSION: u32 = 1;

/// Errors reading or writing the state file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("state file {path} has unsupported version {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },

    #[error("failed to replace state file {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// On-disk layout of the state file
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    updated_at: DateTime<Utc>,
    entries: PriorState,
}

/// File-backed prior state
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Load the stored state. A missing file is an empty state.
    pub fn load(&self) -> Result<PriorState, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PriorState::new()),
            Err(e) => return Err(Self::io_error(&self.path, e)),
        };

        let file: StateFile = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if file.version != STATE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: self.path.clone(),
                version: file.version,
            });
        }

        debug!(path = %self.path.display(), entries = file.entries.len(), "Loaded state");
        Ok(file.entries)
    }

    /// Take the exclusive writer lock, blocking until it is free.
    ///
    /// State can only be saved through the returned guard. The lock is
    /// released when the guard is dropped.
    pub fn lock(&self) -> Result<StateLock<'_>, StoreError> {
        let dir = self.dir();
        fs::create_dir_all(&dir).map_err(|e| Self::io_error(&dir, e))?;

        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Self::io_error(&lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| Self::io_error(&lock_path, e))?;

        debug!(path = %lock_path.display(), "Acquired state lock");
        Ok(StateLock { store: self, _file: file })
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Atomically replace the stored state
    fn write(&self, state: &PriorState) -> Result<(), StoreError> {
        let dir = self.dir();
        let file = StateFile {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            entries: state.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| Self::io_error(&dir, e))?;
        if let Err(e) = tmp.write_all(json.as_bytes()).and_then(|_| tmp.flush()) {
            return Err(Self::io_error(tmp.path(), e));
        }
        tmp.persist(&self.path).map_err(|source| StoreError::Persist {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), entries = state.len(), "Saved state");
        Ok(())
    }
}

/// Exclusive writer access to a [`StateStore`]
#[derive(Debug)]
pub struct StateLock<'a> {
    store: &'a StateStore,
    // Lock is released when the handle is dropped
    _file: File,
}

impl StateLock<'_> {
    /// Load the state under the lock
    pub fn load(&self) -> Result<PriorState, StoreError> {
        self.store.load()
    }

    /// Replace the state under the lock
    pub fn save(&self, state: &PriorState) -> Result<(), StoreError> {
        self.store.write(state)
    }
}
