//! Persistence of the ledger snapshot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::ledger::Snapshot;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("malformed ledger data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Where a ledger is loaded from and saved to.
pub trait Storage {
    /// Load the saved snapshot; first use yields the default (empty) state.
    fn load(&mut self) -> Result<Snapshot, StorageError>;

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError>;
}

/// A single JSON document `{"heads": {..}, "history": [..]}` on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Storage for JsonFileStorage {
    fn load(&mut self) -> Result<Snapshot, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no ledger file yet, starting empty");
                return Ok(Snapshot::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Snapshot::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write to a sibling temp file, then rename over the target.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            entries = snapshot.history.len(),
            "ledger saved"
        );
        Ok(())
    }
}

/// In-process storage, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saved: Option<Snapshot>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `save` fail.
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn saved(&self) -> Option<&Snapshot> {
        self.saved.as_ref()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Storage for MemoryStorage {
    fn load(&mut self) -> Result<Snapshot, StorageError> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Unavailable("saves disabled".to_string()));
        }
        self.saved = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}
