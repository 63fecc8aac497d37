//! Oceans Validator Storage Layer - File-Based Snapshots
//!
//! The validator keeps its working set in memory and writes named
//! snapshots to disk:
//! - JSON for a human-readable copy
//! - Bincode for fast loading on startup

pub mod cache;
pub mod models;

pub use cache::StateCache;
pub use models::{LiquiditySnapshot, ValidatorState, VoteSnapshot};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Directory-backed snapshot store.
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Open a snapshot directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }
        Ok(Self { data_dir })
    }

    /// Save a snapshot under `name` in both formats.
    pub fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let json_path = self.data_dir.join(format!("{}.json", name));
        let bin_path = self.data_dir.join(format!("{}.bin", name));

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&json_path, json)?;

        let bin = bincode::serialize(data)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&bin_path, bin)?;

        Ok(())
    }

    /// Load a snapshot, preferring bincode and falling back to JSON.
    pub fn load<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T> {
        let bin_path = self.data_dir.join(format!("{}.bin", name));
        let json_path = self.data_dir.join(format!("{}.json", name));

        if bin_path.exists() {
            let data = fs::read(&bin_path)?;
            return bincode::deserialize(&data)
                .map_err(|e| StorageError::Serialization(e.to_string()));
        }

        if json_path.exists() {
            let data = fs::read_to_string(&json_path)?;
            return serde_json::from_str(&data)
                .map_err(|e| StorageError::Serialization(e.to_string()));
        }

        Err(StorageError::SnapshotNotFound(name.to_string()))
    }

    /// Whether a snapshot with this name exists in either format.
    pub fn exists(&self, name: &str) -> bool {
        self.data_dir.join(format!("{}.bin", name)).exists()
            || self.data_dir.join(format!("{}.json", name)).exists()
    }

    /// Remove both copies of a snapshot. Missing files are not an error.
    pub fn remove(&self, name: &str) -> Result<()> {
        for ext in ["bin", "json"] {
            let path = self.data_dir.join(format!("{}.{}", name, ext));
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
