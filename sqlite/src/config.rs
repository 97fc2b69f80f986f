//! Connection settings for [`SqliteExecutor`](crate::SqliteExecutor).
//!
//! # Example YAML
//!
//! ```yaml
//! path: ./app.db
//! busy_timeout_ms: 5000
//! foreign_keys: true
//! ```
//!
//! Every key is optional. Without `path` the executor opens a private
//! in-memory database.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How to open and configure a SQLite connection.
///
/// # Examples
///
/// ```
/// # use dynamic_db_sqlite::SqliteConfig;
/// let config: SqliteConfig = serde_yaml::from_str("busy_timeout_ms: 250").unwrap();
/// assert!(config.path.is_none());
/// assert_eq!(config.busy_timeout_ms, 250);
/// assert!(config.foreign_keys);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file; `None` means in-memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Enforce foreign key constraints on this connection.
    pub foreign_keys: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: 5000,
            foreign_keys: true,
        }
    }
}

impl SqliteConfig {
    /// Settings for a database file, with the other fields defaulted.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SqliteError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::SqliteError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SqliteError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::SqliteError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
