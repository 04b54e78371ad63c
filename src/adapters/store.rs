//! Configuration store adapter.
//!
//! Implements [`ConfigPort`] over an in-memory blob holding the
//! postcard-encoded [`ConfigRecord`], optionally mirrored to a JSON file
//! so the simulator keeps its channel across runs.

use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::ConfigRecord;
use crate::error::ConfigError;

#[derive(Default)]
pub struct ConfigStore {
    blob: Option<Vec<u8>>,
    file: Option<PathBuf>,
}

impl ConfigStore {
    /// Volatile store; starts empty.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store backed by a JSON file.  A missing file is treated as empty,
    /// an unreadable one is logged and ignored.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let blob = match fs::read(&path) {
            Ok(bytes) => match ConfigRecord::from_json(&bytes).and_then(|r| r.to_blob()) {
                Ok(blob) => {
                    info!("ConfigStore: loaded {}", path.display());
                    Some(blob)
                }
                Err(e) => {
                    warn!("ConfigStore: {} is unusable: {}", path.display(), e);
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            blob,
            file: Some(path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_none()
    }
}

impl ConfigPort for ConfigStore {
    fn load(&self) -> Result<ConfigRecord, ConfigError> {
        let blob = self.blob.as_deref().ok_or(ConfigError::NotFound)?;
        ConfigRecord::from_blob(blob)
    }

    fn save(&mut self, record: &ConfigRecord) -> Result<(), ConfigError> {
        let blob = record.to_blob()?;
        if let Some(path) = &self.file {
            let json = record.to_json()?;
            fs::write(path, json).map_err(|_| ConfigError::IoError)?;
            info!("ConfigStore: saved {}", path.display());
        }
        self.blob = Some(blob);
        Ok(())
    }
}
