//! Calibration store adapters.
//!
//! - [`FileCalibrationStore`] — the flat text file plus its full-copy
//!   backup, as used on the rig.
//! - [`MemoryCalibrationStore`] — in-memory, for tests and dry runs.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, info};

use crate::app::ports::CalibrationStore;
use crate::config::CalibrationConfig;
use crate::error::StorageError;

pub struct FileCalibrationStore {
    file: PathBuf,
    backup_file: PathBuf,
}

impl FileCalibrationStore {
    pub fn new(file: impl Into<PathBuf>, backup_file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            backup_file: backup_file.into(),
        }
    }

    pub fn from_config(config: &CalibrationConfig) -> Self {
        Self::new(config.file.clone(), config.backup_file.clone())
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn read(&self) -> Result<String, StorageError> {
        Ok(fs::read_to_string(&self.file)?)
    }

    fn backup(&mut self) -> Result<(), StorageError> {
        match fs::copy(&self.file, &self.backup_file) {
            Ok(bytes) => {
                info!(
                    "Calibration: backed up {} bytes to {}",
                    bytes,
                    self.backup_file.display()
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Calibration: nothing to back up");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        fs::write(&self.file, contents)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCalibrationStore {
    current: Option<String>,
    backup: Option<String>,
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: &str) -> Self {
        Self {
            current: Some(contents.to_owned()),
            backup: None,
        }
    }

    pub fn current_contents(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn backup_contents(&self) -> Option<&str> {
        self.backup.as_deref()
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn read(&self) -> Result<String, StorageError> {
        self.current.clone().ok_or(StorageError::NotFound)
    }

    fn backup(&mut self) -> Result<(), StorageError> {
        if let Some(current) = &self.current {
            self.backup = Some(current.clone());
        }
        Ok(())
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        self.current = Some(contents.to_owned());
        Ok(())
    }
}
