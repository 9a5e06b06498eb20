//! File-backed storage medium.
//!
//! One file per key under a namespace directory. Writes go through a
//! temporary file and a rename so a crash mid-write never leaves a torn
//! value behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chronicle_core::storage::medium::StorageMedium;
use chronicle_types::error::MediumError;

/// Medium rooted at one namespace directory.
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    /// Open a medium rooted at `dir`, creating the directory when
    /// missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, MediumError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_err)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys are small fixed names; anything outside the safe set maps
        // to '_' so a key can never escape the namespace directory.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

fn io_err(err: std::io::Error) -> MediumError {
    match err.kind() {
        ErrorKind::StorageFull | ErrorKind::QuotaExceeded => MediumError::QuotaExceeded,
        _ => MediumError::Io(err.to_string()),
    }
}

impl StorageMedium for FileMedium {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        let path = self.key_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(err)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
