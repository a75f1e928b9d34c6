//! Whole-document JSON persistence.
//!
//! Every state file in the data directory is read and written through a
//! [`JsonStore`]. Writes go to a sibling temp file that is then renamed over
//! the target, so readers never observe a half-written document.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from reading or writing a JSON state file.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error reading/writing file.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the document. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::json(&self.path, e))?;
        Ok(Some(value))
    }

    /// Reads the document, falling back to `T::default()` when the file is
    /// missing or unreadable. Never fails.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self) -> T {
        match self.load() {
            Ok(Some(value)) => value,
            Ok(None) => {
                info!(path = %self.path.display(), "No state file found, starting fresh");
                T::default()
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to load state file, starting fresh"
                );
                T::default()
            }
        }
    }

    /// Replaces the document atomically, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the temp write, or the rename fails.
    /// The previous document is left intact in every failure case.
    pub fn save<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let tmp = self.temp_path();
        let written = Self::write_file(&tmp, value);
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io(&self.path, e));
        }

        debug!(path = %self.path.display(), "Saved state file");
        Ok(())
    }

    fn write_file<T: Serialize + ?Sized>(tmp: &Path, value: &T) -> Result<(), StoreError> {
        let file = File::create(tmp).map_err(|e| StoreError::io(tmp, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| StoreError::json(tmp, e))?;
        writer.flush().map_err(|e| StoreError::io(tmp, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| StoreError::io(tmp, e))?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "state".into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        version: u64,
        names: Vec<String>,
    }

    fn temp_store(name: &str) -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join(name));
        (dir, store)
    }

    #[test]
    fn missing_file_loads_as_none() {
        let (_dir, store) = temp_store("absent.json");
        let loaded: Option<Doc> = store.load().unwrap();
        assert!(loaded.is_none());
        assert_eq!(store.load_or_default::<Doc>(), Doc::default());
    }

    #[test]
    fn save_then_load_returns_same_document() {
        let (_dir, store) = temp_store("doc.json");
        let doc = Doc {
            version: 3,
            names: vec!["a".into(), "b".into()],
        };

        store.save(&doc).unwrap();

        assert_eq!(store.load::<Doc>().unwrap(), Some(doc));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("nested/deeper/doc.json"));
        store.save(&Doc::default()).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn corrupt_file_is_an_error_but_default_is_available() {
        let (_dir, store) = temp_store("corrupt.json");
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load::<Doc>(), Err(StoreError::Json { .. })));
        assert_eq!(store.load_or_default::<Doc>(), Doc::default());
    }

    #[test]
    fn failed_write_keeps_previous_document() {
        let (dir, store) = temp_store("doc.json");
        store.save(&Doc { version: 1, names: vec![] }).unwrap();

        // A directory squatting on the temp path makes the temp write fail.
        fs::create_dir(dir.path().join(".doc.json.tmp")).unwrap();
        let result = store.save(&Doc { version: 2, names: vec![] });

        assert!(result.is_err());
        assert_eq!(store.load::<Doc>().unwrap().unwrap().version, 1);
    }
}
