//! Settings storage adapter.
//!
//! Implements [`StoragePort`] over a `namespace::key` map.  With a path the
//! map is persisted as one postcard blob, rewritten after every change; the
//! write goes to a temporary file first and is renamed into place so a
//! crash never leaves a half-written file.
//!
//! Stored values are tiny (the device id and a few preference bytes), so
//! rewriting the whole file is cheap.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::app::ports::{StorageError, StoragePort};

pub struct SettingsStore {
    entries: BTreeMap<String, Vec<u8>>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Settings that vanish with the process.
    pub fn in_memory() -> Self {
        info!("SETTINGS: in-memory backend");
        Self {
            entries: BTreeMap::new(),
            path: None,
        }
    }

    /// Load settings from `path`.  A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(bytes) => postcard::from_bytes(&bytes).map_err(|_| StorageError::Corrupted)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("SETTINGS: cannot read {}: {e}", path.display());
                return Err(StorageError::IoError);
            }
        };
        info!("SETTINGS: {} entries from {}", entries.len(), path.display());
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }

    fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = postcard::to_allocvec(&self.entries).map_err(|_| StorageError::IoError)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)
            .and_then(|()| fs::rename(&tmp, path))
            .map_err(|e| {
                warn!("SETTINGS: cannot write {}: {e}", path.display());
                StorageError::IoError
            })?;
        debug!("SETTINGS: flushed {} bytes", bytes.len());
        Ok(())
    }
}

impl StoragePort for SettingsStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .entries
            .get(&Self::composite_key(namespace, key))
            .ok_or(StorageError::NotFound)?;
        if data.len() > buf.len() {
            return Err(StorageError::BufferTooSmall);
        }
        buf[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.entries
            .insert(Self::composite_key(namespace, key), data.to_vec());
        self.flush()
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        if self
            .entries
            .remove(&Self::composite_key(namespace, key))
            .is_some()
        {
            self.flush()?;
        }
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.entries
            .contains_key(&Self::composite_key(namespace, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("phoneiot-{}-{name}.bin", std::process::id()));
        path
    }

    #[test]
    fn memory_read_write_delete() {
        let mut s = SettingsStore::in_memory();
        let mut buf = [0u8; 4];
        assert_eq!(s.read("settings", "x", &mut buf), Err(StorageError::NotFound));
        s.write("settings", "x", &[7]).unwrap();
        assert_eq!(s.read("settings", "x", &mut buf), Ok(1));
        assert_eq!(buf[0], 7);
        assert!(s.exists("settings", "x"));
        assert!(!s.exists("other", "x"));
        s.delete("settings", "x").unwrap();
        s.delete("settings", "x").unwrap();
        assert!(!s.exists("settings", "x"));
    }

    #[test]
    fn small_buffer_is_rejected() {
        let mut s = SettingsStore::in_memory();
        s.write("n", "k", &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(s.read("n", "k", &mut buf), Err(StorageError::BufferTooSmall));
    }

    #[test]
    fn file_survives_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);
        {
            let mut s = SettingsStore::open(&path).unwrap();
            s.write("settings", "run_in_background", &[1]).unwrap();
        }
        let s = SettingsStore::open(&path).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(s.read("settings", "run_in_background", &mut buf), Ok(1));
        assert_eq!(buf, [1]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = temp_path("corrupt");
        fs::write(&path, [0xFF; 3]).unwrap();
        assert!(matches!(
            SettingsStore::open(&path),
            Err(StorageError::Corrupted)
        ));
        let _ = fs::remove_file(&path);
    }
}
