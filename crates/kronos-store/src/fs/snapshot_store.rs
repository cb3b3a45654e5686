//! Sharded JSON snapshot store

#![allow(clippy::result_large_err)]

use super::sharding::shard_path;
use crate::errors::{io_error, Result};
use kronos_core::digest::hash_string;
use kronos_core::errors::KronosError;
use kronos_core::model::CanonicalView;
use kronos_core::store::SnapshotStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SNAPSHOT_EXT: &str = "json";

/// On-disk document: the key is stored alongside the view so a file can be
/// traced back to its entity without reversing the digest.
#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    key: String,
    view: CanonicalView,
}

#[derive(Serialize)]
struct SnapshotFileRef<'a> {
    key: &'a str,
    view: &'a CanonicalView,
}

/// Snapshot store writing one file per entity key under `root`.
///
/// Views are stored in their type-tagged serde form, so decimals and
/// temporal values read back exactly.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
}

impl FsSnapshotStore {
    /// Store rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the snapshot for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        shard_path(&self.root, &hash_string(key), SNAPSHOT_EXT)
    }

    fn read(&self, key: &str) -> Result<Option<SnapshotFile>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read_snapshot", e)),
        };

        let file: SnapshotFile =
            serde_json::from_slice(&bytes).map_err(|e| KronosError::Store {
                op: "decode_snapshot".to_string(),
                message: format!("{}: {}", path.display(), e),
            })?;

        if file.key != key {
            return Err(KronosError::Store {
                op: "decode_snapshot".to_string(),
                message: format!(
                    "{} holds key '{}', expected '{}'",
                    path.display(),
                    file.key,
                    key
                ),
            });
        }

        Ok(Some(file))
    }

    /// Replace the snapshot file at `path` through a uniquely named sibling
    /// temp file, so readers see either the old or the new document.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(shard) = path.parent() {
            fs::create_dir_all(shard).map_err(|e| io_error("create_snapshot_dir", e))?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, bytes).map_err(|e| io_error("write_snapshot_temp", e))?;

        fs::rename(&temp_path, path).map_err(|e| {
            fs::remove_file(&temp_path).ok();
            io_error("rename_snapshot_temp", e)
        })
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn has_key(&self, key: &str) -> Result<bool> {
        match fs::metadata(self.path_for(key)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error("stat_snapshot", e)),
        }
    }

    fn get(&self, key: &str) -> Result<Option<CanonicalView>> {
        Ok(self.read(key)?.map(|file| file.view))
    }

    fn save(&self, key: &str, view: &CanonicalView) -> Result<()> {
        let bytes = serde_json::to_vec(&SnapshotFileRef { key, view })?;
        self.write(&self.path_for(key), &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(temp_dir.path());
        let view = CanonicalView::new().with("name", "A");

        assert!(!store.has_key("User-1").unwrap());
        store.save("User-1", &view).unwrap();

        assert!(store.has_key("User-1").unwrap());
        assert_eq!(store.get("User-1").unwrap(), Some(view));
    }

    #[test]
    fn test_missing_key_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(temp_dir.path().join("never-created"));
        assert_eq!(store.get("User-1").unwrap(), None);
    }

    #[test]
    fn test_path_is_sharded_by_key_digest() {
        let store = FsSnapshotStore::new("/snapshots");
        let digest = hash_string("User-1");
        let expected = Path::new("/snapshots")
            .join(&digest[..2])
            .join(format!("{}.json", digest));
        assert_eq!(store.path_for("User-1"), expected);
    }

    #[test]
    fn test_resave_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(temp_dir.path());
        store.save("User-1", &CanonicalView::new().with("v", 1)).unwrap();
        store.save("User-1", &CanonicalView::new().with("v", 2)).unwrap();

        let shard = store.path_for("User-1").parent().unwrap().to_path_buf();
        let names: Vec<String> = fs::read_dir(shard)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));
        assert_eq!(
            store.get("User-1").unwrap().unwrap().get("v"),
            Some(&kronos_core::Value::Int(2))
        );
    }

    #[test]
    fn test_corrupt_file_is_store_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(temp_dir.path());
        store.write(&store.path_for("User-1"), b"not json").unwrap();

        let err = store.get("User-1").unwrap_err();
        assert!(matches!(err, KronosError::Store { ref op, .. } if op == "decode_snapshot"));
    }
}
