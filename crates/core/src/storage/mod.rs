//! Key to blob persistence for songs and their difficulty files.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{BeatmapError, Result};

/// Where an edit session reads and writes whole files.
pub trait BlobStore {
    /// Returns `None` when nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Key of a difficulty file within a song, e.g. `"my-song/Expert.dat"`.
pub fn song_file_key(song_id: &str, filename: &str) -> String {
    format!("{song_id}/{filename}")
}

/// In-memory registry, mostly for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            blobs: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// One file per key under `root`. Keys may contain `/` to form folders.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let escapes = key
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");
        if escapes {
            return Err(BeatmapError::msg(format!("invalid storage key `{key}`")));
        }
        Ok(self.root.join(key))
    }
}

impl BlobStore for DirStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("beatmap-editor-{name}-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn memory_store_round_trips_blobs() {
        let mut store = MemoryStore::new();
        store.save(&song_file_key("song", "Expert.dat"), b"{}").unwrap();

        assert_eq!(store.load("song/Expert.dat").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(store.load("song/Hard.dat").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn dir_store_creates_song_folders() {
        let root = scratch_dir("dir-store");
        let mut store = DirStore::new(&root);
        store.save("song/info.dat", b"info").unwrap();

        assert!(root.join("song").join("info.dat").exists());
        assert_eq!(store.load("song/info.dat").unwrap(), Some(b"info".to_vec()));
        assert_eq!(store.load("song/missing.dat").unwrap(), None);

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn errors_on_keys_that_leave_the_root() {
        let store = DirStore::new(scratch_dir("escape"));
        let err = store.load("../outside.dat").unwrap_err();
        assert!(format!("{err}").contains("outside.dat"));
        fs::remove_dir_all(store.root()).unwrap();
    }
}
