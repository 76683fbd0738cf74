// File-backed checkpoint store
use crate::application::checkpoint_store::CheckpointStore;
use crate::domain::measurement::RowId;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stores the checkpoint as a single decimal integer in a text file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<RowId>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read checkpoint at {}", self.path.display()))?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let id = trimmed.parse::<RowId>().with_context(|| {
            format!(
                "checkpoint at {} is not an integer: {:?}",
                self.path.display(),
                trimmed
            )
        })?;
        Ok(Some(id))
    }

    fn save(&self, id: RowId) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create checkpoint dir {}", dir.display()))?;

        // Write next to the target so the rename stays on one filesystem
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{}", id)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|err| anyhow::anyhow!("failed to persist checkpoint: {err}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("last_id"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_empty_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_id");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(FileCheckpointStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn test_save_overwrites_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("state").join("last_id"));

        store.save(12).unwrap();
        store.save(13_000_000_000).unwrap();

        assert_eq!(store.load().unwrap(), Some(13_000_000_000));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "13000000000\n");
        // only the checkpoint itself is left in the directory
        assert_eq!(std::fs::read_dir(dir.path().join("state")).unwrap().count(), 1);
    }

    #[test]
    fn test_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_id");
        std::fs::write(&path, "twelve").unwrap();
        assert!(FileCheckpointStore::new(path).load().is_err());
    }
}
