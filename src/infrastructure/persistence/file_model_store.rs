use crate::domain::ports::ModelStore;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Model store rooted at a directory: `<key>_model.json` and
/// `<key>_meta.json` per record.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never sees a half-written record.
pub struct FileModelStore {
    root: PathBuf,
}

impl FileModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create model cache directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn model_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}_model.json", key))
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}_meta.json", key))
    }

    fn write(path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("Failed to move {} into place", path.display()))?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn read(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

impl ModelStore for FileModelStore {
    fn save_model(&self, key: &str, bytes: &[u8]) -> Result<()> {
        Self::write(&self.model_path(key), bytes)
    }

    fn load_model(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Self::read(&self.model_path(key))
    }

    fn save_metadata(&self, key: &str, bytes: &[u8]) -> Result<()> {
        Self::write(&self.metadata_path(key), bytes)
    }

    fn load_metadata(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Self::read(&self.metadata_path(key))
    }
}
