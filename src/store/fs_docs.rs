use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use crate::store::{DocumentStore, StoreError};

/// Document store backed by a directory on local disk, standing in for the
/// hosted bucket the production deployment points at. Paths handed back are
/// relative to the configured root.
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        // Reject traversal out of the root; stored names are server-generated
        // but the check is cheap to keep at the boundary.
        let candidate = Path::new(path);
        if candidate.is_absolute()
            || candidate
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(StoreError::Io(format!("invalid document path: {}", path)));
        }
        Ok(self.root.join(candidate))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let full = self
            .resolve(path)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&full, bytes).with_context(|| format!("writing {}", full.display()))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, StoreError> {
        self.write(path, bytes)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            // Already gone is fine for a cleanup call.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}
