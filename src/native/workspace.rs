use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::constants::RUN_DIR_PREFIX;
use crate::core::errors::SandboxError;

/// Directory owning every artifact of a single run.
///
/// Removed as a unit by [`Workspace::remove`], or on drop when the run is
/// cancelled or panics before reaching it. Removal failures are logged only.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    removed: bool,
}

impl Workspace {
    pub async fn create(base_dir: &Path) -> Result<Self, SandboxError> {
        let path = base_dir.join(format!("{}{}", RUN_DIR_PREFIX, Uuid::new_v4()));
        fs::create_dir_all(&path)
            .await
            .map_err(|source| SandboxError::Workspace {
                path: path.clone(),
                source,
            })?;

        tracing::trace!("Created workspace {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub async fn write(&self, name: &str, contents: &str) -> Result<PathBuf, SandboxError> {
        let path = self.file(name);
        fs::write(&path, contents)
            .await
            .map_err(|source| SandboxError::Artifact {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    pub async fn remove(mut self) {
        self.removed = true;
        if let Err(e) = fs::remove_dir_all(&self.path).await {
            tracing::warn!("Failed to remove workspace {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Failed to remove workspace {}: {}", self.path.display(), e);
            }
        }
    }
}
