//! The per-run working directory.
//!
//! Recreated from scratch at the start of every download and never cleaned
//! up afterwards: the extracted executable is launched from inside it.

use std::io;
use std::path::{Path, PathBuf};

use launchpad_schema::AssetNames;

#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
    names: AssetNames,
}

impl WorkDir {
    /// Remove whatever sits at `root`, then create it as an empty directory.
    pub async fn reset(root: impl Into<PathBuf>, names: AssetNames) -> io::Result<Self> {
        let root = root.into();
        match tokio::fs::symlink_metadata(&root).await {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!("Removing previous working directory {}", root.display());
                tokio::fs::remove_dir_all(&root).await?;
            }
            // A plain file or a symlink: drop the entry, never its target.
            Ok(_) => {
                tracing::debug!("Removing non-directory at {}", root.display());
                tokio::fs::remove_file(&root).await?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root, names })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn names(&self) -> &AssetNames {
        &self.names
    }

    pub fn archive_path(&self) -> PathBuf {
        self.root.join(&self.names.archive)
    }

    pub fn executable_path(&self) -> PathBuf {
        self.root.join(&self.names.executable)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.names.manifest)
    }
}
