//! Save targets for finished archives

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Persists a finished blob under a filename
#[async_trait]
pub trait SaveTarget: Send + Sync {
    /// Returns where the blob ended up
    async fn save(&self, file_name: &str, blob: &[u8]) -> Result<PathBuf>;
}

/// Writes blobs into a local folder
///
/// The blob is written to a hidden `.part` file and renamed into place.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SaveTarget for DirectorySaveTarget {
    async fn save(&self, file_name: &str, blob: &[u8]) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(Error::Save(format!("invalid file name '{}'", file_name)));
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let final_path = self.dir.join(file_name);
        let tmp_path = self.dir.join(format!(".{}.part", file_name));

        let written = match tokio::fs::write(&tmp_path, blob).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &final_path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(Error::Save(format!("{}: {}", final_path.display(), e)));
        }

        info!(path = %final_path.display(), bytes = blob.len(), "Archive saved");
        Ok(final_path)
    }
}
