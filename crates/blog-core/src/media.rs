use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use blog_util::filename::{sanitize_filename, unique_filename};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::CoreError;

/// Subdirectory of the storage root holding profile pictures.
pub const PROFILE_PICS_DIR: &str = "profile_pics";

/// Fresh names tried before giving up when a generated name already exists.
const MAX_NAME_ATTEMPTS: usize = 3;

/// Profile-picture storage rooted at a trusted directory.
///
/// Every stored file gets a leaf name from [`unique_filename`], so a
/// client-supplied name never contributes a directory component.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(storage_path: impl AsRef<Path>) -> Self {
        Self {
            dir: storage_path.as_ref().join(PROFILE_PICS_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a previously stored file. Returns `None` for names this store
    /// could not have produced.
    pub fn path_for(&self, stored_name: &str) -> Option<PathBuf> {
        match sanitize_filename(stored_name) {
            Ok(clean) if clean == stored_name => Some(self.dir.join(stored_name)),
            _ => None,
        }
    }

    /// Write `data` under a unique name derived from `raw_name` and return
    /// that name.
    pub async fn save(&self, raw_name: &str, data: &[u8]) -> Result<String, CoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let stored_name = unique_filename(raw_name)?;
            let path = self.dir.join(&stored_name);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    tracing::warn!("Generated media name {} already exists, retrying", stored_name);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let mut written = file.write_all(data).await;
            if written.is_ok() {
                written = file.flush().await;
            }
            drop(file);

            if let Err(e) = written {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e.into());
            }

            tracing::debug!("Stored {} bytes as {:?}", data.len(), path);
            return Ok(stored_name);
        }
    }

    /// Best-effort removal of a stored file.
    pub async fn remove(&self, stored_name: &str) {
        let Some(path) = self.path_for(stored_name) else {
            tracing::warn!("Refusing to remove unexpected media name {:?}", stored_name);
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("Failed to remove {:?}: {}", path, e);
            }
        }
    }
}
