use std::sync::Arc;

use blog_db::{DbError, DbPool};
use blog_util::filename::InvalidNameError;
use thiserror::Error;

pub mod media;
pub mod posts;
pub mod users;

pub use media::MediaStore;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("invalid filename")]
    InvalidName(#[from] InvalidNameError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Runtime settings the request handlers need.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_path: String,
    pub max_upload_size: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<AppConfig>,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> Self {
        let media = MediaStore::new(&config.storage_path);
        Self {
            db,
            config: Arc::new(config),
            media,
        }
    }
}
