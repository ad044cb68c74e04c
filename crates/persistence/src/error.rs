//! Persistence error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Corrupt history document {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PersistenceError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
