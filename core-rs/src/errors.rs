//! Error types for testenv core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Port role error: {0}")]
    PortRoles(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnvError {
    /// Wrap an IO failure together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EnvError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, EnvError::InvalidState(_))
    }

    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, EnvError::ResourceExhausted(_))
    }
}

pub type Result<T> = std::result::Result<T, EnvError>;
