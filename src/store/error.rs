use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("store rejected write: {0}")]
    Rejected(String),
}
