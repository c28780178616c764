use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("shape mismatch: expected {expected} entities, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("index {index} out of range for {len} entities")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
