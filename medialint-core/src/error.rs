use thiserror::Error;

/// Custom error types for medialint
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Media probe error: {0}")]
    Probe(#[from] crate::media::probe::ProbeError),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Result type for medialint operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
