use thiserror::Error;

/// Errors raised by snapshot operations.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("Snapshot blob error: {0}")]
    Blob(String),
}
