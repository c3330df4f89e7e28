use std::path::PathBuf;
use thiserror::Error;

/// Failure writing the persisted state. Never fatal: the in-memory state
/// stays authoritative and the next save retries.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("state path has no parent directory: {0}")]
    NoParentDirectory(PathBuf),
}
