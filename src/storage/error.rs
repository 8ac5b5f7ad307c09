use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("link store {} is unavailable: {reason}", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("no free file name found for a new link store near {} after {attempts} attempts", path.display())]
    NamesExhausted { path: PathBuf, attempts: usize },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),
}
