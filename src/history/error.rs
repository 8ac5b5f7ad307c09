use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("malformed record at line {line}: expected at least {expected} tab-separated fields, found {found}")]
    MalformedRecord {
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("no history files found in {}", dir.display())]
    NoHistoryFilesFound { dir: PathBuf },

    #[error("history file is not valid UTF-16: {0}")]
    Encoding(String),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),
}
