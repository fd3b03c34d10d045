// In crates/audit/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Audit journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit journal serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt audit journal at line {line}: {reason}")]
    CorruptJournal { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
