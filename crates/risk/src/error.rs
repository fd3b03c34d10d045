// In crates/risk/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid risk parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Contract(#[from] core_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
