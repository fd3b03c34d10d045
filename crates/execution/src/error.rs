// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Order submission failed: {reason}")]
    SubmissionFailed { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
