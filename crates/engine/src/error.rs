// In crates/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The caller asked for something the engine can never act on.
    #[error(transparent)]
    Contract(#[from] core_types::Error),

    #[error("Risk configuration error: {0}")]
    Risk(#[from] risk::Error),

    #[error("Capital pool error: {0}")]
    Capital(capital::Error),

    /// Fatal. The pool is flagged for manual reconciliation.
    #[error("Capital invariant breached: {0}")]
    InvariantBreach(String),

    #[error("Capital pool is awaiting manual reconciliation")]
    ReconciliationRequired,

    #[error("Audit error: {0}")]
    Audit(#[from] audit::Error),
}

impl From<capital::Error> for Error {
    fn from(e: capital::Error) -> Self {
        match e {
            capital::Error::UnknownCell { venue, .. } => {
                Error::Contract(core_types::Error::UnknownVenue(venue))
            }
            capital::Error::InvariantBreach(msg) => Error::InvariantBreach(msg),
            capital::Error::Contract(c) => Error::Contract(c),
            other => Error::Capital(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
