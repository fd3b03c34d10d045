// In crates/audit/src/lib.rs

pub mod error;
pub mod ledger;
pub mod types;

pub use error::{Error, Result};
pub use ledger::{AuditLedger, read_journal};
pub use types::{AuditEntry, AuditFilter, AuditSettings};
