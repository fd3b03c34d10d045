// In crates/execution/src/lib.rs

use async_trait::async_trait;

pub mod error;
pub mod paper;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use paper::PaperOrderSink;
pub use types::{OrderIntent, OrderResult, PaperSettings};

/// The destination for approved trades.
///
/// The governance engine only sizes and approves; an `OrderSink` is
/// responsible for submitting the intent to a venue and reporting the result.
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// The name of the sink (e.g., "PaperOrderSink").
    fn name(&self) -> &'static str;

    /// Submits one intent and waits for the venue's acknowledgement.
    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderResult>;
}
