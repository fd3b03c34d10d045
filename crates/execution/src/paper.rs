// In crates/execution/src/paper.rs

use crate::types::{OrderIntent, OrderResult, PaperSettings};
use crate::{Error, OrderSink, Result};
use async_trait::async_trait;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::info;

/// Fills every intent immediately and keeps a record of what it was sent.
pub struct PaperOrderSink {
    fee_rate: Decimal,
    submitted: Mutex<Vec<OrderResult>>,
}

impl PaperOrderSink {
    pub fn new(settings: &PaperSettings) -> Result<Self> {
        let fee_rate = Decimal::from_f64(settings.taker_fee)
            .filter(|rate| *rate >= Decimal::ZERO)
            .ok_or_else(|| Error::SubmissionFailed {
                reason: format!("invalid taker fee {}", settings.taker_fee),
            })?;
        Ok(Self {
            fee_rate,
            submitted: Mutex::new(Vec::new()),
        })
    }

    /// Every fill so far, in submission order.
    pub async fn fills(&self) -> Vec<OrderResult> {
        self.submitted.lock().await.clone()
    }
}

#[async_trait]
impl OrderSink for PaperOrderSink {
    fn name(&self) -> &'static str {
        "PaperOrderSink"
    }

    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderResult> {
        if intent.size <= Decimal::ZERO {
            return Err(Error::SubmissionFailed {
                reason: format!("order size must be positive, got {}", intent.size),
            });
        }

        let mut submitted = self.submitted.lock().await;
        let result = OrderResult {
            order_id: format!("paper-{}", submitted.len() + 1),
            venue: intent.venue.clone(),
            symbol: intent.symbol.clone(),
            side: intent.side,
            filled_size: intent.size,
            fee: intent.size * self.fee_rate,
        };
        info!(
            order_id = %result.order_id,
            strategy = %intent.strategy,
            venue = %intent.venue,
            symbol = %intent.symbol,
            size = %intent.size,
            fee = %result.fee,
            "Paper order filled"
        );
        submitted.push(result.clone());
        Ok(result)
    }
}
