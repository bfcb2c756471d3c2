//! Order processing.
//!
//! Placing an order hands the snapshot to an [`OrderProcessor`]. There is no
//! payment backend; [`SimulatedProcessor`] stands in for one with a fixed
//! latency and a configurable failure mode.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetline_core::order::{Order, OrderNumber};
use thiserror::Error;
use uuid::Uuid;

use crate::config::ProcessorConfig;

/// Errors returned by an order processor.
#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    /// The processor refused the order.
    #[error("Order {0} was declined")]
    Declined(OrderNumber),

    /// The processor could not be reached.
    #[error("Processor unavailable: {0}")]
    Unavailable(String),
}

/// Acknowledgement of a processed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderNumber,
    pub transaction_id: Uuid,
    pub processed_at: DateTime<Utc>,
}

/// The external collaborator that accepts placed orders.
pub trait OrderProcessor {
    /// Process `order`.
    fn process(
        &self,
        order: &Order,
    ) -> impl Future<Output = Result<OrderReceipt, ProcessorError>> + Send;
}

/// When a [`SimulatedProcessor`] fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureMode {
    Never,
    Always,
    /// Fail with the given probability, clamped to `0.0..=1.0`.
    Random(f64),
}

impl FailureMode {
    fn should_fail(self) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::Random(p) => rand::random_bool(p.clamp(0.0, 1.0)),
        }
    }
}

/// Processor that waits, then accepts or declines.
#[derive(Debug)]
pub struct SimulatedProcessor {
    latency: Duration,
    failure: FailureMode,
    calls: AtomicUsize,
}

impl SimulatedProcessor {
    #[must_use]
    pub const fn new(latency: Duration, failure: FailureMode) -> Self {
        Self {
            latency,
            failure,
            calls: AtomicUsize::new(0),
        }
    }

    /// Build from configuration.
    #[must_use]
    pub fn from_config(config: &ProcessorConfig) -> Self {
        let failure = if config.failure_rate <= 0.0 {
            FailureMode::Never
        } else if config.failure_rate >= 1.0 {
            FailureMode::Always
        } else {
            FailureMode::Random(config.failure_rate)
        };
        Self::new(config.latency, failure)
    }

    /// Number of orders this processor has been asked to process.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedProcessor {
    fn default() -> Self {
        Self::from_config(&ProcessorConfig::default())
    }
}

impl OrderProcessor for SimulatedProcessor {
    async fn process(&self, order: &Order) -> Result<OrderReceipt, ProcessorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.failure.should_fail();

        tokio::time::sleep(self.latency).await;

        if fail {
            return Err(ProcessorError::Declined(order.id().clone()));
        }

        Ok(OrderReceipt {
            order_id: order.id().clone(),
            transaction_id: Uuid::new_v4(),
            processed_at: Utc::now(),
        })
    }
}
