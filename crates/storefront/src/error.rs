//! Order submission errors with Sentry integration.
//!
//! Submission never fails the process. A [`SubmitError`] is reported to
//! Sentry and turned into a toast for the shopper, and checkout state is
//! left untouched so the order can be retried.

use sheetline_core::order::OrderError;
use thiserror::Error;

use crate::processor::ProcessorError;
use crate::session::StoreError;

/// Why an order could not be placed.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The order snapshot could not be built.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The order processor rejected or dropped the order.
    #[error("Processor error: {0}")]
    Processor(#[from] ProcessorError),

    /// The processed order could not be written to the session. The order
    /// still stands; only the confirmation page loses it.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SubmitError {
    /// Report the error to Sentry and the log.
    ///
    /// Snapshot errors come from shopper input and are only logged.
    pub fn report(&self) {
        if matches!(self, Self::Order(_)) {
            tracing::warn!(error = %self, "Order rejected before processing");
            return;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Order submission failed"
        );
    }
}

/// Add a breadcrumb for checkout actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of shopper
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Advanced to payment", Some(&[("step", "payment")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
