//! Order confirmation view model.
//!
//! The confirmation page reads the last placed order from the session once.
//! Without a stored order, or when the stored order is not the one named in
//! the `orderId` query parameter, the page stays in its loading state.

use chrono::NaiveDate;
use serde::Serialize;
use sheetline_core::order::Order;

use crate::session::{OrderStore, StoreError};

/// Long US date, e.g. "October 19, 2026".
const DATE_FORMAT: &str = "%B %-d, %Y";

/// What the confirmation page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Nothing to show yet.
    Pending,
    /// The placed order.
    Ready(Box<ConfirmationView>),
}

/// The placed order with display dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationView {
    pub order: Order,
    pub order_date: String,
    pub estimated_delivery: String,
}

impl ConfirmationView {
    /// Build the view for `order`, estimating delivery from `today`.
    #[must_use]
    pub fn new(order: Order, today: NaiveDate) -> Self {
        let order_date = order.placed_at().date_naive().format(DATE_FORMAT).to_string();
        let estimated_delivery = order.estimated_delivery(today).format(DATE_FORMAT).to_string();
        Self {
            order,
            order_date,
            estimated_delivery,
        }
    }
}

/// Load the confirmation for `order_id`.
///
/// A matching order is removed from the store. An order placed under a
/// different id is left in place.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn load_confirmation<S: OrderStore>(
    store: &S,
    order_id: Option<&str>,
    today: NaiveDate,
) -> Result<Confirmation, StoreError> {
    let Some(order) = store.take_last_order().await? else {
        tracing::debug!("No stored order for confirmation");
        return Ok(Confirmation::Pending);
    };

    if let Some(wanted) = order_id.map(str::trim).filter(|id| *id != order.id().as_str()) {
        tracing::warn!(requested = wanted, stored = %order.id(), "Confirmation order id mismatch");
        store.save_last_order(&order).await?;
        return Ok(Confirmation::Pending);
    }

    Ok(Confirmation::Ready(Box::new(ConfirmationView::new(order, today))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;
    use crate::processor::tests::sample_order;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn test_ready_then_pending() {
        let store = session();
        let order = sample_order();
        store.save_last_order(&order).await.unwrap();

        let first = load_confirmation(&store, Some("ORD-555555"), today()).await.unwrap();
        let Confirmation::Ready(view) = first else {
            panic!("expected stored order");
        };
        assert_eq!(view.order, order);
        assert_eq!(view.estimated_delivery, "October 26, 2026");

        let second = load_confirmation(&store, Some("ORD-555555"), today()).await.unwrap();
        assert_eq!(second, Confirmation::Pending);
    }

    #[tokio::test]
    async fn test_nothing_stored_is_pending() {
        let store = session();
        let result = load_confirmation(&store, Some("ORD-555555"), today()).await.unwrap();
        assert_eq!(result, Confirmation::Pending);
    }

    #[tokio::test]
    async fn test_mismatched_id_keeps_order() {
        let store = session();
        store.save_last_order(&sample_order()).await.unwrap();

        let result = load_confirmation(&store, Some("ORD-111111"), today()).await.unwrap();
        assert_eq!(result, Confirmation::Pending);
        assert!(store.take_last_order().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_query_shows_stored_order() {
        let store = session();
        store.save_last_order(&sample_order()).await.unwrap();
        let result = load_confirmation(&store, None, today()).await.unwrap();
        assert!(matches!(result, Confirmation::Ready(_)));
    }

    #[test]
    fn test_date_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(date.format(DATE_FORMAT).to_string(), "March 5, 2026");
    }
}
