//! Session-scoped order storage.
//!
//! The last placed order is written once at submission, read once by the
//! confirmation view, and cleared whenever a new checkout starts.

use std::future::Future;

use sheetline_core::order::Order;
use thiserror::Error;
use tower_sessions::Session;

/// Session keys for checkout data.
pub mod keys {
    /// Key for the most recently placed order snapshot.
    pub const LAST_ORDER: &str = "lastOrder";
}

/// Session storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Storage for the order handed from checkout to confirmation.
pub trait OrderStore {
    /// Store `order` as the last placed order, replacing any previous one.
    fn save_last_order(&self, order: &Order) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove and return the last placed order.
    fn take_last_order(&self) -> impl Future<Output = Result<Option<Order>, StoreError>> + Send;

    /// Forget the last placed order.
    fn clear_last_order(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl OrderStore for Session {
    async fn save_last_order(&self, order: &Order) -> Result<(), StoreError> {
        self.insert(keys::LAST_ORDER, order).await?;
        Ok(())
    }

    async fn take_last_order(&self) -> Result<Option<Order>, StoreError> {
        Ok(self.remove::<Order>(keys::LAST_ORDER).await?)
    }

    async fn clear_last_order(&self) -> Result<(), StoreError> {
        self.remove_value(keys::LAST_ORDER).await?;
        Ok(())
    }
}
