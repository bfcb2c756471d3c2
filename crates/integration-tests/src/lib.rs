//! Integration tests for Sheetline.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sheetline-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_pricing` - Catalog to cart to order summary
//! - `checkout_flow` - Step machine through confirmation
//! - `order_submission` - Duplicate submits, failures and retries
//!
//! This crate holds the shared fixtures: the bundled catalog, an in-memory
//! session, a filled-in shopper and a processor that fails on demand.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use sheetline_core::cart::Cart;
use sheetline_core::catalog::Catalog;
use sheetline_core::checkout::Field;
use sheetline_core::order::Order;
use sheetline_core::ProductId;
use sheetline_storefront::catalog::{CatalogLoadError, parse_catalog};
use sheetline_storefront::{
    CheckoutController, FailureMode, OrderProcessor, OrderReceipt, ProcessorError,
    SimulatedProcessor,
};
use tower_sessions::{MemoryStore, Session};
use uuid::Uuid;

/// The catalog shipped with the storefront.
pub const BUNDLED_CATALOG: &str = include_str!("../../storefront/content/catalog.yaml");

/// Latency used by test processors; tests run with a paused clock.
pub const PROCESSOR_LATENCY: Duration = Duration::from_millis(1500);

/// Load the bundled catalog.
///
/// # Errors
///
/// Returns an error if the bundled YAML does not parse.
pub fn catalog() -> Result<Catalog, CatalogLoadError> {
    parse_catalog(BUNDLED_CATALOG)
}

/// Two 5mm black sheets and one 3mm frosted sheet: $249.97.
///
/// # Errors
///
/// Returns an error if the bundled catalog is missing either product.
pub fn reference_cart() -> Result<Cart, Box<dyn std::error::Error>> {
    let catalog = catalog()?;
    let mut cart = Cart::new();
    cart.add_item(catalog.get(ProductId::new(3))?.to_line_item(2)?);
    cart.add_item(catalog.get(ProductId::new(2))?.to_line_item(1)?);
    Ok(cart)
}

/// A fresh session backed by an in-memory store.
#[must_use]
pub fn session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

/// Valid shipping details.
pub const SHIPPING_DETAILS: [(Field, &str); 7] = [
    (Field::FirstName, "Jane"),
    (Field::LastName, "Doe"),
    (Field::Email, "jane@example.com"),
    (Field::Phone, "(555) 123-4567"),
    (Field::Address, "123 Main St"),
    (Field::City, "New York"),
    (Field::Zip, "10001"),
];

/// Valid card details.
pub const CARD_DETAILS: [(Field, &str); 4] = [
    (Field::CardNumber, "1234 5678 9012 3456"),
    (Field::CardExpiry, "12/28"),
    (Field::CardCvc, "123"),
    (Field::NameOnCard, "Jane Doe"),
];

/// Type a list of values into the checkout form.
pub fn fill<P, S>(checkout: &mut CheckoutController<P, S>, values: &[(Field, &str)])
where
    P: OrderProcessor,
    S: sheetline_storefront::OrderStore,
{
    for (field, value) in values {
        checkout.set_field(*field, *value);
    }
}

/// A checkout over the reference cart with a simulated processor.
///
/// # Errors
///
/// Returns an error if the reference cart cannot be built.
pub fn simulated_checkout(
    failure: FailureMode,
) -> Result<CheckoutController<SimulatedProcessor, Session>, Box<dyn std::error::Error>> {
    Ok(CheckoutController::new(
        reference_cart()?,
        SimulatedProcessor::new(PROCESSOR_LATENCY, failure),
        session(),
    ))
}

/// Processor that is unavailable for the first `failures` calls.
#[derive(Debug)]
pub struct FlakyProcessor {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyProcessor {
    #[must_use]
    pub const fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OrderProcessor for FlakyProcessor {
    async fn process(&self, order: &Order) -> Result<OrderReceipt, ProcessorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(PROCESSOR_LATENCY).await;
        if call < self.failures {
            return Err(ProcessorError::Unavailable(format!("attempt {}", call + 1)));
        }
        Ok(OrderReceipt {
            order_id: order.id().clone(),
            transaction_id: Uuid::new_v4(),
            processed_at: Utc::now(),
        })
    }
}
