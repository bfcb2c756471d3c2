//! Scripted checkout.
//!
//! Runs a full checkout from a YAML script: fills the cart and the form,
//! walks the steps, places the order and prints the confirmation.
//!
//! # Script format
//!
//! ```yaml
//! items: ["3:2", "2:1"]
//! shipping: express
//! payment: credit-card
//! country: US
//! fields:
//!   firstName: Jane
//!   lastName: Doe
//!   email: jane@example.com
//!   phone: "555-123-4567"
//!   address: 123 Main St
//!   city: New York
//!   zip: "10001"
//!   cardNumber: "1234 5678 9012 3456"
//!   cardExpiry: "12/28"
//!   cardCvc: "123"
//!   nameOnCard: Jane Doe
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use sheetline_core::checkout::{Advance, Country, Field, FieldErrors, PaymentMethod};
use sheetline_core::pricing::ShippingMethod;
use sheetline_storefront::catalog::load_catalog;
use sheetline_storefront::{
    CheckoutController, Confirmation, SimulatedProcessor, StorefrontConfig, SubmitOutcome,
    load_confirmation,
};
use thiserror::Error;
use tower_sessions::{MemoryStore, Session};
use tracing::info;

use super::catalog::{build_cart, print_summary};

/// A checkout script.
#[derive(Debug, Deserialize)]
pub struct CheckoutScript {
    /// Cart lines as `PRODUCT_ID:QUANTITY`.
    pub items: Vec<String>,
    #[serde(default)]
    pub shipping: ShippingMethod,
    #[serde(default)]
    pub payment: PaymentMethod,
    #[serde(default)]
    pub country: Country,
    #[serde(default)]
    pub fields: BTreeMap<Field, String>,
}

/// Errors that stop a scripted checkout.
#[derive(Debug, Error)]
pub enum CheckoutScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Checkout blocked: {0}")]
    Rejected(FieldErrors),

    #[error("{0}")]
    Failed(&'static str),
}

/// Run a checkout script.
///
/// # Errors
///
/// Returns an error if the script cannot be read, a step does not validate,
/// or the order cannot be placed.
pub async fn run(config: &StorefrontConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await.map_err(CheckoutScriptError::from)?;
    let script: CheckoutScript =
        serde_yaml::from_str(&content).map_err(CheckoutScriptError::from)?;
    info!(path = %path.display(), items = script.items.len(), "Loaded checkout script");

    let catalog = load_catalog(&config.catalog_path)?;
    let cart = build_cart(&catalog, &script.items)?;

    let session = Session::new(None, Arc::new(MemoryStore::default()), None);
    let mut checkout = CheckoutController::with_policy(
        cart,
        config.pricing,
        SimulatedProcessor::from_config(&config.processor),
        session,
    );
    checkout.start().await?;

    for (field, value) in script.fields {
        checkout.set_field(field, value);
    }
    checkout.select_country(script.country);
    checkout.select_shipping(script.shipping);
    checkout.select_payment(script.payment);

    walk_to_review(&mut checkout)?;
    print_summary(checkout.cart(), &checkout.totals(), checkout.shipping_method());

    let navigation = match checkout.place_order().await {
        SubmitOutcome::Confirmed { navigation, .. } => navigation,
        SubmitOutcome::Invalid(errors) => return Err(CheckoutScriptError::Rejected(errors).into()),
        SubmitOutcome::Failed(toast) => {
            return Err(CheckoutScriptError::Failed(toast.description).into());
        }
        SubmitOutcome::Ignored => {
            return Err(CheckoutScriptError::Failed("An order is already being placed").into());
        }
        SubmitOutcome::NotAtReview(_) => {
            return Err(CheckoutScriptError::Failed("Review the order before placing it").into());
        }
        SubmitOutcome::AlreadyPlaced(_) => {
            return Err(CheckoutScriptError::Failed("This order has already been placed").into());
        }
    };
    info!(path = %navigation.to_path(), "Navigating to confirmation");

    let sheetline_storefront::Navigation::Confirmation { order_id } = &navigation;
    let today = chrono::Local::now().date_naive();
    match load_confirmation(checkout.store(), Some(order_id.as_str()), today).await? {
        Confirmation::Ready(view) => print_confirmation(&view),
        Confirmation::Pending => info!("Loading order details..."),
    }
    Ok(())
}

/// Advance through every step, stopping at the first rejection.
fn walk_to_review(
    checkout: &mut CheckoutController<SimulatedProcessor, Session>,
) -> Result<(), CheckoutScriptError> {
    loop {
        match checkout.next_step() {
            Advance::Moved { .. } => {}
            Advance::AtReview => return Ok(()),
            Advance::Rejected(errors) => return Err(CheckoutScriptError::Rejected(errors)),
        }
    }
}

#[allow(clippy::print_stdout)]
fn print_confirmation(view: &sheetline_storefront::ConfirmationView) {
    let order = &view.order;
    println!();
    println!("Order Confirmed!");
    println!("Order Number:       {}", order.id());
    println!("Order Date:         {}", view.order_date);
    println!("Estimated Delivery: {}", view.estimated_delivery);
    println!(
        "Ship to:            {}, {}, {} {}, {}",
        order.customer().full_name(),
        order.shipping().address,
        order.shipping().city,
        order.shipping().zip,
        order.shipping().country.name()
    );
    match order.payment().last_four.as_deref() {
        Some(last_four) => println!("Payment:            Card ending in {last_four}"),
        None => println!("Payment:            {}", order.payment().method.label()),
    }
    println!("Total:              {}", order.total());
}
