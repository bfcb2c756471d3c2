//! Catalog browsing and cart quotes.
//!
//! # Usage
//!
//! ```bash
//! sl-cli catalog --color clear,frosted --sort popular
//! sl-cli quote 1:2 5:1 --shipping express
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_CATALOG_PATH` - Catalog YAML file
//! - `STOREFRONT_TAX_RATE` and shipping fee overrides, see `StorefrontConfig`

use std::collections::BTreeSet;

use sheetline_core::cart::Cart;
use sheetline_core::catalog::{Catalog, CatalogError, Color, ProductFilter, SheetSize, SortOrder, Thickness};
use sheetline_core::pricing::{OrderTotals, ShippingMethod};
use sheetline_core::{Money, ProductId};
use sheetline_storefront::StorefrontConfig;
use sheetline_storefront::catalog::{CatalogLoadError, load_catalog};
use thiserror::Error;

/// Errors that can occur while building a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// A cart line was not `ID:QUANTITY`.
    #[error("Invalid cart line '{0}', expected PRODUCT_ID:QUANTITY")]
    InvalidLine(String),

    /// Catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Load(#[from] CatalogLoadError),

    /// Unknown product or zero quantity.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Build a product filter from command-line options.
#[must_use]
pub fn filter(
    thickness: Vec<Thickness>,
    color: Vec<Color>,
    size: Vec<SheetSize>,
    min_price: u32,
    max_price: u32,
) -> ProductFilter {
    ProductFilter {
        thicknesses: thickness.into_iter().collect::<BTreeSet<_>>(),
        colors: color.into_iter().collect(),
        sizes: size.into_iter().collect(),
        min_price: Money::from_dollars(min_price),
        max_price: Money::from_dollars(max_price),
    }
}

/// Print the catalog, filtered and sorted.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
#[allow(clippy::print_stdout)]
pub fn list(
    config: &StorefrontConfig,
    filter: &ProductFilter,
    sort: SortOrder,
) -> Result<(), QuoteError> {
    let catalog = load_catalog(&config.catalog_path)?;
    let products = catalog.browse(filter, sort);

    println!("Showing {} of {} products", products.len(), catalog.len());
    for product in products {
        let discount = product
            .discount_percent()
            .map(|pct| format!("  (-{pct}%)"))
            .unwrap_or_default();
        let badge = product
            .badge
            .as_deref()
            .map(|b| format!("  [{b}]"))
            .unwrap_or_default();
        println!(
            "{:>3}  {:<24} {:<12} {:<26} {:>9}{discount}{badge}",
            product.id.as_u32(),
            product.name,
            product.brand,
            product.spec_label,
            product.price.to_string(),
        );
    }
    Ok(())
}

/// Parse a `PRODUCT_ID:QUANTITY` cart line.
///
/// # Errors
///
/// Returns [`QuoteError::InvalidLine`] if the line is malformed.
pub fn parse_line(line: &str) -> Result<(ProductId, u32), QuoteError> {
    let invalid = || QuoteError::InvalidLine(line.to_string());
    let (id, quantity) = line.split_once(':').ok_or_else(invalid)?;
    let id: ProductId = id.parse().map_err(|_| invalid())?;
    let quantity: u32 = quantity.trim().parse().map_err(|_| invalid())?;
    Ok((id, quantity))
}

/// Build a cart from `PRODUCT_ID:QUANTITY` lines.
///
/// # Errors
///
/// Returns an error for malformed lines, unknown products or zero quantities.
pub fn build_cart<S: AsRef<str>>(catalog: &Catalog, lines: &[S]) -> Result<Cart, QuoteError> {
    let mut cart = Cart::new();
    for line in lines {
        let (id, quantity) = parse_line(line.as_ref())?;
        let item = catalog
            .get(id)?
            .to_line_item(quantity)
            .map_err(CatalogError::from)?;
        cart.add_item(item);
    }
    Ok(cart)
}

/// Print the order summary for a cart.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or a cart line is invalid.
pub fn quote(
    config: &StorefrontConfig,
    lines: &[String],
    shipping: ShippingMethod,
) -> Result<(), QuoteError> {
    let catalog = load_catalog(&config.catalog_path)?;
    let cart = build_cart(&catalog, lines)?;
    let totals = cart.totals(&config.pricing, shipping);
    print_summary(&cart, &totals, shipping);

    if shipping == ShippingMethod::Standard {
        if let Some(shortfall) = config.pricing.free_shipping_shortfall(totals.subtotal) {
            tracing::info!(%shortfall, "Add more to qualify for free standard shipping");
        }
    }
    Ok(())
}

/// Print cart lines and totals.
#[allow(clippy::print_stdout)]
pub fn print_summary(cart: &Cart, totals: &OrderTotals, shipping: ShippingMethod) {
    for item in cart.items() {
        println!(
            "{:>3} x {:<24} {:>9} {:>10}",
            item.quantity(),
            item.name(),
            item.unit_price().to_string(),
            item.line_total().to_string(),
        );
    }
    let shipping_cost = if totals.shipping.is_zero() {
        "Free".to_string()
    } else {
        totals.shipping.to_string()
    };
    println!("Subtotal ({} items): {:>12}", cart.item_count(), totals.subtotal.to_string());
    println!(
        "Shipping ({}, {}): {:>12}",
        shipping.label(),
        shipping.delivery_window(),
        shipping_cost
    );
    println!("Tax: {:>12}", totals.tax.to_string());
    println!("Total: {:>12}", totals.total.to_string());
}
