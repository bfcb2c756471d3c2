//! Shopping cart state.
//!
//! A [`Cart`] is an ordered list of [`LineItem`]s keyed by product id. Every
//! line always has a quantity of at least one: quantity updates below one are
//! ignored, and the only way to drop a line is [`Cart::remove_item`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{OrderTotals, PricingPolicy, ShippingMethod};
use crate::types::{Money, ProductId};

/// Errors raised when constructing a line item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// A line item must hold at least one unit.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Unit prices cannot be negative.
    #[error("unit price cannot be negative (got {0})")]
    NegativePrice(Money),
}

/// One product entry in the cart.
///
/// Deserialization goes through [`LineItem::new`], so stored lines keep the
/// same invariants as freshly built ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLineItem")]
pub struct LineItem {
    id: ProductId,
    name: String,
    spec_label: String,
    unit_price: Money,
    quantity: u32,
}

#[derive(Deserialize)]
struct RawLineItem {
    id: ProductId,
    name: String,
    spec_label: String,
    unit_price: Money,
    quantity: u32,
}

impl TryFrom<RawLineItem> for LineItem {
    type Error = CartError;

    fn try_from(raw: RawLineItem) -> Result<Self, Self::Error> {
        Self::new(raw.id, raw.name, raw.spec_label, raw.unit_price, raw.quantity)
    }
}

impl LineItem {
    /// Create a line item.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity and
    /// [`CartError::NegativePrice`] for a negative unit price.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        spec_label: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if unit_price.is_negative() {
            return Err(CartError::NegativePrice(unit_price));
        }

        Ok(Self {
            id,
            name: name.into(),
            spec_label: spec_label.into(),
            unit_price,
            quantity,
        })
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short product details line, e.g. `5mm thickness, 4'×8'`.
    #[must_use]
    pub fn spec_label(&self) -> &str {
        &self.spec_label
    }

    #[must_use]
    pub const fn unit_price(&self) -> Money {
        self.unit_price
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(LineItem::quantity).sum()
    }

    /// Add a line, or merge its quantity into an existing line with the same id.
    pub fn add_item(&mut self, item: LineItem) {
        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }

    /// Set the quantity of a line.
    ///
    /// Quantities below one are ignored rather than removing the line, as are
    /// unknown ids. Returns `true` when the cart changed.
    pub fn update_quantity(&mut self, id: ProductId, new_quantity: i64) -> bool {
        let Ok(quantity) = u32::try_from(new_quantity) else {
            return false;
        };
        if quantity == 0 {
            return false;
        }

        match self.items.iter_mut().find(|line| line.id == id) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Add one unit to a line.
    pub fn increment(&mut self, id: ProductId) -> bool {
        self.get(id)
            .map(|line| i64::from(line.quantity) + 1)
            .is_some_and(|quantity| self.update_quantity(id, quantity))
    }

    /// Remove one unit from a line. A line at quantity one is left alone.
    pub fn decrement(&mut self, id: ProductId) -> bool {
        self.get(id)
            .map(|line| i64::from(line.quantity) - 1)
            .is_some_and(|quantity| self.update_quantity(id, quantity))
    }

    /// Remove a line whatever its quantity. Removing an absent id is a no-op.
    pub fn remove_item(&mut self, id: ProductId) -> Option<LineItem> {
        let index = self.items.iter().position(|line| line.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Price the cart.
    #[must_use]
    pub fn totals(&self, policy: &PricingPolicy, method: ShippingMethod) -> OrderTotals {
        policy.quote(&self.items, method)
    }
}

impl FromIterator<LineItem> for Cart {
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        let mut cart = Self::new();
        for item in iter {
            cart.add_item(item);
        }
        cart
    }
}
