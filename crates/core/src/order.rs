//! The order snapshot created when the shopper places an order.
//!
//! An [`Order`] is built once from the cart, the checkout form and the
//! shipping selection, and is never mutated afterwards. It carries only the
//! last four digits of a card; the full number, expiry and CVC stay in the
//! form.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, LineItem};
use crate::checkout::form::{CheckoutForm, Country, FieldErrors, PaymentMethod};
use crate::checkout::step::{CheckoutStep, check_path_to};
use crate::pricing::{OrderTotals, PricingPolicy, ShippingMethod};
use crate::types::{Email, EmailError, Money};

/// Errors raised while building an order snapshot.
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("cannot place an order for an empty cart")]
    EmptyCart,
    #[error("checkout details are incomplete: {0}")]
    Invalid(FieldErrors),
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),
    #[error("invalid order number: {0}")]
    InvalidNumber(String),
}

/// Human-facing order number, `ORD-` followed by six digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    const PREFIX: &'static str = "ORD-";

    /// Draw a fresh number in `ORD-100000..=ORD-999999`.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let n: u32 = rng.random_range(100_000..=999_999);
        Self(format!("{}{n}", Self::PREFIX))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| OrderError::InvalidNumber(s.to_owned()))?;
        if digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()) && !digits.starts_with('0')
        {
            Ok(Self(s.to_owned()))
        } else {
            Err(OrderError::InvalidNumber(s.to_owned()))
        }
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
}

impl CustomerSnapshot {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Where and how the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSnapshot {
    pub address: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: Country,
    pub method: ShippingMethod,
    pub cost: Money,
}

/// How the order was paid. Card details are reduced to the last four digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    pub method: PaymentMethod,
    pub last_four: Option<String>,
}

/// An immutable record of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderNumber,
    customer: CustomerSnapshot,
    shipping: ShippingSnapshot,
    payment: PaymentSnapshot,
    items: Vec<LineItem>,
    subtotal: Money,
    tax: Money,
    total: Money,
    notes: Option<String>,
    placed_at: DateTime<Utc>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

impl Order {
    /// Snapshot the current checkout state.
    ///
    /// Every step guard is re-checked so that an order is never built from
    /// details that no longer validate.
    ///
    /// # Errors
    ///
    /// - [`OrderError::EmptyCart`] when the cart has no lines
    /// - [`OrderError::Invalid`] when any step guard fails
    /// - [`OrderError::Email`] when the email does not parse
    pub fn snapshot(
        id: OrderNumber,
        cart: &Cart,
        form: &CheckoutForm,
        shipping_method: ShippingMethod,
        policy: &PricingPolicy,
        placed_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let errors = check_path_to(CheckoutStep::Review, form);
        if !errors.is_empty() {
            return Err(OrderError::Invalid(errors));
        }

        let OrderTotals {
            subtotal,
            shipping,
            tax,
            total,
        } = cart.totals(policy, shipping_method);

        let last_four = if form.payment_method.requires_card() {
            form.card_last_four()
        } else {
            None
        };

        Ok(Self {
            id,
            customer: CustomerSnapshot {
                first_name: form.first_name.trim().to_owned(),
                last_name: form.last_name.trim().to_owned(),
                email: Email::parse(form.email.trim())?,
                phone: form.phone.trim().to_owned(),
            },
            shipping: ShippingSnapshot {
                address: form.address.trim().to_owned(),
                address2: non_empty(&form.address2),
                city: form.city.trim().to_owned(),
                state: form.state.trim().to_owned(),
                zip: form.zip.trim().to_owned(),
                country: form.country,
                method: shipping_method,
                cost: shipping,
            },
            payment: PaymentSnapshot {
                method: form.payment_method,
                last_four,
            },
            items: cart.items().to_vec(),
            subtotal,
            tax,
            total,
            notes: non_empty(&form.notes),
            placed_at,
        })
    }

    #[must_use]
    pub const fn id(&self) -> &OrderNumber {
        &self.id
    }

    #[must_use]
    pub const fn customer(&self) -> &CustomerSnapshot {
        &self.customer
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingSnapshot {
        &self.shipping
    }

    #[must_use]
    pub const fn payment(&self) -> &PaymentSnapshot {
        &self.payment
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub const fn subtotal(&self) -> Money {
        self.subtotal
    }

    #[must_use]
    pub const fn tax(&self) -> Money {
        self.tax
    }

    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    #[must_use]
    pub const fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    /// Total units ordered.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(LineItem::quantity).sum()
    }

    /// Expected delivery date counted from `from`.
    #[must_use]
    pub fn estimated_delivery(&self, from: NaiveDate) -> NaiveDate {
        let days = Days::new(u64::from(self.shipping.method.estimated_delivery_days()));
        from.checked_add_days(days).unwrap_or(from)
    }
}
