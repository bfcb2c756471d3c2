//! Order pricing: subtotal, shipping, tax and total.
//!
//! Pricing is a pure function of the cart lines, the selected shipping
//! method and a [`PricingPolicy`]. It never fails.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::types::Money;

/// Shipping method selected during checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    /// Free above the policy threshold, flat fee otherwise.
    #[default]
    Standard,
    /// Flat fee regardless of subtotal.
    Express,
}

impl ShippingMethod {
    /// All methods in display order.
    pub const ALL: [Self; 2] = [Self::Standard, Self::Express];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Standard Shipping",
            Self::Express => "Express Shipping",
        }
    }

    /// Delivery window shown next to the method.
    #[must_use]
    pub const fn delivery_window(&self) -> &'static str {
        match self {
            Self::Standard => "5-7 business days",
            Self::Express => "2-3 business days",
        }
    }

    /// Calendar days added to the order date for the delivery estimate.
    #[must_use]
    pub const fn estimated_delivery_days(&self) -> u32 {
        match self {
            Self::Standard => 7,
            Self::Express => 3,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown shipping method.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown shipping method: {0} (expected standard or express)")]
pub struct ParseShippingMethodError(String);

impl FromStr for ShippingMethod {
    type Err = ParseShippingMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            other => Err(ParseShippingMethodError(other.to_owned())),
        }
    }
}

/// Rates and fees used to price an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Fractional sales tax rate applied to the subtotal.
    pub tax_rate: Decimal,
    /// Standard shipping is free when the subtotal is strictly above this.
    pub free_shipping_threshold: Money,
    pub standard_fee: Money,
    pub express_fee: Money,
}

impl PricingPolicy {
    /// Shipping cost for `method` given the order subtotal.
    #[must_use]
    pub fn shipping_cost(&self, method: ShippingMethod, subtotal: Money) -> Money {
        match method {
            ShippingMethod::Express => self.express_fee,
            ShippingMethod::Standard if subtotal > self.free_shipping_threshold => Money::ZERO,
            ShippingMethod::Standard => self.standard_fee,
        }
    }

    /// How much more must be spent to qualify for free standard shipping.
    #[must_use]
    pub fn free_shipping_shortfall(&self, subtotal: Money) -> Option<Money> {
        if subtotal > self.free_shipping_threshold {
            None
        } else {
            Some(Money::new(
                self.free_shipping_threshold.amount() - subtotal.amount() + Decimal::new(1, 2),
            ))
        }
    }

    /// Price a set of lines.
    ///
    /// An empty order has nothing to ship, so every amount is zero whichever
    /// method is selected.
    #[must_use]
    pub fn quote(&self, items: &[LineItem], method: ShippingMethod) -> OrderTotals {
        if items.is_empty() {
            return OrderTotals::default();
        }

        let subtotal: Money = items.iter().map(LineItem::line_total).sum();
        let shipping = self.shipping_cost(method, subtotal);
        let tax = subtotal.apply_rate(self.tax_rate);

        OrderTotals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(7, 2),
            free_shipping_threshold: Money::from_dollars(200),
            standard_fee: Money::from_dollars(25),
            express_fee: Money::from_dollars(35),
        }
    }
}

/// Derived order amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Whether shipping is free for this order.
    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.shipping.is_zero()
    }
}
