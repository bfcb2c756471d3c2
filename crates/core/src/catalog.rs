//! Acrylic sheet catalog: products, filters and sort orders.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{CartError, LineItem};
use crate::types::{Money, ProductId};

/// Errors raised while building or querying a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),
    #[error("product not found: {0}")]
    NotFound(ProductId),
    #[error("invalid {kind}: {value}")]
    InvalidOption { kind: &'static str, value: String },
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Defines a closed set of catalog options with a slug for filters and a
/// display label.
macro_rules! catalog_option {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $slug:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $slug)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn slug(&self) -> &'static str {
                match self {
                    $(Self::$variant => $slug,)+
                }
            }

            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| {
                        option.slug().eq_ignore_ascii_case(wanted)
                            || option.label().eq_ignore_ascii_case(wanted)
                    })
                    .ok_or_else(|| CatalogError::InvalidOption {
                        kind: $kind,
                        value: wanted.to_owned(),
                    })
            }
        }
    };
}

catalog_option! {
    /// Sheet thickness.
    Thickness, "thickness" {
        Mm2 => "2mm", "2mm";
        Mm3 => "3mm", "3mm";
        Mm5 => "5mm", "5mm";
        Mm8 => "8mm", "8mm";
        Mm10 => "10mm", "10mm";
    }
}

catalog_option! {
    /// Sheet color or finish.
    Color, "color" {
        Clear => "clear", "Clear";
        Frosted => "frosted", "Frosted";
        Black => "black", "Black";
        White => "white", "White";
        Blue => "blue", "Blue";
        Red => "red", "Red";
    }
}

catalog_option! {
    /// Sheet dimensions.
    SheetSize, "size" {
        FourByEight => "4x8", "4' × 8'";
        FiveByTen => "5x10", "5' × 10'";
        Custom => "custom", "Custom Size";
    }
}

/// A product listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub thickness: Thickness,
    pub color: Color,
    pub size: SheetSize,
    pub spec_label: String,
    pub price: Money,
    #[serde(default)]
    pub original_price: Option<Money>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub reviews: u32,
    /// Position in the "Featured" ordering; lower comes first.
    #[serde(default = "default_featured_rank")]
    pub featured_rank: u32,
}

const fn default_featured_rank() -> u32 {
    u32::MAX
}

impl Product {
    /// Percentage saved against the original price, rounded to a whole percent.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u8> {
        let original = self.original_price?.amount();
        if original <= self.price.amount() || original.is_zero() {
            return None;
        }
        let saved = (original - self.price.amount()) / original * Decimal::ONE_HUNDRED;
        saved.round().to_u8()
    }

    /// Build a cart line for this product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] when `quantity` is zero.
    pub fn to_line_item(&self, quantity: u32) -> Result<LineItem, CartError> {
        LineItem::new(
            self.id,
            self.name.clone(),
            self.spec_label.clone(),
            self.price,
            quantity,
        )
    }
}

/// Catalog sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Newest,
    Popular,
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "featured" => Ok(Self::Featured),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            "newest" => Ok(Self::Newest),
            "popular" => Ok(Self::Popular),
            other => Err(CatalogError::InvalidOption {
                kind: "sort order",
                value: other.to_owned(),
            }),
        }
    }
}

/// Product filter. Empty option sets match everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub thicknesses: BTreeSet<Thickness>,
    pub colors: BTreeSet<Color>,
    pub sizes: BTreeSet<SheetSize>,
    /// Inclusive price bounds.
    pub min_price: Money,
    pub max_price: Money,
}

impl ProductFilter {
    /// Upper bound of the default price range.
    pub const DEFAULT_MAX_PRICE: u32 = 500;

    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        (self.thicknesses.is_empty() || self.thicknesses.contains(&product.thickness))
            && (self.colors.is_empty() || self.colors.contains(&product.color))
            && (self.sizes.is_empty() || self.sizes.contains(&product.size))
            && product.price >= self.min_price
            && product.price <= self.max_price
    }

    /// Whether any option differs from the defaults.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            thicknesses: BTreeSet::new(),
            colors: BTreeSet::new(),
            sizes: BTreeSet::new(),
            min_price: Money::ZERO,
            max_price: Money::from_dollars(Self::DEFAULT_MAX_PRICE),
        }
    }
}

/// An in-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] when two products share an id.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for product in &products {
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
        }
        Ok(Self { products })
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id.
    pub fn get(&self, id: ProductId) -> Result<&Product, CatalogError> {
        self.products
            .iter()
            .find(|product| product.id == id)
            .ok_or(CatalogError::NotFound(id))
    }

    /// Products matching `filter`, in `order`.
    #[must_use]
    pub fn browse(&self, filter: &ProductFilter, order: SortOrder) -> Vec<&Product> {
        let mut matches: Vec<&Product> = self
            .products
            .iter()
            .filter(|product| filter.matches(product))
            .collect();

        match order {
            SortOrder::Featured => matches.sort_by_key(|p| (p.featured_rank, p.id)),
            SortOrder::PriceLow => matches.sort_by_key(|p| (p.price, p.id)),
            SortOrder::PriceHigh => {
                matches.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id)));
            }
            SortOrder::Newest => matches.sort_by(|a, b| b.id.cmp(&a.id)),
            SortOrder::Popular => matches.sort_by(|a, b| {
                b.reviews
                    .cmp(&a.reviews)
                    .then(b.rating.total_cmp(&a.rating))
                    .then(a.id.cmp(&b.id))
            }),
        }

        matches
    }

    /// Other products sharing a thickness or color, for "related products".
    #[must_use]
    pub fn related(&self, id: ProductId, limit: usize) -> Vec<&Product> {
        let Ok(anchor) = self.get(id) else {
            return Vec::new();
        };
        self.products
            .iter()
            .filter(|p| p.id != id && (p.thickness == anchor.thickness || p.color == anchor.color))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: u32, thickness: Thickness, color: Color, cents: i64, reviews: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("{color} Acrylic Sheet"),
            brand: "ProSheet".to_owned(),
            thickness,
            color,
            size: SheetSize::FourByEight,
            spec_label: format!("{thickness} thickness • 4'×8'"),
            price: Money::from_cents(cents),
            original_price: None,
            badge: None,
            rating: 4.0,
            reviews,
            featured_rank: id,
        }
    }

    fn sample() -> Catalog {
        Catalog::new(vec![
            product(1, Thickness::Mm2, Color::Clear, 4999, 82),
            product(2, Thickness::Mm3, Color::Frosted, 6999, 25),
            product(3, Thickness::Mm5, Color::Black, 8999, 156),
            product(4, Thickness::Mm3, Color::Blue, 7999, 67),
            product(5, Thickness::Mm5, Color::White, 12999, 92),
        ])
        .unwrap()
    }

    fn ids(products: &[&Product]) -> Vec<u32> {
        products.iter().map(|p| p.id.as_u32()).collect()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Catalog::new(vec![
            product(1, Thickness::Mm2, Color::Clear, 4999, 1),
            product(1, Thickness::Mm3, Color::Red, 7499, 1),
        ]);
        assert_eq!(result.unwrap_err(), CatalogError::DuplicateId(ProductId::new(1)));
    }

    #[test]
    fn test_browse_default_filter_featured() {
        let catalog = sample();
        let all = catalog.browse(&ProductFilter::default(), SortOrder::Featured);
        assert_eq!(ids(&all), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_filter_by_thickness_and_color() {
        let catalog = sample();
        let mut filter = ProductFilter::default();
        filter.thicknesses.insert(Thickness::Mm3);
        assert_eq!(ids(&catalog.browse(&filter, SortOrder::Featured)), vec![2, 4]);

        filter.colors.insert(Color::Blue);
        assert_eq!(ids(&catalog.browse(&filter, SortOrder::Featured)), vec![4]);
        assert!(filter.is_active());
    }

    #[test]
    fn test_filter_price_range_inclusive() {
        let catalog = sample();
        let filter = ProductFilter {
            min_price: Money::from_cents(6999),
            max_price: Money::from_cents(8999),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&catalog.browse(&filter, SortOrder::PriceLow)), vec![2, 4, 3]);
    }

    #[test]
    fn test_sort_orders() {
        let catalog = sample();
        let filter = ProductFilter::default();
        assert_eq!(ids(&catalog.browse(&filter, SortOrder::PriceHigh)), vec![5, 3, 4, 2, 1]);
        assert_eq!(ids(&catalog.browse(&filter, SortOrder::Newest)), vec![5, 4, 3, 2, 1]);
        assert_eq!(ids(&catalog.browse(&filter, SortOrder::Popular)), vec![3, 5, 1, 4, 2]);
    }

    #[test]
    fn test_discount_percent() {
        let mut sheet = product(3, Thickness::Mm5, Color::Black, 8999, 0);
        assert_eq!(sheet.discount_percent(), None);

        sheet.original_price = Some(Money::from_cents(11999));
        assert_eq!(sheet.discount_percent(), Some(25));

        sheet.original_price = Some(Money::from_cents(5000));
        assert_eq!(sheet.discount_percent(), None);
    }

    #[test]
    fn test_to_line_item() {
        let catalog = sample();
        let item = catalog.get(ProductId::new(3)).unwrap().to_line_item(2).unwrap();
        assert_eq!(item.line_total(), Money::from_cents(17998));
        assert!(catalog.get(ProductId::new(3)).unwrap().to_line_item(0).is_err());
    }

    #[test]
    fn test_get_missing() {
        assert_eq!(
            sample().get(ProductId::new(99)).unwrap_err(),
            CatalogError::NotFound(ProductId::new(99))
        );
    }

    #[test]
    fn test_related() {
        let catalog = sample();
        assert_eq!(ids(&catalog.related(ProductId::new(3), 4)), vec![5]);
        assert!(catalog.related(ProductId::new(99), 4).is_empty());
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!("3MM".parse::<Thickness>().unwrap(), Thickness::Mm3);
        assert_eq!("Frosted".parse::<Color>().unwrap(), Color::Frosted);
        assert_eq!("5x10".parse::<SheetSize>().unwrap(), SheetSize::FiveByTen);
        assert_eq!("price-high".parse::<SortOrder>().unwrap(), SortOrder::PriceHigh);
        assert!(matches!(
            "green".parse::<Color>(),
            Err(CatalogError::InvalidOption { kind: "color", .. })
        ));
    }
}
