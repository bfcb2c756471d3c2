//! Sheetline Core - storefront domain library.
//!
//! This crate holds the state-bearing logic of the Sheetline acrylic sheet
//! storefront, used by:
//! - `storefront` - Checkout controller, order processing and session storage
//! - `cli` - Command-line catalog browsing, quoting and scripted checkout
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no async, no
//! clocks other than values passed in. This keeps every rule here
//! deterministic and unit-testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money and emails
//! - [`catalog`] - Acrylic sheet products, filtering and sorting
//! - [`cart`] - Cart line items and quantity rules
//! - [`pricing`] - Subtotal, shipping, tax and total
//! - [`checkout`] - Checkout form, field validators and the step machine
//! - [`order`] - Immutable order snapshot built at submission time

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod pricing;
pub mod types;

pub use types::*;
