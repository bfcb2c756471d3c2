//! Sheetline storefront library.
//!
//! Checkout orchestration on top of `sheetline-core`: the checkout
//! controller, order processing, session-scoped order storage, the
//! confirmation view and configuration.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod processor;
pub mod session;

pub use checkout::{CheckoutController, Navigation, SubmitOutcome, Toast, ToastVariant};
pub use config::{ConfigError, ProcessorConfig, StorefrontConfig};
pub use confirmation::{Confirmation, ConfirmationView, load_confirmation};
pub use error::SubmitError;
pub use processor::{FailureMode, OrderProcessor, OrderReceipt, ProcessorError, SimulatedProcessor};
pub use session::{OrderStore, StoreError};
