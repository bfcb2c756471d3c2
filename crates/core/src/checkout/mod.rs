//! Checkout: typed form state, field validators and the step machine.

pub mod form;
pub mod step;
pub mod validate;

pub use form::{CheckoutForm, Country, Field, FieldErrors, FormError, PaymentMethod};
pub use step::{Advance, CheckoutFlow, CheckoutStep, Guard, Transition, TRANSITIONS};
pub use validate::{validate_payment, validate_shipping};
