//! The checkout step machine.
//!
//! ```text
//! Shipping --[shipping details]--> Delivery --> Payment --[card details]--> Review --submit-->
//!    ^                                |            |                          |
//!    +-------------- back ------------+---- back --+---------- back ----------+
//! ```
//!
//! Forward edges live in [`TRANSITIONS`]; an edge may carry a [`Guard`] that
//! must produce no field errors before the step changes. Going back is always
//! allowed.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::form::{CheckoutForm, FieldErrors};
use super::validate::{validate_payment, validate_shipping};

/// A checkout screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Delivery,
    Payment,
    Review,
}

impl CheckoutStep {
    pub const ALL: [Self; 4] = [Self::Shipping, Self::Delivery, Self::Payment, Self::Review];

    /// One-based position shown in the progress indicator.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Delivery => 2,
            Self::Payment => 3,
            Self::Review => 4,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Shipping => "Shipping",
            Self::Delivery => "Delivery",
            Self::Payment => "Payment",
            Self::Review => "Review",
        }
    }

    #[must_use]
    pub const fn previous(&self) -> Option<Self> {
        match self {
            Self::Shipping => None,
            Self::Delivery => Some(Self::Shipping),
            Self::Payment => Some(Self::Delivery),
            Self::Review => Some(Self::Payment),
        }
    }

    /// Whether the progress indicator shows this step as done while `current`
    /// is active.
    #[must_use]
    pub fn is_completed(&self, current: Self) -> bool {
        *self < current
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validation gate on a forward edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Contact and address fields.
    ShippingDetails,
    /// Card fields, only when paying by card.
    PaymentDetails,
}

impl Guard {
    /// Evaluate the guard against the form.
    #[must_use]
    pub fn check(&self, form: &CheckoutForm) -> FieldErrors {
        match self {
            Self::ShippingDetails => validate_shipping(form),
            Self::PaymentDetails => validate_payment(form),
        }
    }
}

/// A forward edge of the step machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CheckoutStep,
    pub to: CheckoutStep,
    pub guard: Option<Guard>,
}

/// Every forward edge. Review has no outgoing edge; it ends in submission.
pub const TRANSITIONS: [Transition; 3] = [
    Transition {
        from: CheckoutStep::Shipping,
        to: CheckoutStep::Delivery,
        guard: Some(Guard::ShippingDetails),
    },
    Transition {
        from: CheckoutStep::Delivery,
        to: CheckoutStep::Payment,
        guard: None,
    },
    Transition {
        from: CheckoutStep::Payment,
        to: CheckoutStep::Review,
        guard: Some(Guard::PaymentDetails),
    },
];

/// Find the forward edge leaving `step`.
#[must_use]
pub fn transition_from(step: CheckoutStep) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|transition| transition.from == step)
}

/// Run every guard on the path from Shipping up to (not including) `step`.
///
/// Submission uses this to confirm that nothing edited since a guard last
/// passed has made an earlier step invalid.
#[must_use]
pub fn check_path_to(step: CheckoutStep, form: &CheckoutForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for transition in TRANSITIONS.iter().filter(|t| t.to <= step) {
        if let Some(guard) = transition.guard {
            errors.extend(guard.check(form));
        }
    }
    errors
}

/// Result of asking the machine to move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The step changed.
    Moved {
        from: CheckoutStep,
        to: CheckoutStep,
    },
    /// A guard failed; the step is unchanged.
    Rejected(FieldErrors),
    /// Already on Review; the only way forward is submitting the order.
    AtReview,
}

/// Current checkout step plus the errors from the last rejected advance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    errors: FieldErrors,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Errors for the view layer to show inline.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Try to move to the next step.
    pub fn advance(&mut self, form: &CheckoutForm) -> Advance {
        let Some(transition) = transition_from(self.step) else {
            return Advance::AtReview;
        };

        if let Some(guard) = transition.guard {
            let errors = guard.check(form);
            if !errors.is_empty() {
                self.errors = errors.clone();
                return Advance::Rejected(errors);
            }
        }

        self.errors.clear();
        self.step = transition.to;
        Advance::Moved {
            from: transition.from,
            to: transition.to,
        }
    }

    /// Move to the previous step. Always allowed; a no-op on Shipping.
    pub fn back(&mut self) -> CheckoutStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Forget an error once its field is edited.
    pub fn clear_error(&mut self, field: super::form::Field) -> bool {
        self.errors.clear_field(field)
    }

    /// Replace the visible errors, e.g. when submission re-validation fails.
    pub fn show_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }
}
