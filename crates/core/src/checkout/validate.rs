//! Pure field validators for the checkout steps.
//!
//! Each validator reads the form and returns the full set of problems it
//! found. They have no side effects, so the same form always produces the
//! same [`FieldErrors`].

use std::sync::LazyLock;

use regex::Regex;

use super::form::{CheckoutForm, Field, FieldErrors};
use crate::types::Email;

pub const REQUIRED: &str = "This field is required";
pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const INVALID_PHONE: &str = "Please enter a valid 10-digit phone number";
pub const INVALID_ZIP: &str = "Please enter a valid ZIP code";
pub const CARD_NUMBER_REQUIRED: &str = "Card number is required";
pub const INVALID_CARD_NUMBER: &str = "Please enter a valid 16-digit card number";
pub const EXPIRY_REQUIRED: &str = "Expiry date is required";
pub const INVALID_EXPIRY: &str = "Please use MM/YY format";
pub const CVC_REQUIRED: &str = "CVC is required";
pub const INVALID_CVC: &str = "Please enter a valid CVC";
pub const NAME_ON_CARD_REQUIRED: &str = "Name on card is required";

/// Fields that must be filled in before leaving the shipping step.
pub const SHIPPING_REQUIRED: [Field; 7] = [
    Field::FirstName,
    Field::LastName,
    Field::Email,
    Field::Phone,
    Field::Address,
    Field::City,
    Field::Zip,
];

const PHONE_DIGITS: usize = 10;

/// 5-digit ZIP or ZIP+4.
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("Invalid regex"));

static CARD_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{16}$").expect("Invalid regex"));

static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/[0-9]{2}$").expect("Invalid regex"));

static CVC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("Invalid regex"));

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Check the contact and address fields.
#[must_use]
pub fn validate_shipping(form: &CheckoutForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for field in SHIPPING_REQUIRED {
        if is_blank(form.value(field)) {
            errors.insert(field, REQUIRED);
        }
    }

    if !is_blank(&form.email) && Email::parse(form.email.trim()).is_err() {
        errors.insert(Field::Email, INVALID_EMAIL);
    }

    if !is_blank(&form.phone) && !is_valid_phone(&form.phone) {
        errors.insert(Field::Phone, INVALID_PHONE);
    }

    if !is_blank(&form.zip) && !ZIP_RE.is_match(form.zip.trim()) {
        errors.insert(Field::Zip, INVALID_ZIP);
    }

    errors
}

/// Check the card fields. Non-card payment methods have nothing to check.
#[must_use]
pub fn validate_payment(form: &CheckoutForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !form.payment_method.requires_card() {
        return errors;
    }

    let number = form.value(Field::CardNumber);
    if is_blank(number) {
        errors.insert(Field::CardNumber, CARD_NUMBER_REQUIRED);
    } else if !CARD_NUMBER_RE.is_match(&strip_whitespace(number)) {
        errors.insert(Field::CardNumber, INVALID_CARD_NUMBER);
    }

    let expiry = form.card_expiry.trim();
    if expiry.is_empty() {
        errors.insert(Field::CardExpiry, EXPIRY_REQUIRED);
    } else if !EXPIRY_RE.is_match(expiry) {
        errors.insert(Field::CardExpiry, INVALID_EXPIRY);
    }

    let cvc = form.value(Field::CardCvc).trim();
    if cvc.is_empty() {
        errors.insert(Field::CardCvc, CVC_REQUIRED);
    } else if !CVC_RE.is_match(cvc) {
        errors.insert(Field::CardCvc, INVALID_CVC);
    }

    if is_blank(&form.name_on_card) {
        errors.insert(Field::NameOnCard, NAME_ON_CARD_REQUIRED);
    }

    errors
}

/// Exactly ten digits once punctuation and spaces are dropped.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() == PHONE_DIGITS
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checkout::form::PaymentMethod;

    fn shipping_form() -> CheckoutForm {
        let mut form = CheckoutForm::default();
        form.set(Field::FirstName, "Jane");
        form.set(Field::LastName, "Doe");
        form.set(Field::Email, "jane.doe@example.com");
        form.set(Field::Phone, "(555) 123-4567");
        form.set(Field::Address, "123 Main St");
        form.set(Field::City, "New York");
        form.set(Field::Zip, "10001");
        form
    }

    fn card_form() -> CheckoutForm {
        let mut form = shipping_form();
        form.set(Field::CardNumber, "1234 5678 9012 3456");
        form.set(Field::CardExpiry, "09/28");
        form.set(Field::CardCvc, "123");
        form.set(Field::NameOnCard, "Jane Doe");
        form
    }

    #[test]
    fn test_valid_shipping_passes() {
        assert!(validate_shipping(&shipping_form()).is_empty());
    }

    #[test]
    fn test_empty_form_requires_every_shipping_field() {
        let errors = validate_shipping(&CheckoutForm::default());
        assert_eq!(errors.len(), SHIPPING_REQUIRED.len());
        for field in SHIPPING_REQUIRED {
            assert_eq!(errors.get(field), Some(REQUIRED));
        }
        assert!(!errors.contains(Field::Address2));
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let mut form = shipping_form();
        form.set(Field::City, "   ");
        assert_eq!(validate_shipping(&form).get(Field::City), Some(REQUIRED));
    }

    #[test]
    fn test_email_validation() {
        let mut form = shipping_form();
        form.set(Field::Email, "not-an-email");
        assert_eq!(validate_shipping(&form).get(Field::Email), Some(INVALID_EMAIL));

        form.set(Field::Email, "a@b.com");
        assert!(!validate_shipping(&form).contains(Field::Email));
    }

    #[test]
    fn test_phone_validation() {
        let mut form = shipping_form();
        for valid in ["5551234567", "555-123-4567", "(555) 123 4567"] {
            form.set(Field::Phone, valid);
            assert!(!validate_shipping(&form).contains(Field::Phone), "{valid}");
        }
        for invalid in ["555-1234", "+1 (555) 123-4567", "phone"] {
            form.set(Field::Phone, invalid);
            assert_eq!(validate_shipping(&form).get(Field::Phone), Some(INVALID_PHONE), "{invalid}");
        }
    }

    #[test]
    fn test_zip_validation() {
        let mut form = shipping_form();
        for valid in ["10001", "10001-1234"] {
            form.set(Field::Zip, valid);
            assert!(!validate_shipping(&form).contains(Field::Zip), "{valid}");
        }
        for invalid in ["1000", "10001-12", "ABCDE", "100011234"] {
            form.set(Field::Zip, invalid);
            assert_eq!(validate_shipping(&form).get(Field::Zip), Some(INVALID_ZIP), "{invalid}");
        }
    }

    #[test]
    fn test_valid_card_passes() {
        assert!(validate_payment(&card_form()).is_empty());
    }

    #[test]
    fn test_card_number_validation() {
        let mut form = card_form();
        form.set(Field::CardNumber, "1234");
        assert_eq!(validate_payment(&form).get(Field::CardNumber), Some(INVALID_CARD_NUMBER));

        form.set(Field::CardNumber, "1234-5678-9012-3456");
        assert_eq!(validate_payment(&form).get(Field::CardNumber), Some(INVALID_CARD_NUMBER));

        form.set(Field::CardNumber, "1234567890123456");
        assert!(validate_payment(&form).is_empty());
    }

    #[test]
    fn test_expiry_validation() {
        let mut form = card_form();
        for invalid in ["13/25", "00/25", "9/25", "09/2025", "0925"] {
            form.set(Field::CardExpiry, invalid);
            assert_eq!(
                validate_payment(&form).get(Field::CardExpiry),
                Some(INVALID_EXPIRY),
                "{invalid}"
            );
        }
        form.set(Field::CardExpiry, "12/30");
        assert!(validate_payment(&form).is_empty());
    }

    #[test]
    fn test_cvc_validation() {
        let mut form = card_form();
        form.set(Field::CardCvc, "1234");
        assert!(validate_payment(&form).is_empty());
        form.set(Field::CardCvc, "12");
        assert_eq!(validate_payment(&form).get(Field::CardCvc), Some(INVALID_CVC));
        form.set(Field::CardCvc, "12a");
        assert_eq!(validate_payment(&form).get(Field::CardCvc), Some(INVALID_CVC));
    }

    #[test]
    fn test_missing_card_fields_report_required_messages() {
        let mut form = shipping_form();
        form.payment_method = PaymentMethod::Card;
        let errors = validate_payment(&form);
        assert_eq!(errors.get(Field::CardNumber), Some(CARD_NUMBER_REQUIRED));
        assert_eq!(errors.get(Field::CardExpiry), Some(EXPIRY_REQUIRED));
        assert_eq!(errors.get(Field::CardCvc), Some(CVC_REQUIRED));
        assert_eq!(errors.get(Field::NameOnCard), Some(NAME_ON_CARD_REQUIRED));
    }

    #[test]
    fn test_paypal_skips_card_checks() {
        let mut form = shipping_form();
        form.payment_method = PaymentMethod::PayPal;
        assert!(validate_payment(&form).is_empty());
    }

    #[test]
    fn test_validators_are_deterministic() {
        let mut form = card_form();
        form.set(Field::Email, "broken");
        form.set(Field::CardExpiry, "99/99");
        assert_eq!(validate_shipping(&form), validate_shipping(&form));
        assert_eq!(validate_payment(&form), validate_payment(&form));
    }
}
