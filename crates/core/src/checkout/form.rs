//! Checkout form state.
//!
//! Every input is addressed by [`Field`], so the view layer cannot refer to
//! a field that does not exist. Card number and CVC are held as secrets and
//! never appear in `Debug` output.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A text input on the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    Address2,
    City,
    State,
    Zip,
    Notes,
    CardNumber,
    CardExpiry,
    CardCvc,
    NameOnCard,
}

impl Field {
    pub const ALL: [Self; 14] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::Address2,
        Self::City,
        Self::State,
        Self::Zip,
        Self::Notes,
        Self::CardNumber,
        Self::CardExpiry,
        Self::CardCvc,
        Self::NameOnCard,
    ];

    /// Input id used by the view layer.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Address2 => "address2",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::Notes => "notes",
            Self::CardNumber => "cardNumber",
            Self::CardExpiry => "cardExpiry",
            Self::CardCvc => "cardCvc",
            Self::NameOnCard => "nameOnCard",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Address => "Street Address",
            Self::Address2 => "Apartment, suite, etc.",
            Self::City => "City",
            Self::State => "State",
            Self::Zip => "ZIP Code",
            Self::Notes => "Order Notes",
            Self::CardNumber => "Card Number",
            Self::CardExpiry => "Expiry Date",
            Self::CardCvc => "CVC",
            Self::NameOnCard => "Name on Card",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing unknown form options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown form field: {0}")]
    UnknownField(String),
    #[error("unknown country: {0} (expected US, CA or MX)")]
    UnknownCountry(String),
    #[error("unknown payment method: {0} (expected credit-card or paypal)")]
    UnknownPaymentMethod(String),
}

impl FromStr for Field {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.id() == wanted)
            .ok_or_else(|| FormError::UnknownField(wanted.to_owned()))
    }
}

/// Shipping destination country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Country {
    #[default]
    US,
    CA,
    MX,
}

impl Country {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::US => "United States",
            Self::CA => "Canada",
            Self::MX => "Mexico",
        }
    }
}

impl FromStr for Country {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Self::US),
            "CA" => Ok(Self::CA),
            "MX" => Ok(Self::MX),
            other => Err(FormError::UnknownCountry(other.to_owned())),
        }
    }
}

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "credit-card")]
    Card,
    #[serde(rename = "paypal")]
    PayPal,
}

impl PaymentMethod {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Card => "Credit Card",
            Self::PayPal => "PayPal",
        }
    }

    /// Whether the card inputs apply.
    #[must_use]
    pub const fn requires_card(&self) -> bool {
        matches!(self, Self::Card)
    }
}

impl FromStr for PaymentMethod {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit-card" | "card" => Ok(Self::Card),
            "paypal" => Ok(Self::PayPal),
            other => Err(FormError::UnknownPaymentMethod(other.to_owned())),
        }
    }
}

/// Everything the shopper types during checkout.
#[derive(Clone)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: Country,
    pub notes: String,
    pub payment_method: PaymentMethod,
    pub card_number: SecretString,
    pub card_expiry: String,
    pub card_cvc: SecretString,
    pub name_on_card: String,
}

impl CheckoutForm {
    /// Replace the value of a text field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::FirstName => self.first_name = value,
            Field::LastName => self.last_name = value,
            Field::Email => self.email = value,
            Field::Phone => self.phone = value,
            Field::Address => self.address = value,
            Field::Address2 => self.address2 = value,
            Field::City => self.city = value,
            Field::State => self.state = value,
            Field::Zip => self.zip = value,
            Field::Notes => self.notes = value,
            Field::CardNumber => self.card_number = SecretString::from(value),
            Field::CardExpiry => self.card_expiry = value,
            Field::CardCvc => self.card_cvc = SecretString::from(value),
            Field::NameOnCard => self.name_on_card = value,
        }
    }

    /// Current value of a text field, including card secrets.
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Address => &self.address,
            Field::Address2 => &self.address2,
            Field::City => &self.city,
            Field::State => &self.state,
            Field::Zip => &self.zip,
            Field::Notes => &self.notes,
            Field::CardNumber => self.card_number.expose_secret(),
            Field::CardExpiry => &self.card_expiry,
            Field::CardCvc => self.card_cvc.expose_secret(),
            Field::NameOnCard => &self.name_on_card,
        }
    }

    /// Last four digits of the card number, if it has at least four digits.
    #[must_use]
    pub fn card_last_four(&self) -> Option<String> {
        let digits: Vec<char> = self
            .card_number
            .expose_secret()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let start = digits.len().checked_sub(4)?;
        digits.get(start..).map(|tail| tail.iter().collect())
    }
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            address2: String::new(),
            city: String::new(),
            state: "NY".to_owned(),
            zip: String::new(),
            country: Country::default(),
            notes: String::new(),
            payment_method: PaymentMethod::default(),
            card_number: SecretString::from(""),
            card_expiry: String::new(),
            card_cvc: SecretString::from(""),
            name_on_card: String::new(),
        }
    }
}

impl fmt::Debug for CheckoutForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("address", &self.address)
            .field("address2", &self.address2)
            .field("city", &self.city)
            .field("state", &self.state)
            .field("zip", &self.zip)
            .field("country", &self.country)
            .field("notes", &self.notes)
            .field("payment_method", &self.payment_method)
            .field("card_number", &"[REDACTED]")
            .field("card_expiry", &self.card_expiry)
            .field("card_cvc", &"[REDACTED]")
            .field("name_on_card", &self.name_on_card)
            .finish()
    }
}

/// Validation messages keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record an error, replacing any earlier message for the field.
    pub fn insert(&mut self, field: Field, message: &'static str) {
        self.0.insert(field, message);
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Drop the error for a field once the shopper edits it.
    pub fn clear_field(&mut self, field: Field) -> bool {
        self.0.remove(&field).is_some()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    /// Fold another set of errors into this one.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let form = CheckoutForm::default();
        assert_eq!(form.state, "NY");
        assert_eq!(form.country, Country::US);
        assert_eq!(form.payment_method, PaymentMethod::Card);
        assert_eq!(form.value(Field::CardNumber), "");
    }

    #[test]
    fn test_set_and_value_cover_every_field() {
        let mut form = CheckoutForm::default();
        for field in Field::ALL {
            form.set(field, format!("value-{}", field.id()));
        }
        for field in Field::ALL {
            assert_eq!(form.value(field), format!("value-{}", field.id()));
        }
    }

    #[test]
    fn test_debug_redacts_card_secrets() {
        let mut form = CheckoutForm::default();
        form.set(Field::CardNumber, "4242 4242 4242 4242");
        form.set(Field::CardCvc, "987");
        form.set(Field::NameOnCard, "Jane Doe");

        let debug_output = format!("{form:?}");
        assert!(debug_output.contains("Jane Doe"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("4242"));
        assert!(!debug_output.contains("987"));
    }

    #[test]
    fn test_card_last_four() {
        let mut form = CheckoutForm::default();
        assert_eq!(form.card_last_four(), None);

        form.set(Field::CardNumber, "1234 5678 9012 3456");
        assert_eq!(form.card_last_four().as_deref(), Some("3456"));

        form.set(Field::CardNumber, "12");
        assert_eq!(form.card_last_four(), None);
    }

    #[test]
    fn test_field_ids_roundtrip() {
        for field in Field::ALL {
            assert_eq!(field.id().parse::<Field>().unwrap(), field);
        }
        assert!("cardPin".parse::<Field>().is_err());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("credit-card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("PayPal".parse::<PaymentMethod>().unwrap(), PaymentMethod::PayPal);
        assert!("cash".parse::<PaymentMethod>().is_err());
        assert_eq!("mx".parse::<Country>().unwrap(), Country::MX);
    }

    #[test]
    fn test_country_name() {
        assert_eq!(Country::default().name(), "United States");
        assert_eq!("ca".parse::<Country>().unwrap().name(), "Canada");
    }

    #[test]
    fn test_field_errors() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::Email, "This field is required");
        errors.insert(Field::Email, "Please enter a valid email address");
        errors.insert(Field::Zip, "Please enter a valid ZIP code");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Email), Some("Please enter a valid email address"));
        assert!(errors.clear_field(Field::Zip));
        assert!(!errors.clear_field(Field::Zip));

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"email":"Please enter a valid email address"}"#);
        assert_eq!(errors.to_string(), "email: Please enter a valid email address");
    }
}
