//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! ## Pricing
//! - `STOREFRONT_TAX_RATE` - Fractional sales tax rate (default: 0.07)
//! - `STOREFRONT_FREE_SHIPPING_THRESHOLD` - Standard shipping is free above this subtotal (default: 200)
//! - `STOREFRONT_STANDARD_SHIPPING_FEE` - Standard shipping fee (default: 25)
//! - `STOREFRONT_EXPRESS_SHIPPING_FEE` - Express shipping fee (default: 35)
//!
//! ## Catalog
//! - `STOREFRONT_CATALOG_PATH` - Catalog YAML file (default: crates/storefront/content/catalog.yaml)
//!
//! ## Order processing
//! - `ORDER_PROCESSOR_LATENCY_MS` - Simulated processing latency (default: 1500)
//! - `ORDER_PROCESSOR_FAILURE_RATE` - Probability in 0..=1 that processing fails (default: 0)
//!
//! ## Error tracking
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use sheetline_core::Money;
use sheetline_core::pricing::PricingPolicy;
use thiserror::Error;

const DEFAULT_CATALOG_PATH: &str = "crates/storefront/content/catalog.yaml";
const DEFAULT_PROCESSOR_LATENCY_MS: u64 = 1500;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Tax rate and shipping fees
    pub pricing: PricingPolicy,
    /// Catalog YAML location
    pub catalog_path: PathBuf,
    /// Simulated order processor behaviour
    pub processor: ProcessorConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Simulated order processor configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorConfig {
    /// How long each order takes to process
    pub latency: Duration,
    /// Probability that processing fails
    pub failure_rate: f64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(DEFAULT_PROCESSOR_LATENCY_MS),
            failure_rate: 0.0,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable or
    /// out-of-range value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PricingPolicy::default();

        let tax_rate = parse_or("STOREFRONT_TAX_RATE", &lookup, defaults.tax_rate)?;
        if tax_rate.is_sign_negative() || tax_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_TAX_RATE".to_string(),
                format!("must be within 0..1 (got {tax_rate})"),
            ));
        }

        let pricing = PricingPolicy {
            tax_rate,
            free_shipping_threshold: parse_money(
                "STOREFRONT_FREE_SHIPPING_THRESHOLD",
                &lookup,
                defaults.free_shipping_threshold,
            )?,
            standard_fee: parse_money(
                "STOREFRONT_STANDARD_SHIPPING_FEE",
                &lookup,
                defaults.standard_fee,
            )?,
            express_fee: parse_money(
                "STOREFRONT_EXPRESS_SHIPPING_FEE",
                &lookup,
                defaults.express_fee,
            )?,
        };

        let catalog_path = PathBuf::from(
            lookup("STOREFRONT_CATALOG_PATH").unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string()),
        );

        let latency_ms = parse_or(
            "ORDER_PROCESSOR_LATENCY_MS",
            &lookup,
            DEFAULT_PROCESSOR_LATENCY_MS,
        )?;
        let failure_rate: f64 = parse_or("ORDER_PROCESSOR_FAILURE_RATE", &lookup, 0.0)?;
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(ConfigError::InvalidEnvVar(
                "ORDER_PROCESSOR_FAILURE_RATE".to_string(),
                format!("must be within 0..=1 (got {failure_rate})"),
            ));
        }

        Ok(Self {
            pricing,
            catalog_path,
            processor: ProcessorConfig {
                latency: Duration::from_millis(latency_ms),
                failure_rate,
            },
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable, falling back to `default` when unset.
fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a non-negative money amount.
fn parse_money<F>(key: &str, lookup: &F, default: Money) -> Result<Money, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let amount = parse_or(key, lookup, default)?;
    if amount.is_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("cannot be negative (got {amount})"),
        ));
    }
    Ok(amount)
}
