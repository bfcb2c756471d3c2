//! Sheetline CLI - catalog browsing, cart quotes and scripted checkout.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog, cheapest first, 3mm sheets only
//! sl-cli catalog --thickness 3mm --sort price-low
//!
//! # Price a cart of two 5mm black sheets and one frosted sheet with express shipping
//! sl-cli quote 3:2 2:1 --shipping express
//!
//! # Run a checkout end to end from a YAML script
//! sl-cli checkout demos/checkout.yaml
//! ```
//!
//! # Commands
//!
//! - `catalog` - Browse, filter and sort the product catalog
//! - `quote` - Show the order summary for a cart
//! - `checkout` - Drive a checkout from shipping details to confirmation

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use sheetline_core::catalog::{Color, SheetSize, SortOrder, Thickness};
use sheetline_core::pricing::ShippingMethod;
use sheetline_storefront::StorefrontConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "sl-cli")]
#[command(author, version, about = "Sheetline storefront tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Catalog {
        /// Only show these thicknesses (e.g. 3mm)
        #[arg(long, value_delimiter = ',')]
        thickness: Vec<Thickness>,

        /// Only show these colors (e.g. clear,frosted)
        #[arg(long, value_delimiter = ',')]
        color: Vec<Color>,

        /// Only show these sizes (4x8, 5x10, custom)
        #[arg(long, value_delimiter = ',')]
        size: Vec<SheetSize>,

        /// Minimum price in whole dollars
        #[arg(long, default_value_t = 0)]
        min_price: u32,

        /// Maximum price in whole dollars
        #[arg(long, default_value_t = 500)]
        max_price: u32,

        /// Sort order (featured, price-low, price-high, newest, popular)
        #[arg(long, default_value = "featured")]
        sort: SortOrder,
    },
    /// Show the order summary for a cart
    Quote {
        /// Cart lines as `PRODUCT_ID:QUANTITY`
        #[arg(required = true)]
        items: Vec<String>,

        /// Shipping method (standard, express)
        #[arg(short, long, default_value = "standard")]
        shipping: ShippingMethod,
    },
    /// Run a scripted checkout
    Checkout {
        /// YAML checkout script
        file: PathBuf,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sheetline_storefront=info,sheetline_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Catalog {
            thickness,
            color,
            size,
            min_price,
            max_price,
            sort,
        } => {
            let filter = commands::catalog::filter(thickness, color, size, min_price, max_price);
            commands::catalog::list(config, &filter, sort)?;
        }
        Commands::Quote { items, shipping } => {
            commands::catalog::quote(config, &items, shipping)?;
        }
        Commands::Checkout { file } => {
            commands::checkout::run(config, &file).await?;
        }
    }
    Ok(())
}
