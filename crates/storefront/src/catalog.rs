//! Catalog loading.
//!
//! The product catalog lives in a YAML file (`content/catalog.yaml`) and is
//! loaded once at startup.

use std::path::Path;

use sheetline_core::catalog::{Catalog, CatalogError, Product};
use thiserror::Error;

/// Errors that can occur when loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Load the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a list of products,
/// or contains duplicate product ids.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogLoadError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CatalogLoadError::Io(format!("{}: {e}", path.display())))?;
    let catalog = parse_catalog(&content)?;
    tracing::info!(products = catalog.len(), path = %path.display(), "Loaded catalog");
    Ok(catalog)
}

/// Parse a catalog from YAML text.
///
/// # Errors
///
/// Returns an error if the text is not a list of products or contains
/// duplicate product ids.
pub fn parse_catalog(yaml: &str) -> Result<Catalog, CatalogLoadError> {
    let products: Vec<Product> =
        serde_yaml::from_str(yaml).map_err(|e| CatalogLoadError::Parse(e.to_string()))?;
    Ok(Catalog::new(products)?)
}
