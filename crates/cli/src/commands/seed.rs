//! Seed the catalog from a YAML file.
//!
//! The file holds a `products` list in the API's product shape:
//!
//! ```yaml
//! products:
//!   - id: psalter-facsimile
//!     name: { en: Psalter facsimile, am: የዳዊት መዝሙር ቅጂ }
//!     price: "450"
//!     category: facsimiles
//!     stock: 12
//! ```
//!
//! Products are upserted by id, so the command can be re-run after edits.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use brana_storefront::db::{PgStore, ProductStore, RepositoryError};
use brana_storefront::models::Product;

use super::{ConnectError, connect};

/// Errors from seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<Product>,
}

/// Parse and check a catalog document.
fn parse_catalog(yaml: &str) -> Result<Vec<Product>, SeedError> {
    let catalog: CatalogFile = serde_yaml::from_str(yaml)?;

    let mut seen = HashSet::new();
    for product in &catalog.products {
        if !seen.insert(product.id.as_str()) {
            return Err(SeedError::Invalid(format!("duplicate product id: {}", product.id)));
        }
        if product.name.en.trim().is_empty() {
            return Err(SeedError::Invalid(format!("product {} has no name", product.id)));
        }
        if product.price.is_sign_negative() {
            return Err(SeedError::Invalid(format!(
                "product {} has a negative price",
                product.id
            )));
        }
    }

    Ok(catalog.products)
}

/// Upsert every product in `file_path`.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed, or a database write fails.
pub async fn products(file_path: &str) -> Result<usize, SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    tracing::info!(path = %file_path, "Loading catalog from file");
    let products = parse_catalog(&tokio::fs::read_to_string(path).await?)?;

    let store = PgStore::new(connect().await?);
    for product in &products {
        store.upsert(product).await?;
        tracing::debug!(id = %product.id, "Upserted product");
    }

    tracing::info!(count = products.len(), "Catalog seeded");
    Ok(products.len())
}
