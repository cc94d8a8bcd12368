//! Product catalog the cart API prices lines from.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use vendorcart_core::{LineKey, ProductRef, ValidationError, VendorId};

/// Errors loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid catalog entry {key}: {source}")]
    Invalid {
        key: LineKey,
        #[source]
        source: ValidationError,
    },
}

/// Source of product names and prices.
pub trait Catalog: Send + Sync {
    /// Product sold by `vendor_id` under `key`, if any.
    fn product(&self, vendor_id: VendorId, key: &LineKey) -> Option<ProductRef>;
}

/// Fixed in-memory catalog, typically loaded from a JSON array of products.
///
/// A variant without its own entry inherits the entry for the bare product.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: HashMap<(VendorId, LineKey), ProductRef>,
}

impl StaticCatalog {
    /// Build from products, validating each.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for the first product a cart line could not hold.
    pub fn new(products: impl IntoIterator<Item = ProductRef>) -> Result<Self, CatalogError> {
        let mut map = HashMap::new();
        for product in products {
            let key = product.key();
            product
                .validate()
                .map_err(|source| CatalogError::Invalid {
                    key: key.clone(),
                    source,
                })?;
            map.insert((product.vendor_id, key), product);
        }
        Ok(Self { products: map })
    }

    /// Parse a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a product is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<ProductRef> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Load a JSON catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns `true` if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn product(&self, vendor_id: VendorId, key: &LineKey) -> Option<ProductRef> {
        if let Some(product) = self.products.get(&(vendor_id, key.clone())) {
            return Some(product.clone());
        }
        let base = LineKey::new(key.product_id, None);
        self.products
            .get(&(vendor_id, base))
            .map(|product| ProductRef {
                variant: key.variant.clone(),
                ..product.clone()
            })
    }
}
