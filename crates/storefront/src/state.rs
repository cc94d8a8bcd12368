//! Application state shared across handlers.

use std::sync::Arc;

use moka::future::Cache;
use tokio::sync::Mutex;
use vendorcart_core::{CartStore, OwnerRef, UserId, VendorId};

use crate::catalog::{Catalog, CatalogError, StaticCatalog};
use crate::config::{ConfigError, StorefrontConfig};
use crate::middleware::CustomerResolver;

/// A customer's cart at one vendor. Handlers lock it for one mutation.
pub type CartHandle = Arc<Mutex<CartStore>>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the customer resolver and the carts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<dyn Catalog>,
    customers: Arc<dyn CustomerResolver>,
    carts: Cache<(UserId, VendorId), CartHandle>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The cart cache has no capacity bound and no expiry: a customer's cart
    /// lives until it is cleared.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Arc<dyn Catalog>,
        customers: Arc<dyn CustomerResolver>,
    ) -> Self {
        let carts = Cache::builder().build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                customers,
                carts,
            }),
        }
    }

    /// Create state from configuration: the catalog file (if any) and the
    /// configured customer tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, CatalogError> {
        let catalog = match &config.catalog_path {
            Some(path) => StaticCatalog::load(path)?,
            None => StaticCatalog::default(),
        };
        tracing::info!(products = catalog.len(), "Catalog loaded");
        if config.customer_tokens.is_empty() {
            tracing::warn!("No customer tokens configured, every cart request will be rejected");
        }

        let customers = Arc::new(config.customer_tokens.clone());
        Ok(Self::new(config, Arc::new(catalog), customers))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.inner.catalog.as_ref()
    }

    /// Get the customer resolver.
    #[must_use]
    pub fn customers(&self) -> &dyn CustomerResolver {
        self.inner.customers.as_ref()
    }

    /// Cart of `user_id` at `vendor_id`, created empty on first use.
    ///
    /// # Errors
    ///
    /// Returns `TaxRateUnset` if the vendor has no configured tax rate.
    pub async fn cart(&self, user_id: UserId, vendor_id: VendorId) -> Result<CartHandle, ConfigError> {
        let calculator = self.inner.config.tax_rates.calculator(vendor_id)?;
        Ok(self
            .inner
            .carts
            .get_with((user_id, vendor_id), async move {
                Arc::new(Mutex::new(CartStore::new(
                    OwnerRef::User(user_id),
                    vendor_id,
                    calculator,
                )))
            })
            .await)
    }
}
