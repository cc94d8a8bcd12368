//! Local guest cart persistence.
//!
//! [`LocalCartStorage`] decodes and validates snapshots stored through a
//! [`CartRepository`]. Every failure is recovered here: a snapshot that cannot
//! be read becomes an empty cart and a write that fails leaves the in-memory
//! cart authoritative. Both are logged.

mod file;
mod memory;

pub use file::FileCartRepository;
pub use memory::MemoryCartRepository;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vendorcart_core::{
    Cart, CartLine, CartRepository, CartScope, Money, PersistenceError, PricingCalculator,
};

/// Stored payload: `{items, subtotal, tax, total}`.
///
/// Owner and vendor are implied by the scope the payload is stored under.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredCart {
    items: Vec<CartLine>,
    subtotal: Money,
    tax: Money,
    total: Money,
}

impl From<&Cart> for StoredCart {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines().to_vec(),
            subtotal: cart.subtotal(),
            tax: cart.tax(),
            total: cart.total(),
        }
    }
}

/// Loads and saves guest cart snapshots through a repository.
#[derive(Debug, Clone)]
pub struct LocalCartStorage<R> {
    repository: R,
}

impl<R: CartRepository> LocalCartStorage<R> {
    /// Storage backed by `repository`.
    pub const fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Underlying repository.
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Load the cart stored for `scope`.
    ///
    /// Returns an empty cart if nothing is stored or the snapshot is
    /// unreadable. Stored totals are ignored; totals are recomputed from the
    /// items with `calculator`.
    pub fn load(&self, scope: &CartScope, calculator: &PricingCalculator) -> Cart {
        match self.try_load(scope, calculator) {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::empty(scope.owner_ref, scope.vendor_id, calculator),
            Err(e) => {
                warn!(scope = %scope, error = %e, "Discarding unreadable local cart");
                Cart::empty(scope.owner_ref, scope.vendor_id, calculator)
            }
        }
    }

    /// Load the cart stored for `scope`, reporting why it could not be read.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails, the payload is malformed, or
    /// its items violate cart invariants.
    pub fn try_load(
        &self,
        scope: &CartScope,
        calculator: &PricingCalculator,
    ) -> Result<Option<Cart>, PersistenceError> {
        let Some(payload) = self.repository.load(scope)? else {
            return Ok(None);
        };
        let stored: StoredCart = serde_json::from_str(&payload)?;
        let cart = Cart::from_lines(scope.owner_ref, scope.vendor_id, stored.items, calculator)?;

        let drifted = stored.subtotal != cart.subtotal()
            || stored.tax != cart.tax()
            || stored.total != cart.total();
        if drifted {
            debug!(
                scope = %scope,
                stored_total = %stored.total,
                total = %cart.total(),
                "Stored totals differ from recomputed totals"
            );
        }
        Ok(Some(cart))
    }

    /// Save `cart` under its own scope. Failures are logged, not returned.
    pub fn save(&self, cart: &Cart) {
        let scope = CartScope::new(cart.vendor_id(), cart.owner_ref());
        let result = serde_json::to_string(&StoredCart::from(cart))
            .map_err(PersistenceError::from)
            .and_then(|payload| self.repository.store(&scope, &payload));
        if let Err(e) = result {
            warn!(scope = %scope, error = %e, "Failed to save local cart");
        }
    }

    /// Delete the snapshot for `scope`. Failures are logged, not returned.
    pub fn clear(&self, scope: &CartScope) {
        if let Err(e) = self.repository.delete(scope) {
            warn!(scope = %scope, error = %e, "Failed to clear local cart");
        }
    }
}
