//! Wire form of a cart as exchanged with the server API.

use serde::{Deserialize, Serialize};

use super::{Cart, CartLine};
use crate::error::ValidationError;
use crate::pricing::PricingCalculator;
use crate::types::{Money, OwnerRef, VendorId};

/// A full cart document: `{ownerRef, vendorId, items, subtotal, tax, total}`.
///
/// Decoding only checks the shape. [`CartDocument::into_cart`] applies cart
/// invariants and recomputes the totals from `items`; the reported totals are
/// kept for comparison but never copied into the [`Cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CartDocument {
    /// Session identity the cart belongs to.
    pub owner_ref: OwnerRef,
    /// Vendor the cart belongs to.
    pub vendor_id: VendorId,
    /// Lines in order.
    pub items: Vec<CartLine>,
    /// Reported subtotal.
    pub subtotal: Money,
    /// Reported tax.
    pub tax: Money,
    /// Reported total.
    pub total: Money,
}

impl CartDocument {
    /// Validate and reprice into a [`Cart`].
    ///
    /// # Errors
    ///
    /// Returns a validation error if the items violate cart invariants.
    pub fn into_cart(self, calculator: &PricingCalculator) -> Result<Cart, ValidationError> {
        Cart::from_lines(self.owner_ref, self.vendor_id, self.items, calculator)
    }

    /// Returns `true` if the reported totals equal those derived for `cart`.
    #[must_use]
    pub fn totals_match(&self, cart: &Cart) -> bool {
        self.subtotal == cart.subtotal() && self.tax == cart.tax() && self.total == cart.total()
    }
}

impl From<&Cart> for CartDocument {
    fn from(cart: &Cart) -> Self {
        Self {
            owner_ref: cart.owner_ref(),
            vendor_id: cart.vendor_id(),
            items: cart.lines().to_vec(),
            subtotal: cart.subtotal(),
            tax: cart.tax(),
            total: cart.total(),
        }
    }
}
