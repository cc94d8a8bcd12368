//! Cart snapshots.
//!
//! A [`Cart`] is an immutable value: lines plus the totals derived from them.
//! Totals are computed in the constructor and there is no way to set them
//! independently, so a cart whose totals disagree with its lines cannot exist.

mod document;
mod line;

use std::collections::HashSet;

use serde::Serialize;

pub use document::CartDocument;
pub use line::{CartLine, LineKey, MAX_UNIT_PRICE, ProductRef};

use crate::error::ValidationError;
use crate::pricing::{PricingCalculator, Totals};
use crate::types::{LineId, Money, OwnerRef, VendorId};

/// One owner's cart at one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    owner_ref: OwnerRef,
    vendor_id: VendorId,
    #[serde(rename = "items")]
    lines: Vec<CartLine>,
    #[serde(flatten)]
    totals: Totals,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn empty(owner_ref: OwnerRef, vendor_id: VendorId, calculator: &PricingCalculator) -> Self {
        Self {
            owner_ref,
            vendor_id,
            lines: Vec::new(),
            totals: calculator.compute(&[]),
        }
    }

    /// Build a cart from existing lines, checking cart invariants.
    ///
    /// # Errors
    ///
    /// Returns `VendorMismatch` if a line belongs to another vendor and
    /// `DuplicateLine` if two lines share a key.
    pub fn from_lines(
        owner_ref: OwnerRef,
        vendor_id: VendorId,
        lines: Vec<CartLine>,
        calculator: &PricingCalculator,
    ) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(lines.len());
        for line in &lines {
            if line.vendor_id() != vendor_id {
                return Err(ValidationError::VendorMismatch {
                    expected: vendor_id,
                    actual: line.vendor_id(),
                });
            }
            if !seen.insert(line.key()) {
                return Err(ValidationError::DuplicateLine(line.key().clone()));
            }
        }
        Ok(Self::priced(owner_ref, vendor_id, lines, calculator))
    }

    /// Reprice already-validated lines.
    pub(crate) fn priced(
        owner_ref: OwnerRef,
        vendor_id: VendorId,
        lines: Vec<CartLine>,
        calculator: &PricingCalculator,
    ) -> Self {
        let totals = calculator.compute(&lines);
        Self {
            owner_ref,
            vendor_id,
            lines,
            totals,
        }
    }

    /// Session identity the cart belongs to.
    #[must_use]
    pub const fn owner_ref(&self) -> OwnerRef {
        self.owner_ref
    }

    /// Vendor the cart belongs to.
    #[must_use]
    pub const fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Derived totals.
    #[must_use]
    pub const fn totals(&self) -> Totals {
        self.totals
    }

    /// Rounded subtotal.
    #[must_use]
    pub const fn subtotal(&self) -> Money {
        self.totals.subtotal()
    }

    /// Rounded tax.
    #[must_use]
    pub const fn tax(&self) -> Money {
        self.totals.tax()
    }

    /// `subtotal + tax`.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.totals.total()
    }

    /// Line with the given key.
    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.key() == key)
    }

    /// Line with the given id.
    #[must_use]
    pub fn line_by_id(&self, id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id() == id)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{ProductId, TaxRate, UserId};

    fn calc() -> PricingCalculator {
        PricingCalculator::new(TaxRate::parse("0.08").unwrap())
    }

    fn line(product: i64, vendor: i64) -> CartLine {
        let product = ProductRef {
            product_id: ProductId::new(product),
            variant: None,
            name: "Mug".to_string(),
            unit_price: Money::parse("10.00").unwrap(),
            image_url: None,
            vendor_id: VendorId::new(vendor),
        };
        CartLine::new(LineId::generate(), &product, 1).unwrap()
    }

    fn owner() -> OwnerRef {
        OwnerRef::User(UserId::new(1))
    }

    #[test]
    fn test_from_lines_computes_totals() {
        let cart =
            Cart::from_lines(owner(), VendorId::new(1), vec![line(1, 1), line(2, 1)], &calc())
                .unwrap();
        assert_eq!(cart.subtotal().to_string(), "20.00");
        assert_eq!(cart.tax().to_string(), "1.60");
        assert_eq!(cart.total().to_string(), "21.60");
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_from_lines_rejects_other_vendor() {
        let err = Cart::from_lines(owner(), VendorId::new(1), vec![line(1, 2)], &calc())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::VendorMismatch {
                expected: VendorId::new(1),
                actual: VendorId::new(2),
            }
        );
    }

    #[test]
    fn test_from_lines_rejects_duplicate_keys() {
        let err = Cart::from_lines(owner(), VendorId::new(1), vec![line(1, 1), line(1, 1)], &calc())
            .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateLine(_)));
    }

    #[test]
    fn test_serialized_shape() {
        let cart = Cart::from_lines(owner(), VendorId::new(1), vec![line(1, 1)], &calc()).unwrap();
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value["ownerRef"], "user:1");
        assert_eq!(value["vendorId"], 1);
        assert_eq!(value["items"].as_array().unwrap().len(), 1);
        assert_eq!(value["subtotal"], "10.00");
        assert_eq!(value["tax"], "0.80");
        assert_eq!(value["total"], "10.80");
    }
}
