//! Cart totals.
//!
//! `subtotal = Σ(unit_price × quantity)` and `tax = subtotal × rate` are
//! computed exactly; each is rounded half away from zero to two decimals once,
//! when the [`Totals`] value is produced. `total` is the sum of the two
//! rounded figures so the presented numbers always add up.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::CartLine;
use crate::types::{Money, TaxRate};

/// Subtotal, tax and total for a set of lines.
///
/// Only [`PricingCalculator::compute`] produces this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    subtotal: Money,
    tax: Money,
    total: Money,
}

impl Totals {
    /// Sum of line totals, rounded.
    #[must_use]
    pub const fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Tax on the subtotal, rounded.
    #[must_use]
    pub const fn tax(&self) -> Money {
        self.tax
    }

    /// `subtotal + tax`.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }
}

/// Derives [`Totals`] from cart lines at a vendor's tax rate.
///
/// Pure: the same lines always produce the same totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingCalculator {
    tax_rate: TaxRate,
}

impl PricingCalculator {
    /// Calculator for one vendor's tax rate.
    #[must_use]
    pub const fn new(tax_rate: TaxRate) -> Self {
        Self { tax_rate }
    }

    /// The configured tax rate.
    #[must_use]
    pub const fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Compute totals for `lines`.
    #[must_use]
    pub fn compute(&self, lines: &[CartLine]) -> Totals {
        let subtotal: Decimal = lines.iter().map(|line| line.line_total().amount()).sum();
        let tax = subtotal * self.tax_rate.fraction();

        let subtotal = Money::from_non_negative(subtotal).rounded();
        let tax = Money::from_non_negative(tax).rounded();
        let total = Money::from_non_negative(subtotal.amount() + tax.amount());

        Totals {
            subtotal,
            tax,
            total,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::ProductRef;
    use crate::types::{LineId, ProductId, VendorId};

    fn line(product: i64, price: &str, quantity: u32) -> CartLine {
        let product = ProductRef {
            product_id: ProductId::new(product),
            variant: None,
            name: format!("Product {product}"),
            unit_price: Money::parse(price).unwrap(),
            image_url: None,
            vendor_id: VendorId::new(1),
        };
        CartLine::new(LineId::generate(), &product, quantity).unwrap()
    }

    fn eight_percent() -> PricingCalculator {
        PricingCalculator::new(TaxRate::parse("0.08").unwrap())
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let totals = eight_percent().compute(&[]);
        assert_eq!(totals.subtotal().to_string(), "0.00");
        assert_eq!(totals.tax().to_string(), "0.00");
        assert_eq!(totals.total().to_string(), "0.00");
    }

    #[test]
    fn test_single_line_with_tax() {
        let totals = eight_percent().compute(&[line(123, "29.99", 3)]);
        assert_eq!(totals.subtotal().to_string(), "89.97");
        assert_eq!(totals.tax().to_string(), "7.20");
        assert_eq!(totals.total().to_string(), "97.17");
    }

    #[test]
    fn test_rounding_happens_once() {
        // Per-line tax would be 3 × round(0.0264) = 0.09; taxing the exact
        // subtotal gives round(0.0792) = 0.08.
        let lines = [line(1, "0.33", 1), line(2, "0.33", 1), line(3, "0.33", 1)];
        let totals = eight_percent().compute(&lines);
        assert_eq!(totals.subtotal().to_string(), "0.99");
        assert_eq!(totals.tax().to_string(), "0.08");
        assert_eq!(totals.total().to_string(), "1.07");
    }

    #[test]
    fn test_line_order_does_not_matter() {
        let a = line(1, "19.99", 2);
        let b = line(2, "5.05", 7);
        let calc = eight_percent();
        assert_eq!(
            calc.compute(&[a.clone(), b.clone()]),
            calc.compute(&[b, a])
        );
    }

    #[test]
    fn test_exempt_vendor() {
        let calc = PricingCalculator::new(TaxRate::EXEMPT);
        let totals = calc.compute(&[line(1, "10.00", 2)]);
        assert_eq!(totals.tax(), Money::ZERO);
        assert_eq!(totals.total().to_string(), "20.00");
    }

    #[test]
    fn test_totals_serialize_as_strings() {
        let totals = eight_percent().compute(&[line(1, "12.34", 1)]);
        let value = serde_json::to_value(totals).unwrap();
        assert_eq!(value["subtotal"], "12.34");
        assert_eq!(value["tax"], "0.99");
        assert_eq!(value["total"], "13.33");
    }
}
