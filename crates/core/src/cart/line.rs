//! Cart line items.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;
use rust_decimal::Decimal;

use crate::types::{LineId, Money, PRESENTATION_SCALE, ProductId, VendorId};

/// Largest unit price a catalog may quote.
///
/// With quantities bounded by `u32`, every line total and cart subtotal stays
/// far inside the `Decimal` range.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Identity of a cart line for aggregation and merging.
///
/// Two lines with the same product and variant are the same line; adding one
/// to the other sums their quantities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    /// Catalog product.
    pub product_id: ProductId,
    /// Variant selector (size, color, ...), `None` for single-variant products.
    pub variant: Option<String>,
}

impl LineKey {
    /// Build a key. A blank variant is the same as no variant.
    #[must_use]
    pub fn new(product_id: ProductId, variant: Option<String>) -> Self {
        Self {
            product_id,
            variant: normalize_variant(variant),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}/{variant}", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

fn normalize_variant(variant: Option<String>) -> Option<String> {
    variant.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Catalog description of a product being added to a cart.
///
/// The catalog is the pricing source of truth; the cart copies the name,
/// price and image at the moment the line is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductRef {
    /// Catalog product.
    pub product_id: ProductId,
    /// Variant selector.
    #[serde(default)]
    pub variant: Option<String>,
    /// Display name.
    pub name: String,
    /// Price of one unit.
    pub unit_price: Money,
    /// Product image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Vendor selling the product.
    pub vendor_id: VendorId,
}

impl ProductRef {
    /// The line key this product aggregates under.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id, self.variant.clone())
    }

    /// Check the reference carries everything a cart line needs.
    ///
    /// # Errors
    ///
    /// Returns `MissingProduct` for a blank name and `InvalidPrice` for
    /// sub-cent or out-of-range unit prices.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingProduct("name"));
        }
        if self.unit_price.amount() > MAX_UNIT_PRICE {
            return Err(ValidationError::InvalidPrice(
                self.unit_price.amount().to_string(),
            ));
        }
        if self.unit_price.amount().scale() > PRESENTATION_SCALE
            && self.unit_price.rounded() != self.unit_price
        {
            return Err(ValidationError::InvalidPrice(
                self.unit_price.amount().to_string(),
            ));
        }
        Ok(())
    }
}

/// A line item in a cart.
///
/// Quantity is always at least 1; a line with no units is removed instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    id: LineId,
    key: LineKey,
    name: String,
    unit_price: Money,
    quantity: u32,
    image_url: Option<String>,
    vendor_id: VendorId,
}

impl CartLine {
    /// Create a line for a validated product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product fails validation or quantity is zero.
    pub fn new(id: LineId, product: &ProductRef, quantity: u32) -> Result<Self, ValidationError> {
        product.validate()?;
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(0));
        }
        Ok(Self {
            id,
            key: product.key(),
            name: product.name.clone(),
            unit_price: product.unit_price,
            quantity,
            image_url: product.image_url.clone(),
            vendor_id: product.vendor_id,
        })
    }

    /// Line identity.
    #[must_use]
    pub const fn id(&self) -> LineId {
        self.id
    }

    /// Aggregation key.
    #[must_use]
    pub const fn key(&self) -> &LineKey {
        &self.key
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price of one unit.
    #[must_use]
    pub const fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Number of units, at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Product image.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Vendor selling the product.
    #[must_use]
    pub const fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    /// The product this line was created from.
    #[must_use]
    pub fn product(&self) -> ProductRef {
        ProductRef {
            product_id: self.key.product_id,
            variant: self.key.variant.clone(),
            name: self.name.clone(),
            unit_price: self.unit_price,
            image_url: self.image_url.clone(),
            vendor_id: self.vendor_id,
        }
    }

    /// Same line with a different quantity. Callers guarantee `quantity >= 1`.
    pub(crate) fn with_quantity(mut self, quantity: u32) -> Self {
        debug_assert!(quantity >= 1);
        self.quantity = quantity;
        self
    }

    /// Same line under a new identity.
    pub(crate) fn with_id(mut self, id: LineId) -> Self {
        self.id = id;
        self
    }

    /// Quantity after adding `extra` units.
    pub(crate) fn summed_quantity(&self, extra: u32) -> Result<u32, ValidationError> {
        self.quantity
            .checked_add(extra)
            .ok_or_else(|| ValidationError::QuantityOverflow(self.key.clone()))
    }

    /// `unit_price × quantity`, exact.
    #[must_use]
    pub fn line_total(&self) -> Money {
        Money::from_non_negative(self.unit_price.amount() * Decimal::from(self.quantity))
    }
}

/// Wire shape of a cart line, shared by local storage and the server API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CartLineRecord {
    id: LineId,
    product_id: ProductId,
    #[serde(default)]
    variant: Option<String>,
    name: String,
    unit_price: Money,
    quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    vendor_id: VendorId,
}

impl CartLineRecord {
    fn into_line(self) -> Result<CartLine, ValidationError> {
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or(ValidationError::InvalidQuantity(self.quantity))?;
        let product = ProductRef {
            product_id: self.product_id,
            variant: self.variant,
            name: self.name,
            unit_price: self.unit_price,
            image_url: self.image_url,
            vendor_id: self.vendor_id,
        };
        CartLine::new(self.id, &product, quantity)
    }

    fn from_line(line: &CartLine) -> Self {
        let line = line.clone();
        Self {
            id: line.id,
            product_id: line.key.product_id,
            variant: line.key.variant,
            name: line.name,
            unit_price: line.unit_price,
            quantity: i64::from(line.quantity),
            image_url: line.image_url,
            vendor_id: line.vendor_id,
        }
    }
}

impl Serialize for CartLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CartLineRecord::from_line(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CartLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        CartLineRecord::deserialize(deserializer)?
            .into_line()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shirt() -> ProductRef {
        ProductRef {
            product_id: ProductId::new(123),
            variant: Some("M/Red".to_string()),
            name: "Tee".to_string(),
            unit_price: Money::parse("29.99").unwrap(),
            image_url: None,
            vendor_id: VendorId::new(1),
        }
    }

    #[test]
    fn test_blank_variant_is_no_variant() {
        let a = LineKey::new(ProductId::new(5), Some("  ".to_string()));
        let b = LineKey::new(ProductId::new(5), None);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "5");

        let c = LineKey::new(ProductId::new(5), Some(" M ".to_string()));
        assert_eq!(c.variant.as_deref(), Some("M"));
    }

    #[test]
    fn test_product_validation() {
        assert!(shirt().validate().is_ok());

        let mut unnamed = shirt();
        unnamed.name = " ".to_string();
        assert_eq!(
            unnamed.validate(),
            Err(ValidationError::MissingProduct("name"))
        );

        let mut sub_cent = shirt();
        sub_cent.unit_price = Money::parse("1.005").unwrap();
        assert!(matches!(
            sub_cent.validate(),
            Err(ValidationError::InvalidPrice(_))
        ));

        // Trailing zeros are not sub-cent precision
        let mut padded = shirt();
        padded.unit_price = Money::parse("1.500").unwrap();
        assert!(padded.validate().is_ok());
    }

    #[test]
    fn test_line_bounds() {
        let line = CartLine::new(LineId::generate(), &shirt(), u32::MAX).unwrap();
        assert_eq!(line.summed_quantity(0).unwrap(), u32::MAX);
        assert!(matches!(
            line.summed_quantity(1),
            Err(ValidationError::QuantityOverflow(_))
        ));

        let mut top = shirt();
        top.unit_price = Money::try_from_decimal(MAX_UNIT_PRICE).unwrap();
        assert!(top.validate().is_ok());

        let mut pricey = shirt();
        pricey.unit_price = Money::parse("1000000000.01").unwrap();
        assert!(matches!(
            pricey.validate(),
            Err(ValidationError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_line_total() {
        let line = CartLine::new(LineId::generate(), &shirt(), 3).unwrap();
        assert_eq!(line.line_total().to_string(), "89.97");
    }

    #[test]
    fn test_line_json_shape() {
        let line = CartLine::new(LineId::generate(), &shirt(), 2).unwrap();
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["productId"], 123);
        assert_eq!(value["variant"], "M/Red");
        assert_eq!(value["unitPrice"], "29.99");
        assert_eq!(value["quantity"], 2);
        assert_eq!(value["vendorId"], 1);
        assert!(value.get("imageUrl").is_none());

        let back: CartLine = serde_json::from_value(value).unwrap();
        assert_eq!(back, line);
    }

    #[test]
    fn test_line_rejects_unknown_fields_and_bad_quantity() {
        let line = CartLine::new(LineId::generate(), &shirt(), 1).unwrap();
        let mut value = serde_json::to_value(&line).unwrap();

        value["quantity"] = serde_json::json!(0);
        assert!(serde_json::from_value::<CartLine>(value.clone()).is_err());

        value["quantity"] = serde_json::json!(1);
        value["discount"] = serde_json::json!("5.00");
        assert!(serde_json::from_value::<CartLine>(value).is_err());
    }
}
