//! In-memory canonical cart for one owner × vendor pair.
//!
//! Every mutation builds a new [`Cart`] (repricing it on the way) and swaps it
//! in before returning, so callers only ever observe consistent snapshots.
//! The store has a single writer and no internal locking.

use std::sync::Arc;

use crate::cart::{Cart, CartLine, LineKey, ProductRef};
use crate::error::{NotFoundError, Result, ValidationError};
use crate::pricing::PricingCalculator;
use crate::types::{LineId, OwnerRef, VendorId};

/// Owns the current cart snapshot and applies mutations to it.
#[derive(Debug, Clone)]
pub struct CartStore {
    calculator: PricingCalculator,
    cart: Arc<Cart>,
}

impl CartStore {
    /// Start with an empty cart.
    #[must_use]
    pub fn new(owner_ref: OwnerRef, vendor_id: VendorId, calculator: PricingCalculator) -> Self {
        let cart = Cart::empty(owner_ref, vendor_id, &calculator);
        Self {
            calculator,
            cart: Arc::new(cart),
        }
    }

    /// Start from an existing cart.
    #[must_use]
    pub fn from_cart(cart: Cart, calculator: PricingCalculator) -> Self {
        // Reprice in case the cart was built with another calculator
        let cart = Cart::priced(
            cart.owner_ref(),
            cart.vendor_id(),
            cart.lines().to_vec(),
            &calculator,
        );
        Self {
            calculator,
            cart: Arc::new(cart),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Cart> {
        Arc::clone(&self.cart)
    }

    /// Calculator used for every repricing.
    #[must_use]
    pub const fn calculator(&self) -> &PricingCalculator {
        &self.calculator
    }

    /// Line with the given key.
    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.cart.line(key)
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line with the same key has its quantity increased in place;
    /// otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` if `quantity <= 0`, `VendorMismatch` if the
    /// product belongs to another vendor, or another validation error if the
    /// product reference is incomplete. The cart is unchanged on error.
    pub fn add(&mut self, product: &ProductRef, quantity: i64) -> Result<Arc<Cart>> {
        if quantity <= 0 {
            return Err(ValidationError::InvalidQuantity(quantity).into());
        }
        product.validate()?;
        if product.vendor_id != self.cart.vendor_id() {
            return Err(ValidationError::VendorMismatch {
                expected: self.cart.vendor_id(),
                actual: product.vendor_id,
            }
            .into());
        }

        let key = product.key();
        let quantity =
            u32::try_from(quantity).map_err(|_| ValidationError::QuantityOverflow(key.clone()))?;
        let mut lines = self.cart.lines().to_vec();
        match lines.iter().position(|line| line.key() == &key) {
            Some(index) => {
                if let Some(slot) = lines.get_mut(index) {
                    let summed = slot.summed_quantity(quantity)?;
                    *slot = slot.clone().with_quantity(summed);
                }
            }
            None => lines.push(CartLine::new(LineId::generate(), product, quantity)?),
        }

        Ok(self.commit(lines))
    }

    /// Set the quantity of the line with `key`.
    ///
    /// A quantity below 1 removes the line, exactly as [`CartStore::remove`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no line has `key`, or `QuantityOverflow` if the
    /// quantity does not fit in a `u32`.
    pub fn update(&mut self, key: &LineKey, quantity: i64) -> Result<Arc<Cart>> {
        if quantity < 1 {
            return self.remove(key);
        }
        let index = self.position(key)?;
        let quantity =
            u32::try_from(quantity).map_err(|_| ValidationError::QuantityOverflow(key.clone()))?;

        let mut lines = self.cart.lines().to_vec();
        if let Some(slot) = lines.get_mut(index) {
            *slot = slot.clone().with_quantity(quantity);
        }
        Ok(self.commit(lines))
    }

    /// Remove the line with `key`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no line has `key`. This is not fatal; the cart
    /// is unchanged and callers may ignore it.
    pub fn remove(&mut self, key: &LineKey) -> Result<Arc<Cart>> {
        let index = self.position(key)?;
        let mut lines = self.cart.lines().to_vec();
        lines.remove(index);
        Ok(self.commit(lines))
    }

    /// Remove every line.
    pub fn clear(&mut self) -> Arc<Cart> {
        self.commit(Vec::new())
    }

    /// Replace the whole cart with one from an authoritative source.
    ///
    /// # Errors
    ///
    /// Returns `VendorMismatch` if `cart` belongs to another vendor.
    pub fn replace(&mut self, cart: Cart) -> Result<Arc<Cart>> {
        if cart.vendor_id() != self.cart.vendor_id() {
            return Err(ValidationError::VendorMismatch {
                expected: self.cart.vendor_id(),
                actual: cart.vendor_id(),
            }
            .into());
        }
        let cart = Cart::priced(
            cart.owner_ref(),
            cart.vendor_id(),
            cart.lines().to_vec(),
            &self.calculator,
        );
        self.cart = Arc::new(cart);
        Ok(self.snapshot())
    }

    fn position(&self, key: &LineKey) -> Result<usize> {
        self.cart
            .lines()
            .iter()
            .position(|line| line.key() == key)
            .ok_or_else(|| NotFoundError::Key(key.clone()).into())
    }

    fn commit(&mut self, lines: Vec<CartLine>) -> Arc<Cart> {
        let cart = Cart::priced(
            self.cart.owner_ref(),
            self.cart.vendor_id(),
            lines,
            &self.calculator,
        );
        self.cart = Arc::new(cart);
        self.snapshot()
    }
}
