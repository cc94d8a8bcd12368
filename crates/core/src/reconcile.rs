//! Guest/server cart reconciliation at login.
//!
//! The merge is additive only: server lines keep their order and position,
//! a local line with a matching key adds its quantity to the server line, and
//! local-only lines are appended under fresh line ids. Nothing is dropped and
//! no quantity is ever reduced.
//!
//! Merging is pure but not idempotent. Merging the same local cart twice
//! counts it twice, so the caller must clear the local store once the merged
//! cart has been accepted by the server.

use std::collections::HashMap;

use crate::cart::{Cart, CartLine, LineKey, ProductRef};
use crate::error::ValidationError;
use crate::pricing::PricingCalculator;
use crate::types::LineId;

/// One server mutation needed to turn the server cart into the merged cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStep {
    /// Raise an existing server line to `quantity`.
    SetQuantity {
        /// Server line id.
        line_id: LineId,
        /// Merged quantity (server + local).
        quantity: u32,
    },
    /// Create a line the server does not have yet.
    AddLine {
        /// Product carried over from the local line.
        product: ProductRef,
        /// Local quantity.
        quantity: u32,
    },
}

/// Result of [`merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The merged canonical cart, owned by the server cart's owner.
    pub cart: Cart,
    /// Server mutations that reproduce `cart`, in local line order.
    pub plan: Vec<MergeStep>,
}

impl Reconciliation {
    /// Returns `true` if the server cart already equals the merged cart.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.plan.is_empty()
    }
}

/// Merge a guest cart into a server cart.
///
/// # Errors
///
/// Returns `VendorMismatch` if the carts belong to different vendors and
/// `QuantityOverflow` if a summed quantity does not fit in a `u32`.
pub fn merge(
    local: &Cart,
    server: &Cart,
    calculator: &PricingCalculator,
) -> Result<Reconciliation, ValidationError> {
    if local.vendor_id() != server.vendor_id() {
        return Err(ValidationError::VendorMismatch {
            expected: server.vendor_id(),
            actual: local.vendor_id(),
        });
    }

    let index: HashMap<&LineKey, usize> = server
        .lines()
        .iter()
        .enumerate()
        .map(|(position, line)| (line.key(), position))
        .collect();

    let mut lines: Vec<CartLine> = server.lines().to_vec();
    let mut plan = Vec::new();

    for local_line in local.lines() {
        match index.get(local_line.key()) {
            Some(&position) => {
                let Some(server_line) = lines.get(position) else {
                    continue;
                };
                let quantity = server_line.summed_quantity(local_line.quantity())?;
                let line_id = server_line.id();
                let merged = server_line.clone().with_quantity(quantity);
                if let Some(slot) = lines.get_mut(position) {
                    *slot = merged;
                }
                plan.push(MergeStep::SetQuantity { line_id, quantity });
            }
            None => {
                lines.push(local_line.clone().with_id(LineId::generate()));
                plan.push(MergeStep::AddLine {
                    product: local_line.product(),
                    quantity: local_line.quantity(),
                });
            }
        }
    }

    let cart = Cart::priced(server.owner_ref(), server.vendor_id(), lines, calculator);
    Ok(Reconciliation { cart, plan })
}
