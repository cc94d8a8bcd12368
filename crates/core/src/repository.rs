//! Storage capability for local cart snapshots.
//!
//! Persistence is injected through [`CartRepository`] rather than reached
//! through a global, so the cart logic never touches storage directly.

use core::fmt;

use crate::error::PersistenceError;
use crate::types::{OwnerRef, VendorId};

/// Storage slot for one owner's cart at one vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CartScope {
    /// Vendor the cart belongs to.
    pub vendor_id: VendorId,
    /// Session identity the cart belongs to.
    pub owner_ref: OwnerRef,
}

impl CartScope {
    /// Scope for `owner_ref` at `vendor_id`.
    #[must_use]
    pub const fn new(vendor_id: VendorId, owner_ref: OwnerRef) -> Self {
        Self {
            vendor_id,
            owner_ref,
        }
    }

    /// Stable storage key, safe to use as a file name.
    ///
    /// ```
    /// use vendorcart_core::{CartScope, OwnerRef, UserId, VendorId};
    ///
    /// let scope = CartScope::new(VendorId::new(4), OwnerRef::User(UserId::new(9)));
    /// assert_eq!(scope.storage_key(), "cart-4-user-9");
    /// ```
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "cart-{}-{}",
            self.vendor_id,
            self.owner_ref.to_string().replace(':', "-")
        )
    }
}

impl fmt::Display for CartScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.owner_ref, self.vendor_id)
    }
}

/// Synchronous key/value storage for serialized cart snapshots.
///
/// Implementations store opaque payloads; decoding and validation happen in
/// the adapter that owns the repository.
pub trait CartRepository: Send + Sync {
    /// Read the payload for `scope`, `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load(&self, scope: &CartScope) -> Result<Option<String>, PersistenceError>;

    /// Write the payload for `scope`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn store(&self, scope: &CartScope, payload: &str) -> Result<(), PersistenceError>;

    /// Delete the payload for `scope`. Deleting a missing payload succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn delete(&self, scope: &CartScope) -> Result<(), PersistenceError>;
}

impl<R: CartRepository + ?Sized> CartRepository for std::sync::Arc<R> {
    fn load(&self, scope: &CartScope) -> Result<Option<String>, PersistenceError> {
        (**self).load(scope)
    }

    fn store(&self, scope: &CartScope, payload: &str) -> Result<(), PersistenceError> {
        (**self).store(scope, payload)
    }

    fn delete(&self, scope: &CartScope) -> Result<(), PersistenceError> {
        (**self).delete(scope)
    }
}
