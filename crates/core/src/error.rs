//! Cart error taxonomy.
//!
//! Reconciliation is additive-only, so there is no merge-conflict variant.

use thiserror::Error;

use crate::cart::LineKey;
use crate::types::{LineId, VendorId};

/// Input rejected before it reaches the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Quantity was zero or negative.
    #[error("invalid quantity {0}: must be at least 1")]
    InvalidQuantity(i64),

    /// Quantity does not fit in a cart line.
    #[error("quantity overflow for {0}")]
    QuantityOverflow(LineKey),

    /// Product reference is missing a required field.
    #[error("missing product reference: {0}")]
    MissingProduct(&'static str),

    /// Unit price is malformed or has sub-cent precision.
    #[error("invalid unit price: {0}")]
    InvalidPrice(String),

    /// Line or cart belongs to another vendor.
    #[error("vendor mismatch: expected {expected}, got {actual}")]
    VendorMismatch {
        /// Vendor that owns the cart.
        expected: VendorId,
        /// Vendor carried by the rejected input.
        actual: VendorId,
    },

    /// Two lines in one cart share a key.
    #[error("duplicate cart line {0}")]
    DuplicateLine(LineKey),
}

/// Operation addressed a line that is not in the cart.
///
/// Non-fatal: the cart is left unchanged and callers may ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    /// No line with this key.
    #[error("no cart line for {0}")]
    Key(LineKey),

    /// No line with this id.
    #[error("no cart line with id {0}")]
    Line(LineId),
}

/// Local storage read or write failed.
///
/// Always recovered locally (empty or previous state) and logged.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Storage backend I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored payload could not be decoded.
    #[error("malformed cart payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Stored payload decoded but violates cart invariants.
    #[error("invalid stored cart: {0}")]
    Invalid(#[from] ValidationError),
}

/// Server unreachable or returned a non-success response.
///
/// Surfaced to the caller; cart state is not advanced.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection or transport failure.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// Request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// Response body was not a valid cart.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),
}

/// Umbrella error for cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Line not present (non-fatal).
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Local storage failure.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Server round trip failure.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl CartError {
    /// Returns `true` if the error leaves the cart usable and can be ignored.
    #[must_use]
    pub const fn is_non_fatal(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Persistence(_))
    }
}

/// Result type alias for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;
