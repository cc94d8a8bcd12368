//! vendorcart Core - cart model, pricing and reconciliation.
//!
//! This crate provides the cart logic shared by every vendorcart component:
//! - `storefront` - local persistence, the server cart client and the cart API
//! - `cli` - offline inspection and merging of cart documents
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and traits - no I/O, no
//! HTTP clients. Storage is reached through the [`CartRepository`] trait so it
//! can be injected by the caller.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money and tax rates
//! - [`cart`] - Cart lines and immutable cart snapshots
//! - [`pricing`] - Subtotal, tax and total derivation
//! - [`store`] - The mutable owner of the current cart snapshot
//! - [`reconcile`] - Guest/server merge at login
//! - [`repository`] - Storage capability for local snapshots
//! - [`error`] - Error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod error;
pub mod pricing;
pub mod reconcile;
pub mod repository;
pub mod store;
pub mod types;

pub use cart::{Cart, CartDocument, CartLine, LineKey, ProductRef};
pub use error::{CartError, NetworkError, NotFoundError, PersistenceError, ValidationError};
pub use pricing::{PricingCalculator, Totals};
pub use reconcile::{MergeStep, Reconciliation, merge};
pub use repository::{CartRepository, CartScope};
pub use store::CartStore;
pub use types::*;
