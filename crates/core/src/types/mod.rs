//! Core types for vendorcart.
//!
//! This module provides type-safe wrappers for ids, money and tax rates.

pub mod id;
pub mod money;
pub mod tax;

pub use id::*;
pub use money::{Money, MoneyError, PRESENTATION_SCALE};
pub use tax::{TaxRate, TaxRateError};
