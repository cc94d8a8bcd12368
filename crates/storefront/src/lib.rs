//! vendorcart Storefront library.
//!
//! Everything that touches I/O around the core cart logic:
//! - [`persistence`] - guest cart snapshots in local storage
//! - [`client`] - the server cart API client
//! - [`session`] - guest and customer cart sessions, login reconciliation
//! - [`routes`] - the reference cart API served by the `vendorcart-storefront` binary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod persistence;
pub mod routes;
pub mod session;
pub mod state;
pub mod wire;
