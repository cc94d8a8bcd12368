//! HTTP middleware stack for the cart API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor ([`CartOwner`]) rather than a layer, so
//! `/health` stays public.

pub mod auth;
pub mod request_id;

pub use auth::{CartOwner, CustomerResolver};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
