//! Customer authentication for the cart API.
//!
//! Every cart request carries `Authorization: Bearer <token>` and
//! `X-Vendor-Id: <vendor>`. The [`CartOwner`] extractor resolves both.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;
use vendorcart_core::{UserId, VendorId};

use crate::config::CustomerTokens;
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;
use crate::wire::VENDOR_ID_HEADER;

/// Maps access tokens to customers.
pub trait CustomerResolver: Send + Sync {
    /// Customer the token was issued to, `None` if the token is unknown.
    fn resolve(&self, token: &str) -> Option<UserId>;
}

impl CustomerResolver for CustomerTokens {
    fn resolve(&self, token: &str) -> Option<UserId> {
        self.user_for(token)
    }
}

/// Extractor for the customer and vendor a cart request is scoped to.
///
/// Rejects with 401 if the bearer token is missing or unknown, and with 400
/// if the vendor header is missing or malformed.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(owner: CartOwner) -> String {
///     format!("cart of {} at {}", owner.user_id, owner.vendor_id)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartOwner {
    pub user_id: UserId,
    pub vendor_id: VendorId,
}

impl FromRequestParts<AppState> for CartOwner {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let user_id = state
            .customers()
            .resolve(token)
            .ok_or_else(|| AppError::Unauthorized("unknown access token".to_string()))?;

        let vendor_id = parts
            .headers
            .get(VENDOR_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.parse::<VendorId>().ok())
            .ok_or_else(|| {
                AppError::BadRequest("missing or invalid X-Vendor-Id header".to_string())
            })?;

        set_sentry_user(&user_id);
        Span::current().record("user_id", user_id.as_i64());

        Ok(Self { user_id, vendor_id })
    }
}
