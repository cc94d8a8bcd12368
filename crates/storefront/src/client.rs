//! HTTP client for the server cart API.
//!
//! Each cart operation is exactly one request. Every response is a full cart
//! document; its totals are recomputed locally and a disagreement with the
//! server's figures is logged. Failures are returned as [`NetworkError`] and
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};
use url::Url;
use vendorcart_core::{
    Cart, CartDocument, CartError, LineId, NetworkError, NotFoundError, PricingCalculator,
    ProductId, ProductRef, ValidationError, VendorId,
};

use crate::config::ServerApiConfig;
use crate::wire::{AddLineRequest, SetQuantityRequest, VENDOR_ID_HEADER};

/// Result type for client calls.
pub type Result<T> = std::result::Result<T, CartError>;

/// Longest response body excerpt carried in an error.
const BODY_EXCERPT_CHARS: usize = 200;

// =============================================================================
// ServerCartClient
// =============================================================================

/// Client for one customer's cart at one vendor.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ServerCartClient {
    inner: Arc<ServerCartClientInner>,
}

struct ServerCartClientInner {
    http: reqwest::Client,
    base_url: Url,
    access_token: SecretString,
    vendor_id: VendorId,
    calculator: PricingCalculator,
    request_timeout: Duration,
}

impl std::fmt::Debug for ServerCartClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCartClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("vendor_id", &self.inner.vendor_id)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ServerCartClient {
    /// Create a client authenticated with `access_token` and scoped to
    /// `vendor_id`. `calculator` reprices every returned cart.
    #[must_use]
    pub fn new(
        config: &ServerApiConfig,
        access_token: SecretString,
        vendor_id: VendorId,
        calculator: PricingCalculator,
    ) -> Self {
        // Url::join replaces the last path segment unless the base ends in '/'
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            inner: Arc::new(ServerCartClientInner {
                http: reqwest::Client::new(),
                base_url,
                access_token,
                vendor_id,
                calculator,
                request_timeout: config.request_timeout,
            }),
        }
    }

    /// Vendor every request is scoped to.
    #[must_use]
    pub fn vendor_id(&self) -> VendorId {
        self.inner.vendor_id
    }

    /// Calculator used to reprice returned carts.
    #[must_use]
    pub fn calculator(&self) -> &PricingCalculator {
        &self.inner.calculator
    }

    /// `GET /cart`.
    ///
    /// # Errors
    ///
    /// Returns a `NetworkError` if the request fails or the response is not a
    /// valid cart for this vendor.
    #[instrument(skip(self), fields(vendor_id = %self.inner.vendor_id))]
    pub async fn fetch(&self) -> Result<Cart> {
        let request = self.request(Method::GET, "cart")?;
        self.send(request).await
    }

    /// `POST /cart/add` for a catalog product.
    ///
    /// # Errors
    ///
    /// Returns `VendorMismatch` if the product belongs to another vendor,
    /// `InvalidQuantity` if `quantity` is not positive, and a `NetworkError`
    /// if the request fails.
    pub async fn add(&self, product: &ProductRef, quantity: i64) -> Result<Cart> {
        if product.vendor_id != self.inner.vendor_id {
            return Err(ValidationError::VendorMismatch {
                expected: self.inner.vendor_id,
                actual: product.vendor_id,
            }
            .into());
        }
        self.add_line(product.product_id, product.variant.clone(), quantity)
            .await
    }

    /// `POST /cart/add`. The server prices the line from its catalog.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` if `quantity` is not positive, and a
    /// `NetworkError` if the request fails.
    #[instrument(skip(self), fields(vendor_id = %self.inner.vendor_id))]
    pub async fn add_line(
        &self,
        product_id: ProductId,
        variant: Option<String>,
        quantity: i64,
    ) -> Result<Cart> {
        if quantity < 1 {
            return Err(ValidationError::InvalidQuantity(quantity).into());
        }
        let body = AddLineRequest {
            product_id,
            quantity,
            variant,
            vendor_id: self.inner.vendor_id,
        };
        let request = self.request(Method::POST, "cart/add")?.json(&body);
        self.send(request).await
    }

    /// `PUT /cart/items/{id}`. A quantity below 1 removes the line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the server has no such line, and a
    /// `NetworkError` if the request fails.
    #[instrument(skip(self), fields(vendor_id = %self.inner.vendor_id))]
    pub async fn set_quantity(&self, line_id: LineId, quantity: i64) -> Result<Cart> {
        let request = self
            .request(Method::PUT, &format!("cart/items/{line_id}"))?
            .json(&SetQuantityRequest { quantity });
        self.send(request)
            .await
            .map_err(|e| line_not_found(e, line_id))
    }

    /// `DELETE /cart/items/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the server has no such line, and a
    /// `NetworkError` if the request fails.
    #[instrument(skip(self), fields(vendor_id = %self.inner.vendor_id))]
    pub async fn remove_line(&self, line_id: LineId) -> Result<Cart> {
        let request = self.request(Method::DELETE, &format!("cart/items/{line_id}"))?;
        self.send(request)
            .await
            .map_err(|e| line_not_found(e, line_id))
    }

    /// `DELETE /cart`.
    ///
    /// # Errors
    ///
    /// Returns a `NetworkError` if the request fails.
    #[instrument(skip(self), fields(vendor_id = %self.inner.vendor_id))]
    pub async fn clear(&self) -> Result<Cart> {
        let request = self.request(Method::DELETE, "cart")?;
        self.send(request).await
    }

    /// Build an authenticated request for `path` relative to the base URL.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| NetworkError::Unreachable(format!("invalid URL for {path}: {e}")))?;

        Ok(self
            .inner
            .http
            .request(method, url)
            .bearer_auth(self.inner.access_token.expose_secret())
            .header(VENDOR_ID_HEADER, self.inner.vendor_id.to_string())
            .timeout(self.inner.request_timeout))
    }

    /// Send a request and decode the cart it returns.
    async fn send(&self, request: RequestBuilder) -> Result<Cart> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            debug!(status = %status, body = %excerpt(&body), "Cart API returned non-success status");
            return Err(NetworkError::Status {
                status: status.as_u16(),
                message: excerpt(&body),
            }
            .into());
        }

        let document: CartDocument = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, body = %excerpt(&body), "Failed to parse cart response");
            NetworkError::InvalidResponse(e.to_string())
        })?;
        Ok(self.accept(document)?)
    }

    /// Check a returned document belongs to this session and reprice it.
    fn accept(&self, document: CartDocument) -> std::result::Result<Cart, NetworkError> {
        if document.vendor_id != self.inner.vendor_id {
            return Err(NetworkError::InvalidResponse(format!(
                "cart for vendor {} returned to a vendor {} session",
                document.vendor_id, self.inner.vendor_id
            )));
        }
        if document.owner_ref.is_guest() {
            return Err(NetworkError::InvalidResponse(format!(
                "server returned guest cart {}",
                document.owner_ref
            )));
        }

        let reported = (document.subtotal, document.tax, document.total);
        let cart = document
            .into_cart(&self.inner.calculator)
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))?;

        if reported != (cart.subtotal(), cart.tax(), cart.total()) {
            warn!(
                reported_subtotal = %reported.0,
                reported_tax = %reported.1,
                reported_total = %reported.2,
                subtotal = %cart.subtotal(),
                tax = %cart.tax(),
                total = %cart.total(),
                "Server cart totals disagree with recomputed totals"
            );
        }
        Ok(cart)
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

fn transport_error(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout
    } else if e.is_decode() {
        NetworkError::InvalidResponse(e.to_string())
    } else {
        NetworkError::Unreachable(e.to_string())
    }
}

/// A 404 on a line endpoint means the line is gone, which is non-fatal.
fn line_not_found(error: CartError, line_id: LineId) -> CartError {
    match error {
        CartError::Network(NetworkError::Status { status, .. })
            if status == StatusCode::NOT_FOUND.as_u16() =>
        {
            NotFoundError::Line(line_id).into()
        }
        other => other,
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
