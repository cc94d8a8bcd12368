//! HTTP routes for the cart API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health            - Health check
//!
//! # Cart (Authorization: Bearer <token>, X-Vendor-Id: <vendor>)
//! GET    /cart              - Current cart
//! POST   /cart/add          - Add a catalog product
//! PUT    /cart/items/{id}   - Set a line's quantity (below 1 removes it)
//! DELETE /cart/items/{id}   - Remove a line
//! DELETE /cart              - Remove every line
//! ```

pub mod cart;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/add", post(cart::add))
        .route("/items/{id}", put(cart::update).delete(cart::remove))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/cart", cart_routes())
}

/// Build the complete application with middleware and state.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::config::{CustomerTokens, ServerApiConfig, StorefrontConfig, TaxTable};
    use crate::middleware::REQUEST_ID_HEADER;

    fn test_app() -> Router {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            data_dir: PathBuf::from("./data/carts"),
            tax_rates: TaxTable::parse("1=0.08", "TEST").unwrap(),
            api: ServerApiConfig {
                base_url: "http://127.0.0.1:3000".parse().unwrap(),
                request_timeout: Duration::from_secs(10),
            },
            catalog_path: None,
            customer_tokens: CustomerTokens::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let customers = Arc::new(CustomerTokens::parse("tok_a=1", "TEST").unwrap());
        app(AppState::new(
            config,
            Arc::new(StaticCatalog::default()),
            customers,
        ))
    }

    async fn status(request: Request<Body>) -> StatusCode {
        test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_upstream_request_id_is_echoed() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
    }

    #[tokio::test]
    async fn test_cart_requires_bearer_token() {
        let request = Request::get("/cart")
            .header("x-vendor-id", "1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(request).await, StatusCode::UNAUTHORIZED);

        let request = Request::get("/cart")
            .header("authorization", "Bearer tok_unknown")
            .header("x-vendor-id", "1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cart_requires_vendor_header() {
        let request = Request::get("/cart")
            .header("authorization", "Bearer tok_a")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unconfigured_vendor_is_server_error() {
        let request = Request::get("/cart")
            .header("authorization", "Bearer tok_a")
            .header("x-vendor-id", "2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(request).await, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let request = Request::post("/cart/add")
            .header("authorization", "Bearer tok_a")
            .header("x-vendor-id", "1")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"productId": 1, "quantity": 1, "vendorId": 1}"#))
            .unwrap();
        assert_eq!(status(request).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let request = Request::get("/cart")
            .header("authorization", "Bearer tok_a")
            .header("x-vendor-id", "1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(request).await, StatusCode::OK);
    }
}
