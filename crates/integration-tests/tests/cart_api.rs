//! End-to-end tests of the server cart API through the storefront client.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use vendorcart_core::{CartError, LineId, LineKey, NetworkError, NotFoundError, ProductId};
use vendorcart_integration_tests::{
    CUSTOMER_TOKEN, OTHER_CUSTOMER_TOKEN, OTHER_VENDOR, TestServer, VENDOR, product,
    unreachable_client,
};
use vendorcart_storefront::session::ServerCart;

// ============================================================================
// Pricing
// ============================================================================

#[tokio::test]
async fn test_same_product_sums_and_prices() {
    let server = TestServer::spawn().await;
    let client = server.client();

    client
        .add_line(ProductId::new(123), Some("M/Red".to_string()), 1)
        .await
        .unwrap();
    let cart = client
        .add_line(ProductId::new(123), Some("M/Red".to_string()), 2)
        .await
        .unwrap();

    assert_eq!(cart.lines().len(), 1);
    let line = &cart.lines()[0];
    assert_eq!(line.quantity(), 3);
    assert_eq!(line.name(), "Tee");
    assert_eq!(line.key().variant.as_deref(), Some("M/Red"));
    assert_eq!(cart.subtotal().to_string(), "89.97");
    assert_eq!(cart.tax().to_string(), "7.20");
    assert_eq!(cart.total().to_string(), "97.17");
}

#[tokio::test]
async fn test_cart_document_shape() {
    let server = TestServer::spawn().await;
    server.client().add_line(ProductId::new(7), None, 2).await.unwrap();

    let body: serde_json::Value = reqwest::Client::new()
        .get(server.base_url().join("cart").unwrap())
        .bearer_auth(CUSTOMER_TOKEN)
        .header("x-vendor-id", "1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["ownerRef"], "user:42");
    assert_eq!(body["vendorId"], 1);
    assert_eq!(body["subtotal"], "25.00");
    assert_eq!(body["tax"], "2.00");
    assert_eq!(body["total"], "27.00");
    assert_eq!(body["items"][0]["productId"], 7);
    assert_eq!(body["items"][0]["unitPrice"], "12.50");
    assert_eq!(body["items"][0]["imageUrl"], "https://img.example/mug.png");
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_server_cart_lifecycle() {
    let server = TestServer::spawn().await;
    let cart = ServerCart::open(server.client()).await.unwrap();
    assert!(cart.snapshot().is_empty());

    cart.add(&product(123, Some("M")), 1).await.unwrap();
    cart.add(&product(7, None), 1).await.unwrap();

    let tee = LineKey::new(ProductId::new(123), Some("M".to_string()));
    let updated = cart.update(&tee, 4).await.unwrap();
    assert_eq!(updated.line(&tee).unwrap().quantity(), 4);
    assert_eq!(updated.lines()[0].key(), &tee, "update keeps line position");

    let mug = LineKey::new(ProductId::new(7), None);
    let removed = cart.remove(&mug).await.unwrap();
    assert!(removed.line(&mug).is_none());
    assert_eq!(removed.item_count(), 4);

    let cleared = cart.clear().await.unwrap();
    assert!(cleared.is_empty());
    assert_eq!(cleared.subtotal().to_string(), "0.00");
    assert_eq!(cleared.tax().to_string(), "0.00");
    assert_eq!(cleared.total().to_string(), "0.00");
}

#[tokio::test]
async fn test_update_below_one_removes_line() {
    let server = TestServer::spawn().await;
    let cart = ServerCart::open(server.client()).await.unwrap();
    cart.add(&product(9, None), 3).await.unwrap();

    let key = LineKey::new(ProductId::new(9), None);
    let updated = cart.update(&key, 0).await.unwrap();
    assert!(updated.is_empty());
}

#[tokio::test]
async fn test_line_ids_are_stable() {
    let server = TestServer::spawn().await;
    let client = server.client();

    let first = client.add_line(ProductId::new(7), None, 1).await.unwrap();
    let second = client.add_line(ProductId::new(7), None, 1).await.unwrap();
    assert_eq!(first.lines()[0].id(), second.lines()[0].id());

    let line_id = second.lines()[0].id();
    let updated = client.set_quantity(line_id, 10).await.unwrap();
    assert_eq!(updated.lines()[0].id(), line_id);
    assert_eq!(updated.item_count(), 10);
}

#[tokio::test]
async fn test_concurrent_adds_all_land() {
    let server = TestServer::spawn().await;
    let cart = Arc::new(ServerCart::open(server.client()).await.unwrap());

    let tee = product(123, None);
    let mug = product(7, None);
    let (a, b) = tokio::join!(cart.add(&tee, 1), cart.add(&mug, 2));
    a.unwrap();
    b.unwrap();

    let snapshot = cart.snapshot();
    assert_eq!(snapshot.item_count(), 3);
    assert_eq!(*snapshot, server.client().fetch().await.unwrap());
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_non_positive_quantity_rejected_by_server() {
    let server = TestServer::spawn().await;
    let response = reqwest::Client::new()
        .post(server.base_url().join("cart/add").unwrap())
        .bearer_auth(CUSTOMER_TOKEN)
        .header("x-vendor-id", "1")
        .json(&serde_json::json!({"productId": 7, "quantity": 0, "vendorId": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let cart = server.client().fetch().await.unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_vendor_header_and_body_must_agree() {
    let server = TestServer::spawn().await;
    let response = reqwest::Client::new()
        .post(server.base_url().join("cart/add").unwrap())
        .bearer_auth(CUSTOMER_TOKEN)
        .header("x-vendor-id", "1")
        .json(&serde_json::json!({"productId": 7, "quantity": 1, "vendorId": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_line_is_not_found() {
    let server = TestServer::spawn().await;
    let line_id = LineId::generate();
    let result = server.client().remove_line(line_id).await;
    assert!(matches!(
        result,
        Err(CartError::NotFound(NotFoundError::Line(id))) if id == line_id
    ));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let server = TestServer::spawn().await;
    let result = server.client().add_line(ProductId::new(999), None, 1).await;
    assert!(matches!(
        result,
        Err(CartError::Network(NetworkError::Status { status: 404, .. }))
    ));
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = server.client_with_timeout("tok_nobody", VENDOR, Duration::from_secs(5));
    assert!(matches!(
        client.fetch().await,
        Err(CartError::Network(NetworkError::Status { status: 401, .. }))
    ));
}

#[tokio::test]
async fn test_unreachable_server() {
    assert!(matches!(
        unreachable_client().fetch().await,
        Err(CartError::Network(
            NetworkError::Unreachable(_) | NetworkError::Timeout
        ))
    ));
}

// ============================================================================
// Isolation
// ============================================================================

#[tokio::test]
async fn test_carts_are_scoped_by_customer_and_vendor() {
    let server = TestServer::spawn().await;
    server.client().add_line(ProductId::new(7), None, 1).await.unwrap();

    let other_customer =
        server.client_with_timeout(OTHER_CUSTOMER_TOKEN, VENDOR, Duration::from_secs(5));
    assert!(other_customer.fetch().await.unwrap().is_empty());

    let other_vendor = server.client_with_timeout(CUSTOMER_TOKEN, OTHER_VENDOR, Duration::from_secs(5));
    let cart = other_vendor.fetch().await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.vendor_id(), OTHER_VENDOR);

    assert_eq!(server.client().fetch().await.unwrap().item_count(), 1);
}
