//! Guest-to-customer login reconciliation against a running cart API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use vendorcart_core::{
    CartError, CartRepository, GuestSessionId, LineKey, Money, NetworkError, ProductId,
    ProductRef,
};
use vendorcart_integration_tests::{TestServer, VENDOR, calculator, product, unreachable_client};
use vendorcart_storefront::persistence::{FileCartRepository, LocalCartStorage};
use vendorcart_storefront::session::{GuestCart, login};

fn guest(dir: &std::path::Path, session: GuestSessionId) -> GuestCart<FileCartRepository> {
    GuestCart::load(
        LocalCartStorage::new(FileCartRepository::new(dir)),
        session,
        VENDOR,
        calculator(),
    )
}

#[tokio::test]
async fn test_login_merges_into_server_cart() {
    let server = TestServer::spawn().await;
    server
        .client()
        .add_line(ProductId::new(123), Some("M".to_string()), 3)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let session = GuestSessionId::generate();
    let mut local = guest(dir.path(), session);
    local.add(&product(123, Some("M")), 2).unwrap();
    local.add(&product(7, None), 1).unwrap();
    let scope = local.scope();

    let customer = login(local, server.client()).await.unwrap();
    let cart = customer.snapshot();

    assert_eq!(cart.lines().len(), 2);
    assert_eq!(
        cart.lines()[0].key(),
        &LineKey::new(ProductId::new(123), Some("M".to_string()))
    );
    assert_eq!(cart.lines()[0].quantity(), 5);
    assert_eq!(cart.lines()[1].key(), &LineKey::new(ProductId::new(7), None));
    assert_eq!(cart.lines()[1].quantity(), 1);
    assert_eq!(cart.subtotal().to_string(), "162.45");

    // The server now holds the merged cart and the local snapshot is gone
    assert_eq!(server.client().fetch().await.unwrap(), *cart);
    let repo = FileCartRepository::new(dir.path());
    assert!(repo.load(&scope).unwrap().is_none());
    assert!(guest(dir.path(), session).snapshot().is_empty());
}

#[tokio::test]
async fn test_login_with_empty_guest_cart() {
    let server = TestServer::spawn().await;
    let before = server
        .client()
        .add_line(ProductId::new(7), None, 2)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let local = guest(dir.path(), GuestSessionId::generate());

    let customer = login(local, server.client()).await.unwrap();
    assert_eq!(*customer.snapshot(), before);
}

#[tokio::test]
async fn test_login_failure_keeps_guest_cart() {
    let dir = tempfile::tempdir().unwrap();
    let session = GuestSessionId::generate();
    let mut local = guest(dir.path(), session);
    local.add(&product(123, None), 2).unwrap();
    let before = local.snapshot();
    let scope = local.scope();

    let failure = login(local, unreachable_client()).await.unwrap_err();
    assert!(matches!(failure.error, CartError::Network(_)));
    assert_eq!(failure.guest.snapshot(), before);

    let repo = FileCartRepository::new(dir.path());
    assert!(repo.load(&scope).unwrap().is_some());
    assert_eq!(guest(dir.path(), session).snapshot(), before);
}

#[tokio::test]
async fn test_rejected_step_keeps_local_snapshot() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let session = GuestSessionId::generate();
    let mut local = guest(dir.path(), session);

    // A product the server's catalog does not carry
    let discontinued = ProductRef {
        product_id: ProductId::new(555),
        variant: None,
        name: "Discontinued".to_string(),
        unit_price: Money::parse("4.00").unwrap(),
        image_url: None,
        vendor_id: VENDOR,
    };
    local.add(&discontinued, 1).unwrap();
    let before = local.snapshot();

    let failure = login(local, server.client()).await.unwrap_err();
    assert!(matches!(
        failure.error,
        CartError::Network(NetworkError::Status { status: 404, .. })
    ));
    assert_eq!(guest(dir.path(), session).snapshot(), before);
}

#[tokio::test]
async fn test_second_login_does_not_double_count() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let session = GuestSessionId::generate();

    let mut local = guest(dir.path(), session);
    local.add(&product(9, None), 3).unwrap();
    login(local, server.client()).await.unwrap();

    // Same guest session logs in again from a fresh page load
    let reloaded = guest(dir.path(), session);
    let customer = login(reloaded, server.client()).await.unwrap();
    assert_eq!(customer.snapshot().item_count(), 3);
}
