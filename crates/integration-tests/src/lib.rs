//! Integration tests for vendorcart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vendorcart-integration-tests
//! ```
//!
//! Each test binds its own reference cart API to `127.0.0.1:0` with a fixed
//! catalog and token set, then drives it through the storefront client.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use vendorcart_core::{Money, PricingCalculator, ProductId, ProductRef, TaxRate, VendorId};
use vendorcart_storefront::catalog::StaticCatalog;
use vendorcart_storefront::client::ServerCartClient;
use vendorcart_storefront::config::{CustomerTokens, ServerApiConfig, StorefrontConfig, TaxTable};
use vendorcart_storefront::routes;
use vendorcart_storefront::state::AppState;

/// Vendor with a configured 8% tax rate.
pub const VENDOR: VendorId = VendorId::new(1);

/// Vendor with a tax rate but no products.
pub const OTHER_VENDOR: VendorId = VendorId::new(2);

/// Token issued to customer 42.
pub const CUSTOMER_TOKEN: &str = "tok_customer_42";

/// Token issued to customer 43.
pub const OTHER_CUSTOMER_TOKEN: &str = "tok_customer_43";

const CATALOG: &str = r#"[
    {"productId": 123, "name": "Tee", "unitPrice": "29.99", "vendorId": 1},
    {"productId": 7, "name": "Mug", "unitPrice": "12.50", "imageUrl": "https://img.example/mug.png", "vendorId": 1},
    {"productId": 9, "name": "Sticker", "unitPrice": "0.33", "vendorId": 1}
]"#;

/// 8% calculator matching the server's rate for [`VENDOR`].
#[must_use]
pub fn calculator() -> PricingCalculator {
    PricingCalculator::new(TaxRate::parse("0.08").unwrap_or(TaxRate::EXEMPT))
}

/// Catalog entry for `product_id` in [`VENDOR`]'s catalog.
///
/// # Panics
///
/// Panics if the product is not in the test catalog.
#[must_use]
pub fn product(product_id: i64, variant: Option<&str>) -> ProductRef {
    let (name, price) = match product_id {
        123 => ("Tee", "29.99"),
        7 => ("Mug", "12.50"),
        9 => ("Sticker", "0.33"),
        other => panic!("product {other} is not in the test catalog"),
    };
    ProductRef {
        product_id: ProductId::new(product_id),
        variant: variant.map(str::to_string),
        name: name.to_string(),
        unit_price: Money::parse(price).unwrap_or(Money::ZERO),
        image_url: None,
        vendor_id: VENDOR,
    }
}

/// A running reference cart API.
pub struct TestServer {
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Bind the cart API to an ephemeral port and serve it in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().expect("valid host"),
            port: 0,
            data_dir: PathBuf::from("./data/carts"),
            tax_rates: TaxTable::parse("1=0.08,2=0", "TEST_TAX_RATES").expect("valid tax rates"),
            api: ServerApiConfig {
                base_url: "http://127.0.0.1:3000".parse().expect("valid url"),
                request_timeout: Duration::from_secs(10),
            },
            catalog_path: None,
            customer_tokens: CustomerTokens::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let catalog = StaticCatalog::from_json(CATALOG).expect("valid catalog");
        let customers = CustomerTokens::parse(
            &format!("{CUSTOMER_TOKEN}=42,{OTHER_CUSTOMER_TOKEN}=43"),
            "TEST_TOKENS",
        )
        .expect("valid tokens");

        let state = AppState::new(config, Arc::new(catalog), Arc::new(customers));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, routes::app(state)).await;
        });

        Self { addr, handle }
    }

    /// Base URL of the running server.
    ///
    /// # Panics
    ///
    /// Panics if the address does not form a URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        format!("http://{}/", self.addr).parse().expect("valid url")
    }

    /// Client for `token` at `vendor_id` with the given timeout.
    #[must_use]
    pub fn client_with_timeout(
        &self,
        token: &str,
        vendor_id: VendorId,
        request_timeout: Duration,
    ) -> ServerCartClient {
        ServerCartClient::new(
            &ServerApiConfig {
                base_url: self.base_url(),
                request_timeout,
            },
            SecretString::from(token.to_string()),
            vendor_id,
            calculator(),
        )
    }

    /// Client for customer 42 at [`VENDOR`].
    #[must_use]
    pub fn client(&self) -> ServerCartClient {
        self.client_with_timeout(CUSTOMER_TOKEN, VENDOR, Duration::from_secs(5))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Client pointed at a port nothing listens on.
///
/// # Panics
///
/// Never; the URL is a constant.
#[must_use]
pub fn unreachable_client() -> ServerCartClient {
    ServerCartClient::new(
        &ServerApiConfig {
            base_url: "http://127.0.0.1:9/".parse().expect("valid url"),
            request_timeout: Duration::from_millis(500),
        },
        SecretString::from(CUSTOMER_TOKEN.to_string()),
        VENDOR,
        calculator(),
    )
}
