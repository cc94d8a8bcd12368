//! Cart inspection and reconciliation commands.
//!
//! # Usage
//!
//! ```bash
//! # Print a stored guest cart, repriced
//! vc-cli cart show --vendor 1 --owner guest:6f1c0c9e-2d4b-4b8e-9a55-3f0e2b7d1a10
//!
//! # Reprice a cart document and check its reported totals
//! vc-cli cart price cart.json --tax-rate 0.08
//!
//! # Merge a guest cart document into a server cart document
//! vc-cli cart merge --local guest.json --server server.json
//!
//! # Move a stored guest cart into a customer's server cart
//! VENDORCART_ACCESS_TOKEN=tok_customer vc-cli cart login --vendor 1 --owner guest:6f1c...
//! ```
//!
//! # Environment Variables
//!
//! - `VENDORCART_TAX_RATES` - Per-vendor tax rates, used when `--tax-rate` is absent
//! - `VENDORCART_DATA_DIR` - Guest cart directory (default: `./data/carts`)
//! - `VENDORCART_ACCESS_TOKEN` - Customer access token (login only)
//! - `VENDORCART_API_URL` - Server cart API base URL (login only)
//! - `VENDORCART_REQUEST_TIMEOUT_SECS` - Per-request timeout (login only)

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use thiserror::Error;
use vendorcart_core::{
    CartDocument, CartError, CartScope, LineKey, MergeStep, OwnerRef, PricingCalculator,
    Reconciliation, TaxRate, VendorId, merge,
};
use vendorcart_storefront::client::ServerCartClient;
use vendorcart_storefront::config::{ConfigError, ServerApiConfig, TaxTable};
use vendorcart_storefront::persistence::{FileCartRepository, LocalCartStorage};
use vendorcart_storefront::session::{self, GuestCart};

const TAX_RATES_VAR: &str = "VENDORCART_TAX_RATES";

/// Errors from cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid cart document in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("No stored cart for {0}")]
    NotStored(CartScope),

    #[error("{0} is not a guest cart")]
    NotGuest(OwnerRef),

    #[error("Login failed, guest cart kept: {0}")]
    Login(CartError),
}

/// A repriced cart document and whether its reported totals held up.
#[derive(Debug)]
pub struct PriceReport {
    /// The document with recomputed totals.
    pub document: CartDocument,
    /// `true` if the input's subtotal, tax and total were all correct.
    pub totals_match: bool,
}

/// Resolve the calculator for `vendor_id`.
///
/// An explicit rate wins. Otherwise the vendor's rate is read from
/// `VENDORCART_TAX_RATES`.
///
/// # Errors
///
/// Returns an error if no rate is given and the vendor has none configured.
pub fn calculator(
    vendor_id: VendorId,
    tax_rate: Option<TaxRate>,
) -> Result<PricingCalculator, CartCommandError> {
    if let Some(rate) = tax_rate {
        return Ok(PricingCalculator::new(rate));
    }

    dotenvy::dotenv().ok();
    let raw = std::env::var(TAX_RATES_VAR)
        .map_err(|_| ConfigError::MissingEnvVar(TAX_RATES_VAR.to_string()))?;
    Ok(TaxTable::parse(&raw, TAX_RATES_VAR)?.calculator(vendor_id)?)
}

/// Load the stored cart of `owner` at `vendor_id` from `data_dir`.
///
/// Unlike the storefront, a missing or unreadable snapshot is an error here.
///
/// # Errors
///
/// Returns an error if nothing is stored or the snapshot cannot be decoded.
pub fn show(
    data_dir: &Path,
    vendor_id: VendorId,
    owner: OwnerRef,
    tax_rate: Option<TaxRate>,
) -> Result<CartDocument, CartCommandError> {
    let calculator = calculator(vendor_id, tax_rate)?;
    let scope = CartScope::new(vendor_id, owner);
    let storage = LocalCartStorage::new(FileCartRepository::new(data_dir));

    let cart = storage
        .try_load(&scope, &calculator)
        .map_err(CartError::from)?
        .ok_or(CartCommandError::NotStored(scope))?;

    tracing::info!(scope = %scope, items = cart.lines().len(), "Loaded stored cart");
    Ok(CartDocument::from(&cart))
}

/// Reprice the cart document at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its items are invalid.
pub fn price(path: &Path, tax_rate: Option<TaxRate>) -> Result<PriceReport, CartCommandError> {
    let reported = read_document(path)?;
    let calculator = calculator(reported.vendor_id, tax_rate)?;
    let cart = reported
        .clone()
        .into_cart(&calculator)
        .map_err(CartError::from)?;

    let totals_match = reported.totals_match(&cart);
    if !totals_match {
        tracing::warn!(
            reported_total = %reported.total,
            total = %cart.total(),
            "Reported totals differ from recomputed totals"
        );
    }

    Ok(PriceReport {
        document: CartDocument::from(&cart),
        totals_match,
    })
}

/// Merge the guest cart document at `local` into the server cart document at
/// `server`, priced at the server cart's vendor rate.
///
/// # Errors
///
/// Returns an error if either document is invalid or the vendors differ.
pub fn merge_documents(
    local: &Path,
    server: &Path,
    tax_rate: Option<TaxRate>,
) -> Result<Reconciliation, CartCommandError> {
    let local = read_document(local)?;
    let server = read_document(server)?;
    let calculator = calculator(server.vendor_id, tax_rate)?;

    let local = local.into_cart(&calculator).map_err(CartError::from)?;
    let server = server.into_cart(&calculator).map_err(CartError::from)?;
    let reconciliation = merge(&local, &server, &calculator).map_err(CartError::from)?;

    tracing::info!(steps = reconciliation.plan.len(), "Merged cart documents");
    Ok(reconciliation)
}

/// Move the stored guest cart of `owner` into the server cart of the customer
/// `access_token` belongs to.
///
/// # Errors
///
/// Returns an error if `owner` is not a guest, configuration is incomplete,
/// or any server request fails. The guest cart is kept on failure.
pub async fn login(
    data_dir: &Path,
    vendor_id: VendorId,
    owner: OwnerRef,
    access_token: SecretString,
    tax_rate: Option<TaxRate>,
) -> Result<CartDocument, CartCommandError> {
    let OwnerRef::Guest(session_id) = owner else {
        return Err(CartCommandError::NotGuest(owner));
    };
    let calculator = calculator(vendor_id, tax_rate)?;
    let api = ServerApiConfig::from_env()?;

    let storage = LocalCartStorage::new(FileCartRepository::new(data_dir));
    let guest = GuestCart::load(storage, session_id, vendor_id, calculator);
    tracing::info!(items = guest.snapshot().lines().len(), "Loaded guest cart");

    let client = ServerCartClient::new(&api, access_token, vendor_id, calculator);
    let cart = session::login(guest, client)
        .await
        .map_err(|failure| CartCommandError::Login(failure.error))?;

    Ok(CartDocument::from(&*cart.snapshot()))
}

/// One-line description of a merge step.
#[must_use]
pub fn describe_step(step: &MergeStep) -> String {
    match step {
        MergeStep::SetQuantity { line_id, quantity } => {
            format!("set   {line_id} -> {quantity}")
        }
        MergeStep::AddLine { product, quantity } => {
            let key = LineKey::new(product.product_id, product.variant.clone());
            format!("add   {key} x {quantity}")
        }
    }
}

fn read_document(path: &Path) -> Result<CartDocument, CartCommandError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CartCommandError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CartCommandError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use vendorcart_core::{
        Cart, CartStore, GuestSessionId, Money, ProductId, ProductRef, UserId,
    };

    use super::*;

    fn rate() -> Option<TaxRate> {
        Some(TaxRate::parse("0.08").unwrap())
    }

    fn vendor() -> VendorId {
        VendorId::new(1)
    }

    fn product(id: i64, price: &str) -> ProductRef {
        ProductRef {
            product_id: ProductId::new(id),
            variant: None,
            name: format!("Product {id}"),
            unit_price: Money::parse(price).unwrap(),
            image_url: None,
            vendor_id: vendor(),
        }
    }

    fn cart(owner: OwnerRef, lines: &[(i64, &str, i64)]) -> Cart {
        let mut store = CartStore::new(owner, vendor(), calculator(vendor(), rate()).unwrap());
        for (id, price, quantity) in lines {
            store.add(&product(*id, price), *quantity).unwrap();
        }
        (*store.snapshot()).clone()
    }

    fn write_document(dir: &Path, name: &str, document: &CartDocument) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(document).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_explicit_rate_wins() {
        let calculator = calculator(VendorId::new(99), rate()).unwrap();
        assert_eq!(calculator.tax_rate(), TaxRate::parse("0.08").unwrap());
    }

    #[test]
    fn test_show_stored_guest_cart() {
        let dir = tempfile::tempdir().unwrap();
        let owner = OwnerRef::Guest(GuestSessionId::generate());
        let stored = cart(owner, &[(1, "10.00", 2)]);
        LocalCartStorage::new(FileCartRepository::new(dir.path())).save(&stored);

        let document = show(dir.path(), vendor(), owner, rate()).unwrap();
        assert_eq!(document.owner_ref, owner);
        assert_eq!(document.items.len(), 1);
        assert_eq!(document.total.to_string(), "21.60");
    }

    #[test]
    fn test_show_missing_cart_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let owner = OwnerRef::Guest(GuestSessionId::generate());
        let result = show(dir.path(), vendor(), owner, rate());
        assert!(matches!(result, Err(CartCommandError::NotStored(_))));
    }

    #[test]
    fn test_show_corrupted_cart_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let owner = OwnerRef::Guest(GuestSessionId::generate());
        let repo = FileCartRepository::new(dir.path());
        std::fs::write(repo.path_for(&CartScope::new(vendor(), owner)), "{not json").unwrap();

        let result = show(dir.path(), vendor(), owner, rate());
        assert!(matches!(result, Err(CartCommandError::Cart(CartError::Persistence(_)))));
    }

    #[test]
    fn test_price_flags_wrong_totals() {
        let dir = tempfile::tempdir().unwrap();
        let owner = OwnerRef::User(UserId::new(42));
        let mut document = CartDocument::from(&cart(owner, &[(1, "29.99", 3)]));
        let correct = price(&write_document(dir.path(), "ok.json", &document), rate()).unwrap();
        assert!(correct.totals_match);
        assert_eq!(correct.document.total.to_string(), "97.17");

        document.total = Money::parse("1.00").unwrap();
        let report = price(&write_document(dir.path(), "bad.json", &document), rate()).unwrap();
        assert!(!report.totals_match);
        assert_eq!(report.document.total.to_string(), "97.17");
    }

    #[test]
    fn test_price_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = price(&dir.path().join("missing.json"), rate());
        assert!(matches!(result, Err(CartCommandError::Read { .. })));

        let path = dir.path().join("junk.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(price(&path, rate()), Err(CartCommandError::Parse { .. })));
    }

    #[test]
    fn test_merge_documents() {
        let dir = tempfile::tempdir().unwrap();
        let guest = OwnerRef::Guest(GuestSessionId::generate());
        let user = OwnerRef::User(UserId::new(42));
        let local = write_document(
            dir.path(),
            "local.json",
            &CartDocument::from(&cart(guest, &[(1, "10.00", 1), (2, "5.00", 2)])),
        );
        let server = write_document(
            dir.path(),
            "server.json",
            &CartDocument::from(&cart(user, &[(1, "10.00", 2)])),
        );

        let reconciliation = merge_documents(&local, &server, rate()).unwrap();
        assert_eq!(reconciliation.cart.owner_ref(), user);
        assert_eq!(reconciliation.cart.item_count(), 5);
        assert_eq!(reconciliation.plan.len(), 2);
        assert!(describe_step(&reconciliation.plan[0]).starts_with("set"));
        assert_eq!(describe_step(&reconciliation.plan[1]), "add   2 x 2");
    }

    #[tokio::test]
    async fn test_login_requires_guest_owner() {
        let dir = tempfile::tempdir().unwrap();
        let owner = OwnerRef::User(UserId::new(42));
        let result = login(
            dir.path(),
            vendor(),
            owner,
            SecretString::from("tok".to_string()),
            rate(),
        )
        .await;
        assert!(matches!(result, Err(CartCommandError::NotGuest(o)) if o == owner));
    }
}
