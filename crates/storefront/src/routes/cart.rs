//! Cart route handlers.
//!
//! Every handler locks the caller's cart for one mutation and answers with the
//! full cart document.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use vendorcart_core::{Cart, CartDocument, LineId, NotFoundError, ValidationError};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CartOwner;
use crate::state::AppState;
use crate::wire::{AddLineRequest, SetQuantityRequest};

fn document(cart: &Cart) -> Json<CartDocument> {
    Json(CartDocument::from(cart))
}

/// `GET /cart`
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, owner: CartOwner) -> Result<Json<CartDocument>> {
    let handle = state.cart(owner.user_id, owner.vendor_id).await?;
    let store = handle.lock().await;
    Ok(document(&store.snapshot()))
}

/// `POST /cart/add`
///
/// The line is priced from the catalog; the request only names the product.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    owner: CartOwner,
    Json(request): Json<AddLineRequest>,
) -> Result<Json<CartDocument>> {
    if request.vendor_id != owner.vendor_id {
        return Err(ValidationError::VendorMismatch {
            expected: owner.vendor_id,
            actual: request.vendor_id,
        }
        .into());
    }

    let key = request.key();
    let product = state
        .catalog()
        .product(owner.vendor_id, &key)
        .ok_or_else(|| AppError::NotFound(format!("product {key}")))?;

    let handle = state.cart(owner.user_id, owner.vendor_id).await?;
    let mut store = handle.lock().await;
    let cart = store.add(&product, request.quantity)?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product", key.to_string()),
            ("quantity", request.quantity.to_string()),
        ],
    );
    Ok(document(&cart))
}

/// `PUT /cart/items/{id}`
///
/// A quantity below 1 removes the line.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    owner: CartOwner,
    Path(line_id): Path<LineId>,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<CartDocument>> {
    let handle = state.cart(owner.user_id, owner.vendor_id).await?;
    let mut store = handle.lock().await;
    let key = store
        .snapshot()
        .line_by_id(line_id)
        .map(|line| line.key().clone())
        .ok_or(NotFoundError::Line(line_id))?;
    let cart = store.update(&key, request.quantity)?;

    add_breadcrumb(
        "cart",
        "Updated cart line",
        &[
            ("product", key.to_string()),
            ("quantity", request.quantity.to_string()),
        ],
    );
    Ok(document(&cart))
}

/// `DELETE /cart/items/{id}`
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    owner: CartOwner,
    Path(line_id): Path<LineId>,
) -> Result<Json<CartDocument>> {
    let handle = state.cart(owner.user_id, owner.vendor_id).await?;
    let mut store = handle.lock().await;
    let key = store
        .snapshot()
        .line_by_id(line_id)
        .map(|line| line.key().clone())
        .ok_or(NotFoundError::Line(line_id))?;
    let cart = store.remove(&key)?;

    add_breadcrumb("cart", "Removed cart line", &[("product", key.to_string())]);
    Ok(document(&cart))
}

/// `DELETE /cart`
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>, owner: CartOwner) -> Result<Json<CartDocument>> {
    let handle = state.cart(owner.user_id, owner.vendor_id).await?;
    let cart = handle.lock().await.clear();

    add_breadcrumb("cart", "Cleared cart", &[]);
    Ok(document(&cart))
}
