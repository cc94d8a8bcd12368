//! Request bodies and headers of the server cart API.
//!
//! Responses are full cart documents ([`vendorcart_core::CartDocument`]).

use serde::{Deserialize, Serialize};
use vendorcart_core::{LineKey, ProductId, VendorId};

/// Header carrying the vendor a request is scoped to.
pub const VENDOR_ID_HEADER: &str = "x-vendor-id";

/// `POST /cart/add` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub vendor_id: VendorId,
}

impl AddLineRequest {
    /// Line key the request aggregates under.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id, self.variant.clone())
    }
}

/// `PUT /cart/items/{id}` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}
