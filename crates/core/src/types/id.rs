//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Line and guest
//! session identities are UUIDs and get their own types below.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
/// - `FromStr` for parsing from headers and command-line arguments
///
/// # Example
///
/// ```rust
/// # use vendorcart_core::define_id;
/// define_id!(ShopId);
/// define_id!(WarehouseId);
///
/// let shop = ShopId::new(1);
/// let warehouse = WarehouseId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ShopId = warehouse;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(VendorId);
define_id!(UserId);

/// Identity of a single cart line.
///
/// Assigned when a line is first created (locally or by the server) and used
/// by the server API to address the line (`/cart/items/{id}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    /// Assign a fresh line identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identity of an anonymous (not yet authenticated) shopper session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestSessionId(Uuid);

impl GuestSessionId {
    /// Start a new guest session identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for GuestSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when parsing an [`OwnerRef`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OwnerRefError {
    /// The value has no `guest:` or `user:` prefix.
    #[error("owner reference must start with 'guest:' or 'user:'")]
    UnknownKind,
    /// The guest session id is not a UUID.
    #[error("invalid guest session id: {0}")]
    InvalidGuest(String),
    /// The user id is not an integer.
    #[error("invalid user id: {0}")]
    InvalidUser(String),
}

/// The session identity a cart belongs to.
///
/// Serialized as `guest:<uuid>` or `user:<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerRef {
    /// Anonymous shopper, cart held in local storage.
    Guest(GuestSessionId),
    /// Authenticated customer, cart held by the server.
    User(UserId),
}

impl OwnerRef {
    /// Returns `true` if this is an anonymous session.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest(id) => write!(f, "guest:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

impl FromStr for OwnerRef {
    type Err = OwnerRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("guest:") {
            return Uuid::parse_str(rest)
                .map(|id| Self::Guest(GuestSessionId(id)))
                .map_err(|_| OwnerRefError::InvalidGuest(rest.to_string()));
        }
        if let Some(rest) = s.strip_prefix("user:") {
            return rest
                .parse::<UserId>()
                .map(Self::User)
                .map_err(|_| OwnerRefError::InvalidUser(rest.to_string()));
        }
        Err(OwnerRefError::UnknownKind)
    }
}

impl Serialize for OwnerRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OwnerRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_define_id_round_trips_through_str() {
        let id: ProductId = "123".parse().unwrap();
        assert_eq!(id, ProductId::new(123));
        assert_eq!(id.to_string(), "123");
        assert!("abc".parse::<VendorId>().is_err());
    }

    #[test]
    fn test_owner_ref_display_and_parse() {
        let user = OwnerRef::User(UserId::new(42));
        assert_eq!(user.to_string(), "user:42");
        assert_eq!("user:42".parse::<OwnerRef>().unwrap(), user);

        let guest = OwnerRef::Guest(GuestSessionId::generate());
        let parsed: OwnerRef = guest.to_string().parse().unwrap();
        assert_eq!(parsed, guest);
        assert!(parsed.is_guest());
    }

    #[test]
    fn test_owner_ref_parse_errors() {
        assert_eq!("42".parse::<OwnerRef>(), Err(OwnerRefError::UnknownKind));
        assert!(matches!(
            "guest:not-a-uuid".parse::<OwnerRef>(),
            Err(OwnerRefError::InvalidGuest(_))
        ));
        assert!(matches!(
            "user:x".parse::<OwnerRef>(),
            Err(OwnerRefError::InvalidUser(_))
        ));
    }

    #[test]
    fn test_owner_ref_serde_is_a_string() {
        let owner = OwnerRef::User(UserId::new(7));
        let json = serde_json::to_string(&owner).unwrap();
        assert_eq!(json, "\"user:7\"");
        let back: OwnerRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, owner);
    }
}
