//! Cart sessions: a guest cart kept in local storage, a customer cart kept on
//! the server, and the login flow that turns the first into the second.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, instrument, warn};
use vendorcart_core::{
    Cart, CartError, CartLine, CartRepository, CartScope, CartStore, GuestSessionId, LineId,
    LineKey, MergeStep, NotFoundError, OwnerRef, PricingCalculator, ProductRef, VendorId, merge,
};

use crate::client::{Result, ServerCartClient};
use crate::persistence::LocalCartStorage;

// =============================================================================
// GuestCart
// =============================================================================

/// Cart of an unauthenticated visitor, saved locally after every mutation.
pub struct GuestCart<R> {
    store: CartStore,
    storage: LocalCartStorage<R>,
}

impl<R: CartRepository> GuestCart<R> {
    /// Load the guest's stored cart, or start an empty one.
    pub fn load(
        storage: LocalCartStorage<R>,
        session_id: GuestSessionId,
        vendor_id: VendorId,
        calculator: PricingCalculator,
    ) -> Self {
        let scope = CartScope::new(vendor_id, OwnerRef::Guest(session_id));
        let cart = storage.load(&scope, &calculator);
        Self {
            store: CartStore::from_cart(cart, calculator),
            storage,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Cart> {
        self.store.snapshot()
    }

    /// Storage scope of this cart.
    pub fn scope(&self) -> CartScope {
        let cart = self.store.snapshot();
        CartScope::new(cart.vendor_id(), cart.owner_ref())
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the input is rejected.
    pub fn add(&mut self, product: &ProductRef, quantity: i64) -> Result<Arc<Cart>> {
        let cart = self.store.add(product, quantity)?;
        self.storage.save(&cart);
        Ok(cart)
    }

    /// Set the quantity of the line for `key`. Below 1 removes the line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart has no such line.
    pub fn update(&mut self, key: &LineKey, quantity: i64) -> Result<Arc<Cart>> {
        let cart = self.store.update(key, quantity)?;
        self.storage.save(&cart);
        Ok(cart)
    }

    /// Remove the line for `key`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart has no such line.
    pub fn remove(&mut self, key: &LineKey) -> Result<Arc<Cart>> {
        let cart = self.store.remove(key)?;
        self.storage.save(&cart);
        Ok(cart)
    }

    /// Remove every line.
    pub fn clear(&mut self) -> Arc<Cart> {
        let cart = self.store.clear();
        self.storage.save(&cart);
        cart
    }

    /// Drop the local snapshot once the cart has moved to the server.
    fn discard(self) {
        self.storage.clear(&self.scope());
    }
}

// =============================================================================
// ServerCart
// =============================================================================

/// Cart of an authenticated customer, held by the server.
///
/// Operations may overlap. Requests are sent one at a time in the order the
/// operations were issued, and each takes a sequence number; a response is
/// applied only if no later response has been applied already, so a slow
/// early response never overwrites a newer cart. A failed request leaves the
/// snapshot at its last known-good state.
#[derive(Debug)]
pub struct ServerCart {
    client: ServerCartClient,
    dispatch: tokio::sync::Mutex<()>,
    state: Mutex<Sequenced>,
}

#[derive(Debug)]
struct Sequenced {
    issued: u64,
    applied: u64,
    cart: Arc<Cart>,
}

impl ServerCart {
    /// Fetch the customer's cart.
    ///
    /// # Errors
    ///
    /// Returns a `NetworkError` if the cart cannot be fetched.
    pub async fn open(client: ServerCartClient) -> Result<Self> {
        let cart = client.fetch().await?;
        Ok(Self::from_cart(client, cart))
    }

    /// Start from a cart the server has just returned.
    #[must_use]
    pub fn from_cart(client: ServerCartClient, cart: Cart) -> Self {
        Self {
            client,
            dispatch: tokio::sync::Mutex::new(()),
            state: Mutex::new(Sequenced {
                issued: 0,
                applied: 0,
                cart: Arc::new(cart),
            }),
        }
    }

    /// Client the session talks through.
    #[must_use]
    pub const fn client(&self) -> &ServerCartClient {
        &self.client
    }

    /// Last applied snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Cart> {
        Arc::clone(&self.lock().cart)
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for rejected input or a `NetworkError` if
    /// the request fails.
    pub async fn add(&self, product: &ProductRef, quantity: i64) -> Result<Arc<Cart>> {
        let _dispatch = self.dispatch.lock().await;
        let seq = self.issue();
        let cart = self.client.add(product, quantity).await?;
        Ok(self.apply(seq, cart))
    }

    /// Set the quantity of the line for `key`. Below 1 removes the line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the snapshot has no such line, or a
    /// `NetworkError` if the request fails.
    pub async fn update(&self, key: &LineKey, quantity: i64) -> Result<Arc<Cart>> {
        let _dispatch = self.dispatch.lock().await;
        let line_id = self.line_id(key)?;
        let seq = self.issue();
        let cart = self.client.set_quantity(line_id, quantity).await?;
        Ok(self.apply(seq, cart))
    }

    /// Remove the line for `key`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the snapshot has no such line, or a
    /// `NetworkError` if the request fails.
    pub async fn remove(&self, key: &LineKey) -> Result<Arc<Cart>> {
        let _dispatch = self.dispatch.lock().await;
        let line_id = self.line_id(key)?;
        let seq = self.issue();
        let cart = self.client.remove_line(line_id).await?;
        Ok(self.apply(seq, cart))
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns a `NetworkError` if the request fails.
    pub async fn clear(&self) -> Result<Arc<Cart>> {
        let _dispatch = self.dispatch.lock().await;
        let seq = self.issue();
        let cart = self.client.clear().await?;
        Ok(self.apply(seq, cart))
    }

    /// Re-fetch the cart.
    ///
    /// # Errors
    ///
    /// Returns a `NetworkError` if the request fails.
    pub async fn refresh(&self) -> Result<Arc<Cart>> {
        let _dispatch = self.dispatch.lock().await;
        let seq = self.issue();
        let cart = self.client.fetch().await?;
        Ok(self.apply(seq, cart))
    }

    fn line_id(&self, key: &LineKey) -> Result<LineId> {
        self.lock()
            .cart
            .line(key)
            .map(CartLine::id)
            .ok_or_else(|| NotFoundError::Key(key.clone()).into())
    }

    fn issue(&self) -> u64 {
        let mut state = self.lock();
        state.issued += 1;
        state.issued
    }

    /// Apply the response to request `seq` unless a newer one was applied.
    /// Returns the snapshot in effect afterwards.
    fn apply(&self, seq: u64, cart: Cart) -> Arc<Cart> {
        let mut state = self.lock();
        if seq <= state.applied {
            debug!(seq, applied = state.applied, "Discarding stale cart response");
        } else {
            state.applied = seq;
            state.cart = Arc::new(cart);
        }
        Arc::clone(&state.cart)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sequenced> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Login
// =============================================================================

/// Failed login. The guest cart and its local snapshot are untouched.
pub struct LoginFailure<R> {
    /// Guest cart to keep using.
    pub guest: GuestCart<R>,
    /// Why the login did not complete.
    pub error: CartError,
}

impl<R> std::fmt::Debug for LoginFailure<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFailure")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Move a guest cart to the customer's server cart.
///
/// Fetches the server cart, merges the guest cart into it, and replays the
/// merge plan against the server. The local snapshot is cleared only after
/// every step succeeded, so a failed login can be retried with the guest cart
/// intact.
///
/// # Errors
///
/// Returns the guest cart together with the error if any request fails or the
/// carts belong to different vendors.
#[instrument(skip_all, fields(vendor_id = %client.vendor_id()))]
pub async fn login<R: CartRepository>(
    guest: GuestCart<R>,
    client: ServerCartClient,
) -> std::result::Result<ServerCart, LoginFailure<R>> {
    match reconcile(&guest, &client).await {
        Ok(cart) => {
            guest.discard();
            info!(items = cart.lines().len(), "Guest cart moved to server");
            Ok(ServerCart::from_cart(client, cart))
        }
        Err(error) => {
            warn!(error = %error, "Login reconciliation failed, keeping guest cart");
            Err(LoginFailure { guest, error })
        }
    }
}

async fn reconcile<R: CartRepository>(
    guest: &GuestCart<R>,
    client: &ServerCartClient,
) -> Result<Cart> {
    let server = client.fetch().await?;
    let local = guest.snapshot();
    let reconciliation = merge(&local, &server, client.calculator())?;

    let mut cart = server;
    for step in &reconciliation.plan {
        cart = match step {
            MergeStep::SetQuantity { line_id, quantity } => {
                client.set_quantity(*line_id, i64::from(*quantity)).await?
            }
            MergeStep::AddLine { product, quantity } => {
                client.add(product, i64::from(*quantity)).await?
            }
        };
    }

    let expected: Vec<_> = reconciliation
        .cart
        .lines()
        .iter()
        .map(|line| (line.key(), line.quantity()))
        .collect();
    let actual: Vec<_> = cart
        .lines()
        .iter()
        .map(|line| (line.key(), line.quantity()))
        .collect();
    if expected != actual {
        warn!(
            expected_total = %reconciliation.cart.total(),
            total = %cart.total(),
            "Server cart differs from merged cart after login"
        );
    }
    Ok(cart)
}
