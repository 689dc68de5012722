//! Reconciliation between the session cart and the server-persisted cart.
//!
//! Used only when a user session exists; anonymous visitors mutate the
//! session cart directly and never touch the remote cart resource.
//!
//! Every remote call returns the full server cart, which is pushed through
//! [`CartState::replace_from_server`] so the session cart is overwritten with
//! server-canonical state. Racing mutations resolve last-writer-wins: the
//! last response to arrive fully replaces the session cart. In-flight
//! requests are never cancelled when a newer mutation supersedes them.

use rust_decimal::Decimal;
use tracing::instrument;

use velora_core::CartItemId;

use crate::commerce::types::AddCartItemRequest;
use crate::commerce::{CommerceClient, CommerceError};

use super::{CartState, LineKey};

/// Mediates between the session cart and the remote cart resource for one
/// authenticated request.
pub struct CartSync<'a> {
    commerce: &'a CommerceClient,
    token: &'a str,
}

impl<'a> CartSync<'a> {
    /// Create a sync adapter for the given session token.
    #[must_use]
    pub const fn new(commerce: &'a CommerceClient, token: &'a str) -> Self {
        Self { commerce, token }
    }

    /// Fetch the server-canonical cart and build the reconciled state.
    ///
    /// The underlying read gets a single retry on transport errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched; the caller keeps its
    /// current state in that case.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<CartState, CommerceError> {
        let remote = self.commerce.get_cart(self.token).await?;
        Ok(Self::reconcile(&remote))
    }

    /// Push a local add to the server and reconcile.
    ///
    /// `quantity` is the amount just added, not the merged line quantity;
    /// the backend merges into an existing item itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote add fails; the optimistic local add
    /// stays in place.
    #[instrument(skip(self, key, unit_price))]
    pub async fn add(
        &self,
        key: &LineKey,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<CartState, CommerceError> {
        let request = AddCartItemRequest {
            product: key.product_id.clone(),
            quantity,
            price: unit_price,
            color: key.color.clone(),
            size: key.size.clone(),
        };
        let remote = self.commerce.add_cart_item(self.token, &request).await?;
        Ok(Self::reconcile(&remote))
    }

    /// Set an item's quantity on the server and reconcile.
    ///
    /// The session cart must not be mutated before this resolves; on failure
    /// the caller surfaces the error and leaves local state unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote update fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn set_quantity(
        &self,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<CartState, CommerceError> {
        let remote = self
            .commerce
            .update_cart_item(self.token, item_id, quantity)
            .await?;
        Ok(Self::reconcile(&remote))
    }

    /// Remove an item on the server and reconcile.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote removal fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove(&self, item_id: &CartItemId) -> Result<CartState, CommerceError> {
        let remote = self.commerce.remove_cart_item(self.token, item_id).await?;
        Ok(Self::reconcile(&remote))
    }

    /// Clear the server cart and reconcile.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote clear fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartState, CommerceError> {
        let remote = self.commerce.clear_cart(self.token).await?;
        Ok(Self::reconcile(&remote))
    }

    fn reconcile(remote: &crate::commerce::types::RemoteCart) -> CartState {
        let mut state = CartState::new();
        state.replace_from_server(remote);
        state
    }
}
