//! One cart API whether or not the shopper is signed in.
//!
//! Guests persist to a [`LocalCart`]; signed-in shoppers persist to a
//! [`RemoteCart`]. Every mutation is applied to the in-memory cart first and
//! announced on the bus, then persisted. If persisting fails the facade
//! applies the command's inverse, announces again and hands the error back.
//!
//! Writes to the backing store are serialized, and a guest write always
//! stores the cart as it is when the write starts, so a slow write can never
//! overwrite a newer one.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use brana_core::{Bus, Cart, CartCommand, CartLineItem, ProductId, Subscription};

use crate::error::ClientError;
use crate::local::LocalCart;
use crate::remote::RemoteCart;

/// Capacity of the change channel.
const CHANGE_CAPACITY: usize = 64;

/// Which store backs the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartSource {
    Local,
    Remote,
}

/// Why the cart changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// A command was applied optimistically.
    Command,
    /// A command was undone because persisting it failed.
    Rollback,
    /// The cart was reloaded from its store.
    Refresh,
    /// The guest cart was folded into the signed-in cart.
    Merge,
}

/// Published after every change to the facade's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartChanged {
    pub item_count: u32,
    pub source: CartSource,
    pub reason: ChangeReason,
}

/// Result of folding the guest cart into the signed-in cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The guest cart was empty; nothing was sent.
    NothingToMerge,
    /// This many guest lines were merged and the guest cart was cleared.
    Merged(usize),
}

struct State {
    cart: Cart,
    signed_in: bool,
}

impl State {
    const fn source(&self) -> CartSource {
        if self.signed_in {
            CartSource::Remote
        } else {
            CartSource::Local
        }
    }
}

/// The cart a front-end talks to.
pub struct CartFacade {
    local: LocalCart,
    remote: Arc<dyn RemoteCart>,
    state: Mutex<State>,
    /// Held while talking to a store. Taken before `state`, never after.
    persisting: Mutex<()>,
    changes: Bus<CartChanged>,
}

impl CartFacade {
    /// A guest facade with an empty in-memory cart. Call
    /// [`CartFacade::refresh`] to load what the local store holds.
    #[must_use]
    pub fn new(local: LocalCart, remote: Arc<dyn RemoteCart>) -> Self {
        Self {
            local,
            remote,
            state: Mutex::new(State {
                cart: Cart::new(),
                signed_in: false,
            }),
            persisting: Mutex::new(()),
            changes: Bus::new(CHANGE_CAPACITY),
        }
    }

    /// Receive [`CartChanged`] events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<CartChanged> {
        self.changes.subscribe()
    }

    /// Snapshot of the current items.
    pub async fn items(&self) -> Vec<CartLineItem> {
        self.state.lock().await.cart.items().to_vec()
    }

    /// Sum of quantities.
    pub async fn item_count(&self) -> u32 {
        self.state.lock().await.cart.item_count()
    }

    /// Whether the remote cart is in use.
    pub async fn is_signed_in(&self) -> bool {
        self.state.lock().await.signed_in
    }

    fn announce(&self, state: &State, reason: ChangeReason) {
        self.changes.publish(CartChanged {
            item_count: state.cart.item_count(),
            source: state.source(),
            reason,
        });
    }

    /// Add an item, or increase its quantity if already present.
    ///
    /// # Errors
    ///
    /// Returns the persistence error after rolling the change back.
    pub async fn add(&self, item: CartLineItem) -> Result<(), ClientError> {
        self.execute(CartCommand::Add { item }).await
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns the persistence error after rolling the change back.
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<(), ClientError> {
        self.execute(CartCommand::SetQuantity {
            product_id: product_id.clone(),
            quantity,
        })
        .await
    }

    /// Remove a line. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the persistence error after rolling the change back.
    pub async fn remove(&self, product_id: &ProductId) -> Result<(), ClientError> {
        self.execute(CartCommand::Remove {
            product_id: product_id.clone(),
        })
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns the persistence error after rolling the change back.
    pub async fn clear(&self) -> Result<(), ClientError> {
        self.execute(CartCommand::Clear).await
    }

    #[instrument(skip(self))]
    async fn execute(&self, command: CartCommand) -> Result<(), ClientError> {
        // Apply and announce under the state lock, persist without it.
        let (inverse, signed_in) = {
            let mut state = self.state.lock().await;
            let Some(inverse) = state.cart.apply(command.clone()) else {
                return Ok(());
            };
            self.announce(&state, ChangeReason::Command);
            (inverse, state.signed_in)
        };

        let _persisting = self.persisting.lock().await;
        let persisted = if signed_in {
            self.persist_remote(&command).await
        } else {
            self.save_guest_cart().await
        };

        if let Err(e) = persisted {
            tracing::warn!(error = %e, "Cart write failed, rolling back");
            {
                let mut state = self.state.lock().await;
                state.cart.apply(inverse);
                self.announce(&state, ChangeReason::Rollback);
            }
            if !signed_in {
                // Keep the guest store in line with what the shopper sees.
                if let Err(save_err) = self.save_guest_cart().await {
                    tracing::warn!(error = %save_err, "Failed to restore local cart");
                }
            }
            return Err(e);
        }

        Ok(())
    }

    /// Write the current cart to the local store, unless a sign-in has
    /// handed the cart over to the account in the meantime.
    async fn save_guest_cart(&self) -> Result<(), ClientError> {
        let items = {
            let state = self.state.lock().await;
            if state.signed_in {
                return Ok(());
            }
            state.cart.items().to_vec()
        };
        self.local.save(&items).await
    }

    async fn persist_remote(&self, command: &CartCommand) -> Result<(), ClientError> {
        match command {
            CartCommand::Add { item } => {
                self.remote.add(&item.product_id, item.quantity).await?;
            }
            CartCommand::SetQuantity {
                product_id,
                quantity,
            } => {
                self.remote.update_quantity(product_id, *quantity).await?;
            }
            CartCommand::Remove { product_id } => {
                self.remote.remove(product_id).await?;
            }
            CartCommand::Clear => self.remote.clear().await?,
            CartCommand::Restore { .. } | CartCommand::Replace { .. } => {
                self.remote.sync(&self.items().await).await?;
            }
        }
        Ok(())
    }

    /// Reload the cart from its authoritative store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read; the in-memory cart is
    /// left as it was.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let signed_in = self.is_signed_in().await;
        let items = if signed_in {
            self.remote.fetch().await?
        } else {
            self.local.load().await?
        };

        let mut state = self.state.lock().await;
        if state.signed_in != signed_in {
            // Signed in or out while loading; the other path will refresh.
            return Ok(());
        }
        state.cart.replace(items);
        self.announce(&state, ChangeReason::Refresh);
        Ok(())
    }

    /// Switch to the remote cart after a successful login and fold the
    /// guest cart into it.
    ///
    /// The guest cart is only cleared after the server accepted the merge,
    /// and the facade only switches to the remote cart once both steps
    /// succeeded. If either fails the facade stays a guest with its cart
    /// untouched, so signing in again retries the merge.
    ///
    /// # Errors
    ///
    /// Returns the merge, clear or fetch error. A fetch error leaves the
    /// facade signed in; call [`CartFacade::refresh`] to retry it.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<MergeOutcome, ClientError> {
        let _persisting = self.persisting.lock().await;

        let guest_items = self.local.load().await?;
        let outcome = if guest_items.is_empty() {
            MergeOutcome::NothingToMerge
        } else {
            if let Err(e) = self.remote.merge(&guest_items).await {
                tracing::warn!(error = %e, "Cart merge failed, keeping guest cart");
                return Err(e);
            }
            if let Err(e) = self.local.clear().await {
                tracing::warn!(error = %e, "Merged guest cart could not be cleared");
                return Err(e);
            }
            tracing::info!(lines = guest_items.len(), "Guest cart merged");
            MergeOutcome::Merged(guest_items.len())
        };

        let fetched = self.remote.fetch().await;
        let mut state = self.state.lock().await;
        state.signed_in = true;
        let result = fetched.map(|items| {
            state.cart.replace(items);
            outcome
        });
        self.announce(&state, ChangeReason::Merge);
        result
    }

    /// Switch back to the guest cart. The caller ends the server session.
    ///
    /// # Errors
    ///
    /// Returns an error if the guest cart cannot be read.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let _persisting = self.persisting.lock().await;
        let items = self.local.load().await?;
        let mut state = self.state.lock().await;
        state.signed_in = false;
        state.cart.replace(items);
        self.announce(&state, ChangeReason::Refresh);
        Ok(())
    }
}
