use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};
use uuid::Uuid;

use super::{
    error::{CartError, CartResult},
    model::{CartSnapshot, CartView, LineKey},
    store::{CartStore, ProductCatalog},
    totals,
};
use crate::identity::{Identity, IdentityHub};

/// Upper bound on the units a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

/// Request to put units of one product configuration into the cart.
#[derive(Debug, Clone)]
pub struct AddLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Default)]
struct CartState {
    owner: Option<Identity>,
    lines: Vec<CartView>,
    loading: bool,
}

/// In-memory mirror of one identity's server-side cart.
///
/// Every successful mutation is followed by a full resync from the store;
/// nothing is merged locally. A failed store call leaves the mirror as it
/// was. Mutations on one engine run one at a time.
pub struct CartEngine {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
    state: RwLock<CartState>,
    // Bumped by every fetch, clear and reset. A fetch only publishes its
    // result if no newer ticket has been issued in the meantime.
    generation: AtomicU64,
    mutations: Mutex<()>,
}

impl CartEngine {
    pub fn new(store: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self {
            store,
            catalog,
            state: RwLock::new(CartState::default()),
            generation: AtomicU64::new(0),
            mutations: Mutex::new(()),
        }
    }

    /// Reloads the lines of `identity`, newest first, joined with current
    /// product data. With no identity the mirror is emptied.
    pub async fn fetch_lines(&self, identity: Option<&Identity>) -> CartResult<Vec<CartView>> {
        let Some(identity) = identity else {
            self.reset().await;
            return Ok(Vec::new());
        };

        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            if state.owner.as_ref() != Some(identity) {
                state.lines.clear();
            }
            state.owner = Some(identity.clone());
            state.loading = true;
        }

        let views = match self.load(identity.user_id).await {
            Ok(views) => views,
            Err(err) => {
                let mut state = self.state.write().await;
                if self.is_current(ticket) {
                    state.loading = false;
                }
                return Err(err);
            }
        };

        let mut state = self.state.write().await;
        if self.is_current(ticket) {
            state.lines = views.clone();
            state.loading = false;
            tracing::debug!(
                user_id = %identity.user_id,
                lines = views.len(),
                "cart resynced"
            );
        } else {
            tracing::warn!(user_id = %identity.user_id, ticket, "discarding stale cart response");
        }
        Ok(views)
    }

    /// Adds `quantity` units of a product configuration. An existing line
    /// with the same product, size and color grows by `quantity`.
    pub async fn add_line(
        &self,
        identity: Option<&Identity>,
        request: AddLine,
    ) -> CartResult<Vec<CartView>> {
        let identity = identity.ok_or_else(|| {
            CartError::Validation("sign in before adding items to the cart".into())
        })?;
        if request.quantity <= 0 {
            return Err(CartError::Validation(
                "quantity must be greater than 0".into(),
            ));
        }
        check_line_quantity(request.quantity)?;

        let _guard = self.mutations.lock().await;
        let key = LineKey::new(
            identity.user_id,
            request.product_id,
            request.size.as_deref(),
            request.color.as_deref(),
        );

        match self.store.find_by_key(&key).await? {
            Some(existing) => {
                let quantity = existing.quantity.saturating_add(request.quantity);
                check_line_quantity(quantity)?;
                self.store
                    .update_quantity(identity.user_id, existing.id, quantity)
                    .await?
                    .ok_or(CartError::NotFound)?;
            }
            None => {
                self.store.insert(key, request.quantity).await?;
            }
        }

        self.fetch_lines(Some(identity)).await
    }

    /// Deletes a line of the identity currently mirrored.
    pub async fn remove_line(&self, line_id: Uuid) -> CartResult<Vec<CartView>> {
        let owner = self.owner().await?;
        let _guard = self.mutations.lock().await;
        if !self.store.delete_by_id(owner.user_id, line_id).await? {
            return Err(CartError::NotFound);
        }
        self.fetch_lines(Some(&owner)).await
    }

    /// Sets a line to exactly `quantity` units; zero or less removes it.
    pub async fn set_quantity(&self, line_id: Uuid, quantity: i32) -> CartResult<Vec<CartView>> {
        if quantity <= 0 {
            return self.remove_line(line_id).await;
        }
        check_line_quantity(quantity)?;
        let owner = self.owner().await?;
        let _guard = self.mutations.lock().await;
        self.store
            .update_quantity(owner.user_id, line_id, quantity)
            .await?
            .ok_or(CartError::NotFound)?;
        self.fetch_lines(Some(&owner)).await
    }

    /// Deletes every line of `identity`. The outcome is known, so the mirror
    /// is emptied without a round trip.
    pub async fn clear(&self, identity: Option<&Identity>) -> CartResult<()> {
        let identity = identity
            .ok_or_else(|| CartError::Validation("sign in before clearing the cart".into()))?;
        let _guard = self.mutations.lock().await;
        let removed = self.store.delete_by_owner(identity.user_id).await?;

        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        state.owner = Some(identity.clone());
        state.lines.clear();
        state.loading = false;
        tracing::debug!(user_id = %identity.user_id, removed, "cart cleared");
        Ok(())
    }

    /// Drops the mirrored identity and its lines without touching the store.
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        *state = CartState::default();
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        let state = self.state.read().await;
        CartSnapshot {
            count: totals::count(&state.lines),
            subtotal: totals::subtotal(&state.lines),
            lines: state.lines.clone(),
            loading: state.loading,
        }
    }

    pub async fn lines(&self) -> Vec<CartView> {
        self.state.read().await.lines.clone()
    }

    pub async fn count(&self) -> i64 {
        totals::count(&self.state.read().await.lines)
    }

    pub async fn subtotal(&self) -> i64 {
        totals::subtotal(&self.state.read().await.lines)
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.owner.clone()
    }

    /// Keeps this engine in step with `hub`: a sign-in triggers a full
    /// resync, a sign-out empties the mirror. The current identity is synced
    /// once before listening.
    pub fn follow(self: &Arc<Self>, hub: &IdentityHub) -> FollowHandle {
        let engine = Arc::clone(self);
        let mut subscription = hub.subscribe();
        let initial = hub.current();
        let task = tokio::spawn(async move {
            engine.apply_identity(initial).await;
            while let Some(identity) = subscription.next().await {
                engine.apply_identity(identity).await;
            }
            subscription.unsubscribe();
        });
        FollowHandle { task }
    }

    async fn apply_identity(&self, identity: Option<Identity>) {
        match identity {
            Some(identity) => {
                if let Err(err) = self.fetch_lines(Some(&identity)).await {
                    tracing::warn!(user_id = %identity.user_id, error = %err, "cart resync failed");
                }
            }
            None => self.reset().await,
        }
    }

    async fn owner(&self) -> CartResult<Identity> {
        self.state
            .read()
            .await
            .owner
            .clone()
            .ok_or_else(|| CartError::Validation("no signed-in identity".into()))
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    async fn load(&self, user_id: Uuid) -> CartResult<Vec<CartView>> {
        let lines = self.store.list_by_owner(user_id).await?;

        let mut ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let products = if ids.is_empty() {
            HashMap::new()
        } else {
            self.catalog.find_snapshots(&ids).await?
        };

        Ok(lines
            .into_iter()
            .map(|line| {
                let product = products.get(&line.product_id).cloned();
                CartView { line, product }
            })
            .collect())
    }
}

fn check_line_quantity(quantity: i32) -> CartResult<()> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::Validation(format!(
            "a cart line holds at most {MAX_LINE_QUANTITY} units"
        )));
    }
    Ok(())
}

/// Stops an engine from following identity changes when dropped or stopped.
pub struct FollowHandle {
    task: JoinHandle<()>,
}

impl FollowHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for FollowHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
