use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    error::PersistenceError,
    model::{CartLine, LineKey, ProductSnapshot},
    store::{CartStore, ProductCatalog, StoreResult},
};

/// In-process cart store. Rows are kept in insertion order.
#[derive(Default)]
pub struct MemoryCartStore {
    lines: Mutex<Vec<CartLine>>,
    fail_writes: AtomicBool,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with [`PersistenceError::Rejected`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn rows(&self) -> Vec<CartLine> {
        self.lines.lock().await.clone()
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Rejected("writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn list_by_owner(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let lines = self.lines.lock().await;
        // Reverse first so that equal timestamps still list the newest row first.
        let mut owned: Vec<CartLine> = lines
            .iter()
            .rev()
            .filter(|line| line.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_by_key(&self, key: &LineKey) -> StoreResult<Option<CartLine>> {
        let lines = self.lines.lock().await;
        Ok(lines.iter().find(|line| &line.key() == key).cloned())
    }

    async fn insert(&self, key: LineKey, quantity: i32) -> StoreResult<CartLine> {
        self.check_writable()?;
        let mut lines = self.lines.lock().await;
        if lines.iter().any(|line| line.key() == key) {
            return Err(PersistenceError::Rejected(
                "duplicate key violates unique constraint uq_cart_items_key".into(),
            ));
        }
        let now = Utc::now();
        let line = CartLine {
            id: Uuid::new_v4(),
            user_id: key.user_id,
            product_id: key.product_id,
            quantity,
            size: key.size,
            color: key.color,
            created_at: now,
            updated_at: now,
        };
        lines.push(line.clone());
        Ok(line)
    }

    async fn update_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<CartLine>> {
        self.check_writable()?;
        let mut lines = self.lines.lock().await;
        let Some(line) = lines
            .iter_mut()
            .find(|line| line.id == line_id && line.user_id == user_id)
        else {
            return Ok(None);
        };
        line.quantity = quantity;
        line.updated_at = Utc::now();
        Ok(Some(line.clone()))
    }

    async fn delete_by_id(&self, user_id: Uuid, line_id: Uuid) -> StoreResult<bool> {
        self.check_writable()?;
        let mut lines = self.lines.lock().await;
        let before = lines.len();
        lines.retain(|line| !(line.id == line_id && line.user_id == user_id));
        Ok(lines.len() < before)
    }

    async fn delete_by_owner(&self, user_id: Uuid) -> StoreResult<u64> {
        self.check_writable()?;
        let mut lines = self.lines.lock().await;
        let before = lines.len();
        lines.retain(|line| line.user_id != user_id);
        Ok((before - lines.len()) as u64)
    }
}

/// In-process product catalog with an optional artificial read latency.
#[derive(Default)]
pub struct MemoryCatalog {
    products: Mutex<HashMap<Uuid, ProductSnapshot>>,
    latency: Mutex<Option<Duration>>,
    lookups: AtomicUsize,
    fail_next: AtomicBool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, product: ProductSnapshot) {
        self.products.lock().await.insert(product.id, product);
    }

    pub async fn remove(&self, id: Uuid) {
        self.products.lock().await.remove(&id);
    }

    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().await = latency;
    }

    /// Makes the next lookup to finish fail with [`PersistenceError::Rejected`].
    pub fn fail_next_lookup(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of `find_snapshots` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn find_snapshots(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, ProductSnapshot>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PersistenceError::Rejected("catalog lookup failed".into()));
        }
        let products = self.products.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| products.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}
