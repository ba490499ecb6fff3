use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    error::PersistenceError,
    model::{CartLine, LineKey, ProductSnapshot},
};

pub type StoreResult<T> = Result<T, PersistenceError>;

/// Record store backing cart lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All lines of `user_id`, newest first.
    async fn list_by_owner(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>>;
    async fn find_by_key(&self, key: &LineKey) -> StoreResult<Option<CartLine>>;
    async fn insert(&self, key: LineKey, quantity: i32) -> StoreResult<CartLine>;
    /// Returns `None` when no line `line_id` belongs to `user_id`.
    async fn update_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<CartLine>>;
    /// Returns whether a line was deleted.
    async fn delete_by_id(&self, user_id: Uuid, line_id: Uuid) -> StoreResult<bool>;
    async fn delete_by_owner(&self, user_id: Uuid) -> StoreResult<u64>;
}

/// Batched product lookup used to join cart lines with current prices.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Ids with no matching product are absent from the result.
    async fn find_snapshots(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, ProductSnapshot>>;
}
