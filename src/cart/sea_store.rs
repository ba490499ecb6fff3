use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::{
    error::PersistenceError,
    model::{CartLine, LineKey, ProductSnapshot},
    store::{CartStore, ProductCatalog, StoreResult},
};
use crate::entity::{
    cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
    products::{Column as ProdCol, Entity as Products},
};

/// Postgres-backed cart lines.
#[derive(Clone)]
pub struct SeaCartStore {
    orm: DatabaseConnection,
}

impl SeaCartStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }

    async fn owned(&self, user_id: Uuid, line_id: Uuid) -> StoreResult<Option<CartModel>> {
        let found = CartItems::find()
            .filter(
                Condition::all()
                    .add(CartCol::Id.eq(line_id))
                    .add(CartCol::UserId.eq(user_id)),
            )
            .one(&self.orm)
            .await?;
        Ok(found)
    }
}

#[async_trait]
impl CartStore for SeaCartStore {
    async fn list_by_owner(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let lines = CartItems::find()
            .filter(CartCol::UserId.eq(user_id))
            .order_by_desc(CartCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(line_from_entity)
            .collect();
        Ok(lines)
    }

    async fn find_by_key(&self, key: &LineKey) -> StoreResult<Option<CartLine>> {
        let found = CartItems::find()
            .filter(
                Condition::all()
                    .add(CartCol::UserId.eq(key.user_id))
                    .add(CartCol::ProductId.eq(key.product_id))
                    .add(CartCol::Size.eq(key.size.as_str()))
                    .add(CartCol::Color.eq(key.color.as_str())),
            )
            .one(&self.orm)
            .await?;
        Ok(found.map(line_from_entity))
    }

    async fn insert(&self, key: LineKey, quantity: i32) -> StoreResult<CartLine> {
        let now = Utc::now();
        let model = CartActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(key.user_id),
            product_id: Set(key.product_id),
            quantity: Set(quantity),
            size: Set(key.size),
            color: Set(key.color),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.orm)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => PersistenceError::Rejected(detail),
            _ => PersistenceError::Orm(err),
        })?;
        Ok(line_from_entity(model))
    }

    async fn update_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<CartLine>> {
        let Some(existing) = self.owned(user_id, line_id).await? else {
            return Ok(None);
        };
        let mut active: CartActive = existing.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.orm).await?;
        Ok(Some(line_from_entity(updated)))
    }

    async fn delete_by_id(&self, user_id: Uuid, line_id: Uuid) -> StoreResult<bool> {
        let result = CartItems::delete_many()
            .filter(
                Condition::all()
                    .add(CartCol::Id.eq(line_id))
                    .add(CartCol::UserId.eq(user_id)),
            )
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_by_owner(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = CartItems::delete_many()
            .filter(CartCol::UserId.eq(user_id))
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Product snapshots read straight from the `products` table.
#[derive(Clone)]
pub struct SeaProductCatalog {
    orm: DatabaseConnection,
}

impl SeaProductCatalog {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl ProductCatalog for SeaProductCatalog {
    async fn find_snapshots(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, ProductSnapshot>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let products = Products::find()
            .filter(ProdCol::Id.is_in(ids.iter().copied()))
            .all(&self.orm)
            .await?;
        Ok(products
            .into_iter()
            .map(|p| {
                (
                    p.id,
                    ProductSnapshot {
                        id: p.id,
                        name: p.name,
                        price: p.price,
                        sale_price: p.sale_price,
                    },
                )
            })
            .collect())
    }
}

fn line_from_entity(model: CartModel) -> CartLine {
    CartLine {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        quantity: model.quantity,
        size: model.size,
        color: model.color,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
