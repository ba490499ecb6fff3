use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Trims a size or color label; an absent label becomes `""` so it still
/// participates in the per-owner uniqueness key.
pub fn normalize_label(label: Option<&str>) -> String {
    label.map(str::trim).unwrap_or_default().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey {
            user_id: self.user_id,
            product_id: self.product_id,
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }
}

/// Uniqueness key of a cart line: `(owner, product, size, color)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
}

impl LineKey {
    pub fn new(user_id: Uuid, product_id: Uuid, size: Option<&str>, color: Option<&str>) -> Self {
        Self {
            user_id,
            product_id,
            size: normalize_label(size),
            color: normalize_label(color),
        }
    }
}

/// Catalog fields the cart needs to price a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub sale_price: Option<i64>,
}

impl ProductSnapshot {
    /// Sale price wins over the list price.
    pub fn unit_price(&self) -> i64 {
        self.sale_price.unwrap_or(self.price)
    }
}

/// A cart line joined with the product as it is right now. `product` is
/// `None` when the referenced product has been removed from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartView {
    pub line: CartLine,
    pub product: Option<ProductSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartSnapshot {
    pub lines: Vec<CartView>,
    pub count: i64,
    pub subtotal: i64,
    pub loading: bool,
}
