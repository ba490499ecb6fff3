use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub customer_name: String,
    pub phone: String,
    pub province: String,
    pub address: String,
    pub note: Option<String>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub size: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

pub mod convert {
    //! Entity model to API model conversions shared by the services.

    use chrono::Utc;

    use super::{Category, Order, OrderItem, Product, User};
    use crate::entity::{categories, order_items, orders, products, users};

    pub fn user_from_entity(model: users::Model) -> User {
        User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            full_name: model.full_name,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }

    pub fn category_from_entity(model: categories::Model) -> Category {
        Category {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }

    pub fn product_from_entity(model: products::Model) -> Product {
        Product {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            description: model.description,
            price: model.price,
            sale_price: model.sale_price,
            stock: model.stock,
            sizes: model.sizes,
            colors: model.colors,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }

    pub fn order_from_entity(model: orders::Model) -> Order {
        Order {
            id: model.id,
            user_id: model.user_id,
            order_number: model.order_number,
            status: model.status,
            customer_name: model.customer_name,
            phone: model.phone,
            province: model.province,
            address: model.address,
            note: model.note,
            subtotal: model.subtotal,
            delivery_fee: model.delivery_fee,
            total_amount: model.total_amount,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }

    pub fn order_item_from_entity(model: order_items::Model) -> OrderItem {
        OrderItem {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            unit_price: model.unit_price,
            size: model.size,
            color: model.color,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
