use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    delivery::find_province,
    dto::orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{
        Order,
        convert::{order_from_entity, order_item_from_entity},
    },
    phone::format_phone,
    response::{ApiResponse, Meta},
    routes::params::{AdminOrderQuery, SortOrder},
    state::AppState,
};

pub const ORDER_STATUSES: [&str; 5] = ["pending", "confirmed", "shipped", "delivered", "cancelled"];
const FINAL_STATUSES: [&str; 2] = ["delivered", "cancelled"];

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: AdminOrderQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        validate_order_status(status)?;
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(province) = query.province.as_deref().filter(|p| !p.trim().is_empty()) {
        let province = find_province(province)
            .ok_or_else(|| AppError::BadRequest("unknown province".into()))?;
        condition = condition.add(OrderCol::Province.eq(province.name));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        // Phones are stored formatted, so the needle is formatted the same way.
        condition = condition.add(
            Condition::any()
                .add(OrderCol::OrderNumber.contains(q.to_uppercase()))
                .add(OrderCol::CustomerName.contains(q))
                .add(OrderCol::Phone.contains(format_phone(q))),
        );
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(order_from_entity)
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Order found",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// Delivered and cancelled orders are final. Cancelling puts the ordered
/// units back in stock.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = payload.status.trim().to_lowercase();
    validate_order_status(&status)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status == status {
        return Ok(ApiResponse::success(
            "Order unchanged",
            order_from_entity(existing),
            Some(Meta::empty()),
        ));
    }
    if FINAL_STATUSES.contains(&existing.status.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Order is already {}",
            existing.status
        )));
    }

    if status == "cancelled" {
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(existing.id))
            .all(&txn)
            .await?;
        for item in items {
            Products::update_many()
                .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
                .filter(ProdCol::Id.eq(item.product_id))
                .exec(&txn)
                .await?;
        }
    }

    let previous = existing.status.clone();
    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        state,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous, "to": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub fn validate_order_status(status: &str) -> Result<(), AppError> {
    if ORDER_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid order status".into()))
    }
}
