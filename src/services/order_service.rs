use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    cart::CartView,
    delivery::find_province,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    identity::Identity,
    middleware::auth::AuthUser,
    models::convert::{order_from_entity, order_item_from_entity},
    phone::{format_phone, is_valid_phone},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub const STATUS_PENDING: &str = "pending";

/// Checkout form after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDetails {
    pub customer_name: String,
    pub phone: String,
    pub province: String,
    pub address: String,
    pub note: Option<String>,
}

pub fn validate_checkout(payload: CheckoutRequest) -> AppResult<DeliveryDetails> {
    let customer_name = payload.customer_name.trim().to_string();
    if customer_name.is_empty() {
        return Err(AppError::BadRequest("customer_name is required".into()));
    }
    if !is_valid_phone(&payload.phone) {
        return Err(AppError::BadRequest("phone number is invalid".into()));
    }
    let province = find_province(&payload.province)
        .ok_or_else(|| AppError::BadRequest("unknown province".into()))?;
    let address = payload.address.trim().to_string();
    if address.is_empty() {
        return Err(AppError::BadRequest("address is required".into()));
    }

    Ok(DeliveryDetails {
        customer_name,
        phone: format_phone(&payload.phone),
        province: province.name.to_string(),
        address,
        note: payload
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let details = validate_checkout(payload)?;

    let identity = Identity::from(user);
    let lines = state.cart_engine().fetch_lines(Some(&identity)).await?;
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    if let Some(view) = lines.iter().find(|view| view.product.is_none()) {
        return Err(AppError::BadRequest(format!(
            "Product {} is no longer available",
            view.line.product_id
        )));
    }

    let demand = tally_demand(&lines)?;

    let txn = state.orm.begin().await?;

    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(demand.keys().copied()))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    for (product_id, quantity) in &demand {
        let product = products.get(product_id).ok_or_else(|| {
            AppError::BadRequest(format!("Product {product_id} is no longer available"))
        })?;
        if product.stock < *quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }
    }

    // Prices come from the locked rows, not the cart snapshot.
    let subtotal = priced_subtotal(&lines, &products)?;
    let delivery_fee = state.config.delivery.fee(&details.province, subtotal);

    let order_id = Uuid::new_v4();
    let now = Utc::now();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        order_number: Set(build_order_number(order_id)),
        status: Set(STATUS_PENDING.into()),
        customer_name: Set(details.customer_name),
        phone: Set(details.phone),
        province: Set(details.province),
        address: Set(details.address),
        note: Set(details.note),
        subtotal: Set(subtotal),
        delivery_fee: Set(delivery_fee),
        total_amount: Set(subtotal
            .checked_add(delivery_fee)
            .ok_or_else(|| AppError::BadRequest("order total is too large".into()))?),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for view in &lines {
        let Some(product) = products.get(&view.line.product_id) else {
            continue;
        };
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            product_name: Set(product.name.clone()),
            quantity: Set(view.line.quantity),
            unit_price: Set(unit_price(product)),
            size: Set(view.line.size.clone()),
            color: Set(view.line.color.clone()),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    for (product_id, quantity) in &demand {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(*quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::value(now))
            .filter(ProdCol::Id.eq(*product_id))
            .exec(&txn)
            .await?;
    }

    // Only the lines that were ordered; anything added meanwhile stays.
    CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::Id.is_in(lines.iter().map(|view| view.line.id))),
        )
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        subtotal,
        delivery_fee,
        "order placed"
    );
    audit::record(
        state,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
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
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Units requested per product, summed over sizes and colors.
pub fn tally_demand(lines: &[CartView]) -> AppResult<HashMap<Uuid, i32>> {
    let mut demand: HashMap<Uuid, i32> = HashMap::new();
    for view in lines {
        if view.line.quantity <= 0 {
            return Err(AppError::BadRequest("cart line quantity must be positive".into()));
        }
        let total = demand.entry(view.line.product_id).or_default();
        *total = total
            .checked_add(view.line.quantity)
            .ok_or_else(|| AppError::BadRequest("requested quantity is too large".into()))?;
    }
    Ok(demand)
}

fn priced_subtotal(lines: &[CartView], products: &HashMap<Uuid, ProductModel>) -> AppResult<i64> {
    let too_large = || AppError::BadRequest("order total is too large".into());
    let mut subtotal: i64 = 0;
    for view in lines {
        let Some(product) = products.get(&view.line.product_id) else {
            continue;
        };
        let line_total = unit_price(product)
            .checked_mul(i64::from(view.line.quantity))
            .ok_or_else(too_large)?;
        subtotal = subtotal.checked_add(line_total).ok_or_else(too_large)?;
    }
    Ok(subtotal)
}

fn unit_price(product: &ProductModel) -> i64 {
    product.sale_price.unwrap_or(product.price)
}

fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string().to_uppercase();
    format!("CMD-{}-{}", date, &suffix[..8])
}
