use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    audit,
    cart::{CartEngine, CartSnapshot, model::normalize_label},
    dto::cart::{AddToCartRequest, SetQuantityRequest},
    entity::products::Entity as Products,
    error::{AppError, AppResult},
    identity::Identity,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Opens a cart session with the lines of `identity` loaded.
async fn open_session(state: &AppState, identity: &Identity) -> AppResult<CartEngine> {
    let engine = state.cart_engine();
    engine.fetch_lines(Some(identity)).await?;
    Ok(engine)
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartSnapshot>> {
    let identity = Identity::from(user);
    let engine = open_session(state, &identity).await?;
    Ok(ApiResponse::success(
        "OK",
        engine.snapshot().await,
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartSnapshot>> {
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;
    ensure_option("size", payload.size.as_deref(), &product.sizes)?;
    ensure_option("color", payload.color.as_deref(), &product.colors)?;

    let identity = Identity::from(user);
    let engine = state.cart_engine();
    let metadata = serde_json::json!({
        "product_id": payload.product_id,
        "quantity": payload.quantity,
        "size": normalize_label(payload.size.as_deref()),
        "color": normalize_label(payload.color.as_deref()),
    });
    engine.add_line(Some(&identity), payload.into()).await?;

    audit::record(state, Some(user.user_id), "cart_add", "cart_items", metadata).await;

    Ok(ApiResponse::success(
        "Added to cart",
        engine.snapshot().await,
        Some(Meta::empty()),
    ))
}

pub async fn set_quantity(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
    payload: SetQuantityRequest,
) -> AppResult<ApiResponse<CartSnapshot>> {
    let identity = Identity::from(user);
    let engine = open_session(state, &identity).await?;
    engine.set_quantity(line_id, payload.quantity).await?;

    audit::record(
        state,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "line_id": line_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart updated",
        engine.snapshot().await,
        Some(Meta::empty()),
    ))
}

pub async fn remove_line(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
) -> AppResult<ApiResponse<CartSnapshot>> {
    let identity = Identity::from(user);
    let engine = open_session(state, &identity).await?;
    engine.remove_line(line_id).await?;

    audit::record(
        state,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "line_id": line_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        engine.snapshot().await,
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CartSnapshot>> {
    let identity = Identity::from(user);
    let engine = state.cart_engine();
    engine.clear(Some(&identity)).await?;

    audit::record(
        state,
        Some(user.user_id),
        "cart_clear",
        "cart_items",
        serde_json::json!({}),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart cleared",
        engine.snapshot().await,
        Some(Meta::empty()),
    ))
}

/// Rejects a size or color the product does not offer. Products without
/// options accept any label.
fn ensure_option(kind: &str, label: Option<&str>, offered: &[String]) -> AppResult<()> {
    let label = normalize_label(label);
    if label.is_empty() || offered.is_empty() || offered.iter().any(|o| o.trim() == label) {
        return Ok(());
    }
    Err(AppError::BadRequest(format!(
        "{kind} '{label}' is not available for this product"
    )))
}
