use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    delivery::PROVINCES,
    dto::delivery::{FeeQuery, FeeQuote, ProvinceList},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/provinces", get(list_provinces))
        .route("/fee", get(quote_fee))
}

#[utoipa::path(
    get,
    path = "/api/delivery/provinces",
    responses(
        (status = 200, description = "Provinces accepted at checkout", body = ApiResponse<ProvinceList>)
    ),
    tag = "Delivery"
)]
pub async fn list_provinces() -> Json<ApiResponse<ProvinceList>> {
    let total = PROVINCES.len() as i64;
    Json(ApiResponse::success(
        "Provinces",
        ProvinceList {
            items: PROVINCES.to_vec(),
        },
        Some(Meta::new(1, total, total)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/delivery/fee",
    params(FeeQuery),
    responses(
        (status = 200, description = "Delivery fee for a province and subtotal", body = ApiResponse<FeeQuote>)
    ),
    tag = "Delivery"
)]
pub async fn quote_fee(
    State(state): State<AppState>,
    Query(query): Query<FeeQuery>,
) -> Json<ApiResponse<FeeQuote>> {
    let subtotal = query.subtotal.unwrap_or(0).max(0);
    let delivery_fee = state.config.delivery.fee(&query.province, subtotal);
    Json(ApiResponse::success(
        "Delivery fee",
        FeeQuote {
            province: query.province,
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        },
        Some(Meta::empty()),
    ))
}
