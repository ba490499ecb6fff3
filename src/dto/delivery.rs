use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::delivery::Province;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeeQuery {
    pub province: String,
    pub subtotal: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeeQuote {
    pub province: String,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProvinceList {
    #[schema(value_type = Vec<Province>)]
    pub items: Vec<Province>,
}
