use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::AddLine;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl From<AddToCartRequest> for AddLine {
    fn from(req: AddToCartRequest) -> Self {
        AddLine {
            product_id: req.product_id,
            quantity: req.quantity,
            size: req.size,
            color: req.color,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    /// Zero or a negative value removes the line.
    pub quantity: i32,
}
