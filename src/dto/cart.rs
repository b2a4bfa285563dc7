use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub sku_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

/// Cart row joined with its product and SKU.
#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku_id: Uuid,
    pub product_name: String,
    pub image: String,
    pub spec: String,
    pub price: i64,
    pub stock: i32,
    pub quantity: i32,
    pub available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLine>,
    pub total_quantity: i64,
    pub total_amount: i64,
}
