use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, UserSummary};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutLine {
    pub sku_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    pub detail: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() || self.phone.trim().is_empty() || self.detail.trim().is_empty()
        {
            return Err("Shipping address is incomplete");
        }
        Ok(())
    }

    /// Single-line form stored on the order.
    pub fn full_address(&self) -> String {
        [&self.province, &self.city, &self.district, &self.detail]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    pub address: Option<ShippingAddress>,
    pub address_id: Option<Uuid>,
    pub remark: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
