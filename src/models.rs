use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    brands, categories, order_items, orders, product_skus, user_addresses, users,
};

/// Product and SKU status value for "on shelf" / "enabled".
pub const STATUS_ACTIVE: i16 = 1;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub nickname: String,
    pub phone: String,
}

impl From<users::Model> for UserSummary {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            nickname: model.nickname,
            phone: model.phone,
        }
    }
}

/// The caller's own account, as shown on the profile page.
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub nickname: String,
    pub phone: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub icon: Option<String>,
    pub sort: i32,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            parent_id: model.parent_id,
            name: model.name,
            icon: model.icon,
            sort: model.sort,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub icon: Option<String>,
    pub sort: i32,
    #[schema(no_recursion)]
    pub children: Vec<CategoryNode>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub sort: i32,
}

impl From<brands::Model> for Brand {
    fn from(model: brands::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            logo: model.logo,
            description: model.description,
            sort: model.sort,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub subtitle: Option<String>,
    pub image: String,
    pub category_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub sales: i32,
    pub min_price: i64,
    pub max_price: i64,
    pub total_stock: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Sku {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku_code: String,
    pub spec: String,
    pub price: i64,
    pub original_price: Option<i64>,
    pub stock: i32,
    pub status: i16,
}

impl From<product_skus::Model> for Sku {
    fn from(model: product_skus::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            sku_code: model.sku_code,
            spec: model.spec,
            price: model.price,
            original_price: model.original_price,
            stock: model.stock,
            status: model.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    pub id: Uuid,
    pub name: String,
    pub subtitle: Option<String>,
    pub detail: String,
    pub images: Vec<String>,
    pub category_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub pet_type: Option<i16>,
    pub sales: i32,
    pub views: i32,
    pub min_price: i64,
    pub max_price: i64,
    pub total_stock: i64,
    pub skus: Vec<Sku>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub sku_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub province: String,
    pub city: String,
    pub district: String,
    pub detail: String,
    pub postal_code: Option<String>,
    pub is_default: bool,
}

impl From<user_addresses::Model> for Address {
    fn from(model: user_addresses::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            province: model.province,
            city: model.city,
            district: model.district,
            detail: model.detail,
            postal_code: model.postal_code,
            is_default: model.is_default,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_no: String,
    pub user_id: Uuid,
    pub total_amount: i64,
    pub status: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub remark: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_no: model.order_no,
            user_id: model.user_id,
            total_amount: model.total_amount,
            status: model.status,
            receiver_name: model.receiver_name,
            receiver_phone: model.receiver_phone,
            receiver_address: model.receiver_address,
            remark: model.remark,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
            completed_at: model.completed_at.map(|dt| dt.with_timezone(&Utc)),
            cancelled_at: model.cancelled_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub sku_id: Uuid,
    pub product_name: String,
    pub spec: String,
    pub image: String,
    pub price: i64,
    pub quantity: i32,
    pub subtotal: i64,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            sku_id: model.sku_id,
            product_name: model.product_name,
            spec: model.spec,
            image: model.image,
            price: model.price,
            quantity: model.quantity,
            subtotal: model.price * i64::from(model.quantity),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// First entry of a `main_images` json array, or empty.
pub fn first_image(images: &serde_json::Value) -> String {
    images
        .get(0)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
