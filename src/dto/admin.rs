use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct LowStockSku {
    pub sku_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub sku_code: String,
    pub spec: String,
    pub stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LowStockList {
    pub threshold: i32,
    pub items: Vec<LowStockSku>,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct TodayStats {
    pub order_count: i64,
    pub total_amount: i64,
    pub new_users: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct TotalStats {
    pub total_orders: i64,
    pub total_sales: i64,
    pub total_users: i64,
    pub total_products: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct StatusStat {
    pub status: String,
    pub count: i64,
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub order_count: i64,
    pub total_amount: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct TopProduct {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub sales: i32,
    pub price: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct CategoryStat {
    pub id: Uuid,
    pub name: String,
    pub product_count: i64,
    pub total_sales: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct PendingTasks {
    pub pending_orders: i64,
    pub paid_orders: i64,
    pub active_products: i64,
    pub low_stock_skus: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub today: TodayStats,
    pub totals: TotalStats,
    pub order_status: Vec<StatusStat>,
    pub last_7_days: Vec<DailyTrend>,
    pub top_products: Vec<TopProduct>,
    pub categories: Vec<CategoryStat>,
    pub pending: PendingTasks,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct SalesPoint {
    pub period: DateTime<Utc>,
    pub order_count: i64,
    pub total_amount: i64,
    pub completed_amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReport {
    pub period: String,
    pub items: Vec<SalesPoint>,
}
