use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{
            DashboardStats, InventoryAdjustRequest, LowStockList, SalesReport,
            UpdateOrderStatusRequest,
        },
        orders::{AdminOrderDetail, OrderList},
    },
    error::{AppResult, ErrorData},
    middleware::auth::AuthUser,
    models::{Order, Sku},
    response::ApiResponse,
    routes::params::{AdminOrderQuery, LowStockQuery, SalesQuery},
    services::{admin_service, statistics_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/skus/{id}", patch(adjust_inventory))
        .route("/statistics/dashboard", get(dashboard))
        .route("/statistics/sales", get(sales_report))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(AdminOrderQuery),
    responses(
        (status = 200, description = "All orders (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminOrderQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items and buyer", body = ApiResponse<AdminOrderDetail>),
        (status = 403, description = "Forbidden", body = ApiResponse<ErrorData>),
        (status = 404, description = "Order not found", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<AdminOrderDetail>>> {
    let resp = admin_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Order>),
        (status = 400, description = "Unknown status", body = ApiResponse<ErrorData>),
        (status = 409, description = "Transition not allowed", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "SKUs below the stock threshold", body = ApiResponse<LowStockList>),
        (status = 403, description = "Forbidden", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<LowStockList>>> {
    let resp = admin_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/skus/{id}",
    params(("id" = Uuid, Path, description = "SKU id")),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<Sku>),
        (status = 400, description = "Zero delta or stock would go negative", body = ApiResponse<ErrorData>),
        (status = 404, description = "SKU not found", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Sku>>> {
    let resp = admin_service::adjust_inventory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/statistics/dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Statistics"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = statistics_service::dashboard(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/statistics/sales",
    params(SalesQuery),
    responses(
        (status = 200, description = "Sales grouped by day, week or month", body = ApiResponse<SalesReport>),
        (status = 400, description = "Bad date range", body = ApiResponse<ErrorData>),
        (status = 403, description = "Forbidden", body = ApiResponse<ErrorData>)
    ),
    security(("bearer_auth" = [])),
    tag = "Statistics"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SalesQuery>,
) -> AppResult<Json<ApiResponse<SalesReport>>> {
    let resp = statistics_service::sales_report(&state, &user, query).await?;
    Ok(Json(resp))
}
