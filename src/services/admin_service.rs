use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::{InventoryAdjustRequest, LowStockList, LowStockSku, UpdateOrderStatusRequest},
        orders::{AdminOrderDetail, OrderList},
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        product_skus::{ActiveModel as SkuActive, Entity as ProductSkus},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, Sku, UserSummary},
    order_status::OrderStatus,
    response::{ApiResponse, Meta},
    routes::params::{AdminOrderQuery, LowStockQuery, SortOrder},
    services::order_service::{load_items, transition_order},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: AdminOrderQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::OrderNo.contains(keyword));
    }
    if let Some(start) = query.start_date {
        condition = condition.add(OrderCol::CreatedAt.gte(day_start(start)));
    }
    if let Some(end) = query.end_date {
        // Inclusive of the whole end day.
        let next = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::BadRequest("end_date is out of range".into()))?;
        condition = condition.add(OrderCol::CreatedAt.lt(day_start(next)));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Midnight UTC at the start of `date`.
pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<AdminOrderDetail>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = load_items(&state.orm, order.id).await?;
    let buyer = Users::find_by_id(order.user_id)
        .one(&state.orm)
        .await?
        .map(UserSummary::from);

    Ok(ApiResponse::success(
        "Order found",
        AdminOrderDetail {
            order: order.into(),
            items,
            user: buyer,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let target: OrderStatus = payload.status.trim().parse()?;

    let txn = state.orm.begin().await?;
    let order = transition_order(&txn, id, target, payload.remark).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<LowStockList>> {
    ensure_admin(user)?;
    let threshold = query
        .threshold
        .unwrap_or(state.config.low_stock_threshold)
        .max(0);
    let (page, limit, offset) = query.pagination().normalize();

    let items = sqlx::query_as::<_, LowStockSku>(
        r#"
        SELECT ps.id AS sku_id, p.id AS product_id, p.name AS product_name,
               ps.sku_code, ps.spec, ps.stock
        FROM product_skus ps
        JOIN products p ON p.id = ps.product_id
        WHERE ps.status = 1 AND p.status = 1 AND ps.stock < $1
        ORDER BY ps.stock ASC, p.name ASC, ps.id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(threshold)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM product_skus ps
        JOIN products p ON p.id = ps.product_id
        WHERE ps.status = 1 AND p.status = 1 AND ps.stock < $1
        "#,
    )
    .bind(threshold)
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Low stock",
        LowStockList { threshold, items },
        Some(meta),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    sku_id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Sku>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let sku = ProductSkus::find_by_id(sku_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = sku
        .stock
        .checked_add(payload.delta)
        .filter(|stock| *stock >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let previous = sku.stock;
    let mut active: SkuActive = sku.into();
    active.stock = Set(new_stock);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(sku_id = %updated.id, previous, stock = new_stock, "inventory adjusted");
    audit::record(
        &state.orm,
        user.user_id,
        "inventory_adjust",
        "product_skus",
        serde_json::json!({ "sku_id": updated.id, "delta": payload.delta, "stock": new_stock }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}
