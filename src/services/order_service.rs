use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutLine, CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_skus::{Column as SkuCol, Entity as ProductSkus},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, STATUS_ACTIVE, first_image},
    order_status::OrderStatus,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::address_service,
    state::AppState,
};

struct Receiver {
    name: String,
    phone: String,
    address: String,
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let lines = merge_lines(&payload.items)?;
    let receiver = resolve_receiver(state, user, &payload).await?;

    let txn = state.orm.begin().await?;

    let order_id = Uuid::new_v4();
    let mut total_amount: i64 = 0;
    let mut items = Vec::with_capacity(lines.len());

    // BTreeMap iteration is ascending by sku_id, so concurrent checkouts take row locks in one order.
    for (&sku_id, &quantity) in &lines {
        let sku = ProductSkus::find_by_id(sku_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let product = Products::find_by_id(sku.product_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if product.status != STATUS_ACTIVE || sku.status != STATUS_ACTIVE {
            return Err(AppError::Unavailable(format!(
                "{} ({}) is no longer on sale",
                product.name, sku.spec
            )));
        }
        if sku.stock < quantity {
            return Err(AppError::InsufficientStock {
                sku_id,
                name: product.name,
                requested: quantity,
                available: sku.stock,
            });
        }

        ProductSkus::update_many()
            .col_expr(SkuCol::Stock, Expr::col(SkuCol::Stock).sub(quantity))
            .col_expr(SkuCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(SkuCol::Id.eq(sku_id))
            .exec(&txn)
            .await?;
        Products::update_many()
            .col_expr(ProdCol::Sales, Expr::col(ProdCol::Sales).add(quantity))
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;

        let subtotal = sku
            .price
            .checked_mul(i64::from(quantity))
            .and_then(|subtotal| total_amount.checked_add(subtotal))
            .ok_or_else(|| AppError::BadRequest("Order amount is too large".into()))?;
        total_amount = subtotal;

        items.push(OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(product.id),
            sku_id: Set(sku_id),
            product_name: Set(product.name),
            spec: Set(sku.spec),
            image: Set(first_image(&product.main_images)),
            price: Set(sku.price),
            quantity: Set(quantity),
            created_at: NotSet,
        });
    }

    let order = OrderActive {
        id: Set(order_id),
        order_no: Set(build_order_no()),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        receiver_name: Set(receiver.name),
        receiver_phone: Set(receiver.phone),
        receiver_address: Set(receiver.address),
        remark: Set(payload.remark.filter(|r| !r.trim().is_empty())),
        paid_at: Set(None),
        shipped_at: Set(None),
        completed_at: Set(None),
        cancelled_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items = Vec::with_capacity(items.len());
    for item in items {
        order_items.push(OrderItem::from(item.insert(&txn).await?));
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::SkuId.is_in(lines.keys().copied()))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_no = %order.order_no,
        user_id = %user.user_id,
        total_amount,
        "order created"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: order.into(),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

/// Validates checkout lines and folds duplicate SKUs into one line each.
pub fn merge_lines(lines: &[CheckoutLine]) -> AppResult<BTreeMap<Uuid, i32>> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }

    let mut merged = BTreeMap::new();
    for line in lines {
        if line.quantity < 1 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
        let quantity: &mut i32 = merged.entry(line.sku_id).or_default();
        *quantity = quantity
            .checked_add(line.quantity)
            .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
    }
    Ok(merged)
}

async fn resolve_receiver(
    state: &AppState,
    user: &AuthUser,
    payload: &CheckoutRequest,
) -> AppResult<Receiver> {
    if let Some(address_id) = payload.address_id {
        let saved = address_service::find_owned(&state.orm, user.user_id, address_id).await?;
        let address = [saved.province, saved.city, saved.district, saved.detail]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        return Ok(Receiver {
            name: saved.name,
            phone: saved.phone,
            address,
        });
    }

    let inline = payload
        .address
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Shipping address is required".into()))?;
    inline
        .validate()
        .map_err(|msg| AppError::BadRequest(msg.into()))?;
    Ok(Receiver {
        name: inline.name.trim().to_string(),
        phone: inline.phone.trim().to_string(),
        address: inline.full_address(),
    })
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
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

    Ok(ApiResponse::success(
        "OK",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_user_order(&state.orm, user.user_id, id).await?;
    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    // Ownership check before taking the row lock.
    find_user_order(&txn, user.user_id, id).await?;
    let order = transition_order(&txn, id, OrderStatus::Cancelled, None).await?;
    let items = load_items(&txn, order.id).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "order_cancelled",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Moves an order to `target` inside `txn`.
///
/// The row is locked first so concurrent transitions on the same order run one
/// after another. The target's timestamp column and `updated_at` are stamped;
/// cancelling puts each item's quantity back on its SKU.
pub async fn transition_order(
    txn: &DatabaseTransaction,
    id: Uuid,
    target: OrderStatus,
    remark: Option<String>,
) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: OrderStatus = order.status.parse()?;
    let next = current.transition(target)?;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    match next {
        OrderStatus::Paid => active.paid_at = Set(Some(now.into())),
        OrderStatus::Shipped => active.shipped_at = Set(Some(now.into())),
        OrderStatus::Completed => active.completed_at = Set(Some(now.into())),
        OrderStatus::Cancelled => active.cancelled_at = Set(Some(now.into())),
        OrderStatus::Pending => {}
    }
    if let Some(remark) = remark.filter(|r| !r.trim().is_empty()) {
        active.remark = Set(Some(remark));
    }
    active.updated_at = Set(now.into());
    let order = active.update(txn).await?;

    if next == OrderStatus::Cancelled {
        restock(txn, order.id).await?;
    }

    tracing::info!(order_id = %order.id, from = %current, to = %next, "order status changed");
    Ok(order)
}

async fn restock(txn: &DatabaseTransaction, order_id: Uuid) -> AppResult<()> {
    let mut items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?;
    items.sort_by_key(|item| item.sku_id);

    for item in items {
        ProductSkus::update_many()
            .col_expr(SkuCol::Stock, Expr::col(SkuCol::Stock).add(item.quantity))
            .col_expr(SkuCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(SkuCol::Id.eq(item.sku_id))
            .exec(txn)
            .await?;
        Products::update_many()
            .col_expr(ProdCol::Sales, Expr::col(ProdCol::Sales).sub(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .filter(ProdCol::Sales.gte(item.quantity))
            .exec(txn)
            .await?;
    }
    Ok(())
}

pub async fn find_user_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<OrderModel> {
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect())
}

/// `ORD` + UTC timestamp to the second + six random digits.
pub fn build_order_no() -> String {
    let suffix = Uuid::new_v4().as_u128() % 1_000_000;
    format!("ORD{}{:06}", Utc::now().format("%Y%m%d%H%M%S"), suffix)
}
