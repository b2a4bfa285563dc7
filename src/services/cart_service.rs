use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::cart::{AddToCartRequest, CartLine, CartList, UpdateCartRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct SkuAvailability {
    product_name: String,
    stock: i32,
    active: bool,
}

pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let items = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT ci.id, ci.product_id, ci.sku_id,
               p.name AS product_name,
               COALESCE(p.main_images->>0, '') AS image,
               ps.spec, ps.price, ps.stock, ci.quantity,
               (p.status = 1 AND ps.status = 1) AS available
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        JOIN product_skus ps ON ps.id = ci.sku_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let (total_quantity, total_amount) = cart_totals(&items);
    let meta = Meta::new(1, items.len() as i64, items.len() as i64);
    Ok(ApiResponse::success(
        "OK",
        CartList {
            items,
            total_quantity,
            total_amount,
        },
        Some(meta),
    ))
}

/// Quantity and amount over lines that can still be bought.
pub fn cart_totals(lines: &[CartLine]) -> (i64, i64) {
    lines
        .iter()
        .filter(|line| line.available)
        .fold((0, 0), |(quantity, amount), line| {
            let q = i64::from(line.quantity);
            (quantity + q, amount + line.price * q)
        })
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let sku = sqlx::query_as::<_, SkuAvailability>(
        r#"
        SELECT p.name AS product_name, ps.stock, (p.status = 1 AND ps.status = 1) AS active
        FROM product_skus ps
        JOIN products p ON p.id = ps.product_id
        WHERE ps.id = $1 AND ps.product_id = $2
        "#,
    )
    .bind(payload.sku_id)
    .bind(payload.product_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    if !sku.active {
        return Err(AppError::Unavailable(format!(
            "{} is no longer on sale",
            sku.product_name
        )));
    }

    let existing: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE user_id = $1 AND sku_id = $2")
            .bind(user.user_id)
            .bind(payload.sku_id)
            .fetch_optional(pool)
            .await?;

    let requested = existing
        .map_or(0, |(q,)| q)
        .checked_add(payload.quantity)
        .ok_or_else(|| AppError::BadRequest("quantity is too large".to_string()))?;
    let insufficient = |requested| AppError::InsufficientStock {
        sku_id: payload.sku_id,
        name: sku.product_name.clone(),
        requested,
        available: sku.stock,
    };
    if requested > sku.stock {
        return Err(insufficient(requested));
    }

    // The merge happens in SQL so concurrent adds to one line accumulate.
    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, user_id, product_id, sku_id, quantity)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, sku_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW()
        WHERE cart_items.quantity::BIGINT + EXCLUDED.quantity <= $6
        RETURNING id, user_id, product_id, sku_id, quantity, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.sku_id)
    .bind(payload.quantity)
    .bind(sku.stock)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| insufficient(requested))?;

    tracing::debug!(
        user_id = %user.user_id,
        sku_id = %payload.sku_id,
        quantity = cart_item.quantity,
        "cart updated"
    );
    Ok(ApiResponse::success("Added to cart", cart_item, Some(Meta::empty())))
}

pub async fn update_cart_item(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let row: Option<(Uuid, String, i32, bool)> = sqlx::query_as(
        r#"
        SELECT ci.sku_id, p.name, ps.stock, (p.status = 1 AND ps.status = 1)
        FROM cart_items ci
        JOIN product_skus ps ON ps.id = ci.sku_id
        JOIN products p ON p.id = ci.product_id
        WHERE ci.id = $1 AND ci.user_id = $2
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(pool)
    .await?;
    let (sku_id, name, stock, active) = row.ok_or(AppError::NotFound)?;

    if !active {
        return Err(AppError::Unavailable(format!("{name} is no longer on sale")));
    }

    if payload.quantity > stock {
        return Err(AppError::InsufficientStock {
            sku_id,
            name,
            requested: payload.quantity,
            available: stock,
        });
    }

    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        UPDATE cart_items
        SET quantity = $3, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, product_id, sku_id, quantity, created_at
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.quantity)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Updated", cart_item, Some(Meta::empty())))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}
