use chrono::Days;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    dto::admin::{
        CategoryStat, DailyTrend, DashboardStats, PendingTasks, SalesPoint, SalesReport,
        StatusStat, TodayStats, TopProduct, TotalStats,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    order_status::OrderStatus,
    response::{ApiResponse, Meta},
    routes::params::SalesQuery,
    services::admin_service::day_start,
    state::AppState,
};

pub async fn dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;
    let pool = &state.pool;

    let today = sqlx::query_as::<_, TodayStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM orders WHERE created_at >= date_trunc('day', NOW())) AS order_count,
            (SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders
              WHERE created_at >= date_trunc('day', NOW())) AS total_amount,
            (SELECT COUNT(*) FROM users
              WHERE created_at >= date_trunc('day', NOW()) AND role = 'user') AS new_users
        "#,
    )
    .fetch_one(pool)
    .await?;

    let totals = sqlx::query_as::<_, TotalStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM orders) AS total_orders,
            (SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders
              WHERE status <> 'cancelled') AS total_sales,
            (SELECT COUNT(*) FROM users WHERE role = 'user') AS total_users,
            (SELECT COUNT(*) FROM products WHERE status = 1) AS total_products
        "#,
    )
    .fetch_one(pool)
    .await?;

    let by_status = sqlx::query_as::<_, StatusStat>(
        r#"
        SELECT status, COUNT(*) AS count, COALESCE(SUM(total_amount), 0)::BIGINT AS amount
        FROM orders
        GROUP BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    let last_7_days = sqlx::query_as::<_, DailyTrend>(
        r#"
        SELECT DATE(created_at) AS date,
               COUNT(*) AS order_count,
               COALESCE(SUM(total_amount), 0)::BIGINT AS total_amount
        FROM orders
        WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'
        GROUP BY DATE(created_at)
        ORDER BY date ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT p.id, p.name,
               COALESCE(p.main_images->>0, '') AS image,
               p.sales,
               MIN(ps.price)::BIGINT AS price
        FROM products p
        LEFT JOIN product_skus ps ON ps.product_id = p.id AND ps.status = 1
        WHERE p.status = 1
        GROUP BY p.id
        ORDER BY p.sales DESC, p.id
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await?;

    let categories = sqlx::query_as::<_, CategoryStat>(
        r#"
        SELECT c.id, c.name,
               COUNT(DISTINCT p.id) AS product_count,
               COALESCE(SUM(p.sales), 0)::BIGINT AS total_sales
        FROM categories c
        LEFT JOIN products p ON p.category_id = c.id AND p.status = 1
        WHERE c.status = 1 AND c.parent_id IS NULL
        GROUP BY c.id, c.name
        ORDER BY total_sales DESC, c.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let pending = sqlx::query_as::<_, PendingTasks>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders,
            (SELECT COUNT(*) FROM orders WHERE status = 'paid') AS paid_orders,
            (SELECT COUNT(*) FROM products WHERE status = 1) AS active_products,
            (SELECT COUNT(*) FROM product_skus WHERE status = 1 AND stock < $1) AS low_stock_skus
        "#,
    )
    .bind(state.config.low_stock_threshold)
    .fetch_one(pool)
    .await?;

    let stats = DashboardStats {
        today,
        totals,
        order_status: fill_status_stats(by_status),
        last_7_days,
        top_products,
        categories,
        pending,
    };
    Ok(ApiResponse::success("Dashboard", stats, Some(Meta::empty())))
}

/// One entry per known status in lifecycle order, zeros where no order has it.
pub fn fill_status_stats(rows: Vec<StatusStat>) -> Vec<StatusStat> {
    OrderStatus::ALL
        .iter()
        .map(|status| {
            rows.iter()
                .find(|row| row.status == status.as_str())
                .map(|row| StatusStat {
                    status: row.status.clone(),
                    count: row.count,
                    amount: row.amount,
                })
                .unwrap_or_else(|| StatusStat {
                    status: status.as_str().to_string(),
                    count: 0,
                    amount: 0,
                })
        })
        .collect()
}

pub async fn sales_report(
    state: &AppState,
    user: &AuthUser,
    query: SalesQuery,
) -> AppResult<ApiResponse<SalesReport>> {
    ensure_admin(user)?;
    let period = query.period.unwrap_or_default();

    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::BadRequest(
                "start_date must not be after end_date".into(),
            ));
        }
    }

    let mut builder = QueryBuilder::<Postgres>::new("SELECT date_trunc(");
    builder
        .push_bind(period.as_str())
        .push(
            r#", created_at) AS period,
               COUNT(*) AS order_count,
               COALESCE(SUM(CASE WHEN status <> 'cancelled' THEN total_amount ELSE 0 END), 0)::BIGINT AS total_amount,
               COALESCE(SUM(CASE WHEN status = 'completed' THEN total_amount ELSE 0 END), 0)::BIGINT AS completed_amount
        FROM orders
        WHERE 1 = 1"#,
        );
    if let Some(start) = query.start_date {
        builder
            .push(" AND created_at >= ")
            .push_bind(day_start(start));
    }
    if let Some(end) = query.end_date {
        let next = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::BadRequest("end_date is out of range".into()))?;
        builder.push(" AND created_at < ").push_bind(day_start(next));
    }
    builder.push(" GROUP BY 1 ORDER BY 1 DESC");

    let items = builder
        .build_query_as::<SalesPoint>()
        .fetch_all(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Sales",
        SalesReport {
            period: period.as_str().to_string(),
            items,
        },
        Some(Meta::empty()),
    ))
}
