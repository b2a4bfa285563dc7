mod common;

use common::{checkout_request, create_product, create_user, setup_state};
use petshop_api::{
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    routes::params::{SalesPeriod, SalesQuery},
    services::{order_service, statistics_service},
};

#[tokio::test]
async fn dashboard_reflects_a_new_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let admin = create_user(&state, ROLE_ADMIN).await?;
    let fixture = create_product(&state, &[(2500, 12)]).await?;

    order_service::checkout(&state, &user, checkout_request(&[(fixture.sku_ids[0], 2)])).await?;

    let stats = statistics_service::dashboard(&state, &admin)
        .await?
        .data
        .expect("dashboard");

    assert!(stats.today.order_count >= 1);
    assert!(stats.today.total_amount >= 5000);
    assert!(stats.today.new_users >= 1);
    assert!(stats.totals.total_orders >= stats.today.order_count);
    assert!(stats.totals.total_users >= 1);

    let statuses: Vec<&str> = stats.order_status.iter().map(|s| s.status.as_str()).collect();
    assert_eq!(statuses, vec!["pending", "paid", "shipped", "completed", "cancelled"]);
    assert!(stats.order_status[0].count >= 1);
    assert!(stats.pending.pending_orders >= 1);

    assert!(!stats.last_7_days.is_empty());
    assert!(stats.last_7_days.len() <= 8);
    assert!(stats.top_products.len() <= 10);

    let category = stats
        .categories
        .iter()
        .find(|c| c.id == fixture.category_id)
        .expect("root category listed");
    assert_eq!(category.product_count, 1);
    assert_eq!(category.total_sales, 2);

    let err = statistics_service::dashboard(&state, &user)
        .await
        .expect_err("users are not admins");
    assert_eq!(err.code(), "forbidden");
    Ok(())
}

#[tokio::test]
async fn sales_report_groups_by_period() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let admin = create_user(&state, ROLE_ADMIN).await?;
    let fixture = create_product(&state, &[(1800, 5)]).await?;
    order_service::checkout(&state, &user, checkout_request(&[(fixture.sku_ids[0], 1)])).await?;

    let today = chrono::Utc::now().date_naive();
    for (period, label) in [
        (SalesPeriod::Day, "day"),
        (SalesPeriod::Week, "week"),
        (SalesPeriod::Month, "month"),
    ] {
        let report = statistics_service::sales_report(
            &state,
            &admin,
            SalesQuery {
                period: Some(period),
                start_date: Some(today),
                end_date: Some(today),
            },
        )
        .await?
        .data
        .expect("report");
        assert_eq!(report.period, label);
        assert!(!report.items.is_empty());
        let orders: i64 = report.items.iter().map(|p| p.order_count).sum();
        let amount: i64 = report.items.iter().map(|p| p.total_amount).sum();
        assert!(orders >= 1);
        assert!(amount >= 1800);
    }

    let report = statistics_service::sales_report(&state, &admin, SalesQuery::default())
        .await?
        .data
        .expect("report");
    assert_eq!(report.period, "day");
    let periods: Vec<_> = report.items.iter().map(|p| p.period).collect();
    let mut sorted = periods.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(periods, sorted, "newest period first");

    let err = statistics_service::sales_report(
        &state,
        &admin,
        SalesQuery {
            period: None,
            start_date: today.succ_opt(),
            end_date: Some(today),
        },
    )
    .await
    .expect_err("start after end");
    assert_eq!(err.code(), "bad_request");

    let err = statistics_service::sales_report(&state, &user, SalesQuery::default())
        .await
        .expect_err("users are not admins");
    assert_eq!(err.code(), "forbidden");
    Ok(())
}
