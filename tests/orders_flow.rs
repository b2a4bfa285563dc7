mod common;

use common::{
    checkout_request, create_product, create_user, disable_sku, setup_state, sku_stock,
};
use petshop_api::{
    dto::{
        addresses::AddressRequest,
        admin::{InventoryAdjustRequest, UpdateOrderStatusRequest},
        cart::AddToCartRequest,
        orders::CheckoutRequest,
        payments::{CreatePaymentRequest, PaymentCallbackRequest},
    },
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    routes::params::{AdminOrderQuery, LowStockQuery, OrderListQuery},
    services::{address_service, admin_service, cart_service, order_service, payment_service},
};

// Cart -> checkout: stock math, merged lines, totals and cart cleanup.
#[tokio::test]
async fn checkout_decrements_stock_and_captures_totals() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(1299, 10), (2599, 5)]).await?;
    let (small, large) = (fixture.sku_ids[0], fixture.sku_ids[1]);

    for sku_id in [small, large] {
        cart_service::add_to_cart(
            &state.pool,
            &user,
            AddToCartRequest {
                product_id: fixture.product_id,
                sku_id,
                quantity: 1,
            },
        )
        .await?;
    }

    let resp = order_service::checkout(
        &state,
        &user,
        checkout_request(&[(small, 2), (large, 1), (small, 1)]),
    )
    .await?;
    let placed = resp.data.expect("order data");

    assert_eq!(placed.order.status, "pending");
    assert!(placed.order.order_no.starts_with("ORD"));
    assert_eq!(placed.order.total_amount, 1299 * 3 + 2599);
    assert_eq!(placed.items.len(), 2, "duplicate sku lines are merged");
    let items_total: i64 = placed.items.iter().map(|item| item.subtotal).sum();
    assert_eq!(items_total, placed.order.total_amount);
    assert_eq!(placed.order.receiver_address, "Guangdong Shenzhen Nanshan 8 Keyuan Rd");

    assert_eq!(sku_stock(&state, small).await?, 7);
    assert_eq!(sku_stock(&state, large).await?, 4);

    let cart = cart_service::list_cart(&state.pool, &user).await?;
    assert!(cart.data.expect("cart").items.is_empty());

    let fetched = order_service::get_order(&state, &user, placed.order.id).await?;
    assert_eq!(fetched.data.expect("order").items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn failed_checkout_rolls_back_every_line() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(500, 5), (500, 1)]).await?;
    let (plenty, scarce) = (fixture.sku_ids[0], fixture.sku_ids[1]);

    let err = order_service::checkout(&state, &user, checkout_request(&[(plenty, 2), (scarce, 3)]))
        .await
        .expect_err("scarce sku cannot cover 3");
    assert_eq!(err.code(), "insufficient_stock");

    assert_eq!(sku_stock(&state, plenty).await?, 5);
    assert_eq!(sku_stock(&state, scarce).await?, 1);

    let orders = order_service::list_orders(&state, &user, OrderListQuery::default()).await?;
    assert!(orders.data.expect("orders").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn checkout_validates_input() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(800, 4)]).await?;
    let sku = fixture.sku_ids[0];

    let no_address = CheckoutRequest {
        address: None,
        ..checkout_request(&[(sku, 1)])
    };
    let err = order_service::checkout(&state, &user, no_address)
        .await
        .expect_err("address required");
    assert_eq!(err.code(), "bad_request");

    let err = order_service::checkout(&state, &user, checkout_request(&[(uuid::Uuid::new_v4(), 1)]))
        .await
        .expect_err("unknown sku");
    assert_eq!(err.code(), "not_found");

    disable_sku(&state, sku).await?;
    let err = order_service::checkout(&state, &user, checkout_request(&[(sku, 1)]))
        .await
        .expect_err("sku off shelf");
    assert_eq!(err.code(), "unavailable");
    assert_eq!(sku_stock(&state, sku).await?, 4);
    Ok(())
}

#[tokio::test]
async fn checkout_with_saved_address() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let stranger = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(1000, 3)]).await?;

    let saved = address_service::create_address(
        &state,
        &user,
        AddressRequest {
            name: "Wang Fang".into(),
            phone: "13600000000".into(),
            province: "Sichuan".into(),
            city: "Chengdu".into(),
            district: String::new(),
            detail: "3 Jinli St".into(),
            postal_code: None,
            is_default: false,
        },
    )
    .await?
    .data
    .expect("address");
    assert!(saved.is_default, "first address becomes the default");

    let request = CheckoutRequest {
        address: None,
        address_id: Some(saved.id),
        ..checkout_request(&[(fixture.sku_ids[0], 1)])
    };
    let order = order_service::checkout(&state, &user, request)
        .await?
        .data
        .expect("order")
        .order;
    assert_eq!(order.receiver_name, "Wang Fang");
    assert_eq!(order.receiver_address, "Sichuan Chengdu 3 Jinli St");

    let foreign = CheckoutRequest {
        address: None,
        address_id: Some(saved.id),
        ..checkout_request(&[(fixture.sku_ids[0], 1)])
    };
    let err = order_service::checkout(&state, &stranger, foreign)
        .await
        .expect_err("someone else's address");
    assert_eq!(err.code(), "not_found");
    Ok(())
}

// pending -> paid -> shipped -> completed, with the illegal moves in between.
#[tokio::test]
async fn order_lifecycle_through_payment_and_admin() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let admin = create_user(&state, ROLE_ADMIN).await?;
    let fixture = create_product(&state, &[(4200, 10)]).await?;

    let order = order_service::checkout(&state, &user, checkout_request(&[(fixture.sku_ids[0], 2)]))
        .await?
        .data
        .expect("order")
        .order;

    let status_update = |status: &str| UpdateOrderStatusRequest {
        status: status.to_string(),
        remark: None,
    };

    let err = admin_service::update_order_status(&state, &admin, order.id, status_update("shipped"))
        .await
        .expect_err("pending cannot ship");
    assert_eq!(err.code(), "invalid_transition");

    let intent = payment_service::create_payment(
        &state,
        &user,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: "alipay".into(),
        },
    )
    .await?
    .data
    .expect("intent");
    assert_eq!(intent.amount, 8400);
    assert!(intent.payment_url.contains(&intent.payment_no));
    assert!(intent.expires_at > chrono::Utc::now());

    let err = payment_service::payment_callback(
        &state,
        &user,
        PaymentCallbackRequest {
            payment_no: intent.payment_no.clone(),
            order_id: order.id,
            status: "failed".into(),
        },
    )
    .await
    .expect_err("gateway failure");
    assert_eq!(err.code(), "payment_failed");
    let still_pending = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .expect("order")
        .order;
    assert_eq!(still_pending.status, "pending");

    let paid = payment_service::payment_callback(
        &state,
        &user,
        PaymentCallbackRequest {
            payment_no: intent.payment_no.clone(),
            order_id: order.id,
            status: "success".into(),
        },
    )
    .await?
    .data
    .expect("payment result");
    assert_eq!(paid.status, "paid");

    let err = payment_service::create_payment(
        &state,
        &user,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: "alipay".into(),
        },
    )
    .await
    .expect_err("already paid");
    assert_eq!(err.code(), "invalid_transition");

    let shipped = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
            remark: Some("SF123456".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.status, "shipped");
    assert!(shipped.paid_at.is_some());
    assert!(shipped.shipped_at.is_some());
    assert_eq!(shipped.remark.as_deref(), Some("SF123456"));

    let err = order_service::cancel_order(&state, &user, order.id)
        .await
        .expect_err("shipped orders cannot be cancelled");
    assert_eq!(err.code(), "invalid_transition");

    let completed = admin_service::update_order_status(&state, &admin, order.id, status_update("completed"))
        .await?
        .data
        .expect("order");
    assert_eq!(completed.status, "completed");
    assert!(completed.completed_at.is_some());

    let err = admin_service::update_order_status(&state, &admin, order.id, status_update("refunded"))
        .await
        .expect_err("unknown status");
    assert_eq!(err.code(), "invalid_status");

    let detail = admin_service::get_order_admin(&state, &admin, order.id)
        .await?
        .data
        .expect("detail");
    assert_eq!(detail.user.map(|u| u.id), Some(user.user_id));
    assert_eq!(detail.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn cancel_restores_stock_once() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let stranger = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(300, 10)]).await?;
    let sku = fixture.sku_ids[0];

    let order = order_service::checkout(&state, &user, checkout_request(&[(sku, 3)]))
        .await?
        .data
        .expect("order")
        .order;
    assert_eq!(sku_stock(&state, sku).await?, 7);

    let err = order_service::cancel_order(&state, &stranger, order.id)
        .await
        .expect_err("not the owner");
    assert_eq!(err.code(), "not_found");

    let cancelled = order_service::cancel_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.order.status, "cancelled");
    assert!(cancelled.order.cancelled_at.is_some());
    assert_eq!(sku_stock(&state, sku).await?, 10);

    let err = order_service::cancel_order(&state, &user, order.id)
        .await
        .expect_err("already cancelled");
    assert_eq!(err.code(), "invalid_transition");
    assert_eq!(sku_stock(&state, sku).await?, 10);
    Ok(())
}

#[tokio::test]
async fn admin_inventory_and_access_control() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let admin = create_user(&state, ROLE_ADMIN).await?;
    let fixture = create_product(&state, &[(990, 2)]).await?;
    let sku = fixture.sku_ids[0];

    let err = admin_service::list_low_stock(&state, &user, LowStockQuery::default())
        .await
        .expect_err("users are not admins");
    assert_eq!(err.code(), "forbidden");

    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            threshold: Some(5),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("low stock");
    assert_eq!(low.threshold, 5);
    assert!(low.items.iter().any(|item| item.sku_id == sku && item.stock == 2));

    let err = admin_service::adjust_inventory(&state, &admin, sku, InventoryAdjustRequest { delta: -3 })
        .await
        .expect_err("stock would go negative");
    assert_eq!(err.code(), "bad_request");
    assert_eq!(sku_stock(&state, sku).await?, 2);

    let adjusted = admin_service::adjust_inventory(&state, &admin, sku, InventoryAdjustRequest { delta: 48 })
        .await?
        .data
        .expect("sku");
    assert_eq!(adjusted.stock, 50);
    assert_eq!(sku_stock(&state, sku).await?, 50);
    Ok(())
}

#[tokio::test]
async fn payment_callback_checks_order_state_first() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(1500, 5)]).await?;
    let order = order_service::checkout(&state, &user, checkout_request(&[(fixture.sku_ids[0], 1)]))
        .await?
        .data
        .expect("order")
        .order;

    let callback = |payment_no: &str, status: &str| PaymentCallbackRequest {
        payment_no: payment_no.to_string(),
        order_id: order.id,
        status: status.to_string(),
    };

    let err = payment_service::payment_callback(&state, &user, callback("  ", "success"))
        .await
        .expect_err("payment number required");
    assert_eq!(err.code(), "bad_request");

    order_service::cancel_order(&state, &user, order.id).await?;

    let err = payment_service::payment_callback(&state, &user, callback("PAY1", "failed"))
        .await
        .expect_err("cancelled orders cannot be paid");
    assert_eq!(err.code(), "invalid_transition");

    let err = payment_service::payment_callback(&state, &user, callback("PAY1", "success"))
        .await
        .expect_err("cancelled orders cannot be paid");
    assert_eq!(err.code(), "invalid_transition");
    Ok(())
}

#[tokio::test]
async fn admin_order_filters() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let admin = create_user(&state, ROLE_ADMIN).await?;
    let fixture = create_product(&state, &[(700, 5)]).await?;
    let order = order_service::checkout(&state, &user, checkout_request(&[(fixture.sku_ids[0], 1)]))
        .await?
        .data
        .expect("order")
        .order;

    let today = chrono::Utc::now().date_naive();
    let by_keyword = |status: Option<&str>| AdminOrderQuery {
        keyword: Some(order.order_no.clone()),
        status: status.map(str::to_string),
        ..Default::default()
    };

    let found = admin_service::list_all_orders(&state, &admin, by_keyword(None)).await?;
    assert_eq!(found.meta.as_ref().and_then(|m| m.total), Some(1));
    assert_eq!(found.data.expect("orders").items[0].id, order.id);

    let pending = admin_service::list_all_orders(&state, &admin, by_keyword(Some("pending")))
        .await?
        .data
        .expect("orders");
    assert_eq!(pending.items.len(), 1);

    let paid = admin_service::list_all_orders(&state, &admin, by_keyword(Some("paid")))
        .await?
        .data
        .expect("orders");
    assert!(paid.items.is_empty());

    let within_today = AdminOrderQuery {
        start_date: Some(today),
        end_date: Some(today),
        ..by_keyword(None)
    };
    let listed = admin_service::list_all_orders(&state, &admin, within_today)
        .await?
        .data
        .expect("orders");
    assert_eq!(listed.items.len(), 1, "end_date covers the whole day");

    let before_today = AdminOrderQuery {
        end_date: today.pred_opt(),
        ..by_keyword(None)
    };
    let listed = admin_service::list_all_orders(&state, &admin, before_today)
        .await?
        .data
        .expect("orders");
    assert!(listed.items.is_empty());

    let after_today = AdminOrderQuery {
        start_date: today.succ_opt(),
        ..by_keyword(None)
    };
    let listed = admin_service::list_all_orders(&state, &admin, after_today)
        .await?
        .data
        .expect("orders");
    assert!(listed.items.is_empty());

    let err = admin_service::list_all_orders(&state, &admin, by_keyword(Some("lost")))
        .await
        .expect_err("unknown status");
    assert_eq!(err.code(), "invalid_status");

    let err = admin_service::list_all_orders(&state, &user, AdminOrderQuery::default())
        .await
        .expect_err("users are not admins");
    assert_eq!(err.code(), "forbidden");
    Ok(())
}
