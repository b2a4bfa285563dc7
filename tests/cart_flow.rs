mod common;

use common::{create_product, create_user, disable_sku, setup_state};
use petshop_api::{
    dto::cart::{AddToCartRequest, UpdateCartRequest},
    middleware::auth::{AuthUser, ROLE_USER},
    services::cart_service,
    state::AppState,
};
use uuid::Uuid;

async fn add(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    sku_id: Uuid,
    quantity: i32,
) -> Result<i32, petshop_api::error::AppError> {
    let resp = cart_service::add_to_cart(
        &state.pool,
        user,
        AddToCartRequest {
            product_id,
            sku_id,
            quantity,
        },
    )
    .await?;
    Ok(resp.data.map_or(0, |item| item.quantity))
}

#[tokio::test]
async fn adding_twice_accumulates_up_to_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(899, 5)]).await?;
    let (product, sku) = (fixture.product_id, fixture.sku_ids[0]);

    assert_eq!(add(&state, &user, product, sku, 2).await?, 2);
    assert_eq!(add(&state, &user, product, sku, 3).await?, 5);

    let err = add(&state, &user, product, sku, 1)
        .await
        .expect_err("stock is 5");
    assert_eq!(err.code(), "insufficient_stock");

    let err = add(&state, &user, product, sku, 0)
        .await
        .expect_err("zero quantity");
    assert_eq!(err.code(), "bad_request");

    let err = add(&state, &user, Uuid::new_v4(), sku, 1)
        .await
        .expect_err("sku belongs to another product");
    assert_eq!(err.code(), "not_found");
    Ok(())
}

#[tokio::test]
async fn oversized_add_is_rejected_without_touching_the_line() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(120, 5)]).await?;
    let (product, sku) = (fixture.product_id, fixture.sku_ids[0]);

    add(&state, &user, product, sku, 3).await?;
    let err = add(&state, &user, product, sku, i32::MAX)
        .await
        .expect_err("3 + i32::MAX does not fit");
    assert_eq!(err.code(), "bad_request");

    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_are_not_lost() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(300, 5)]).await?;
    let (product, sku) = (fixture.product_id, fixture.sku_ids[0]);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            add(&state, &user, product, sku, 1).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => accepted += 1,
            Err(err) => assert_eq!(err.code(), "insufficient_stock"),
        }
    }

    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(accepted, 5);
    assert_eq!(cart.items[0].quantity, 5);
    Ok(())
}

#[tokio::test]
async fn update_remove_and_clear() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let stranger = create_user(&state, ROLE_USER).await?;
    let fixture = create_product(&state, &[(450, 6), (650, 2), (990, 4)]).await?;
    let product = fixture.product_id;

    for sku in &fixture.sku_ids {
        add(&state, &user, product, *sku, 1).await?;
    }
    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 3);
    assert_eq!(cart.total_quantity, 3);
    assert_eq!(cart.total_amount, 450 + 650 + 990);
    let line_for = |sku: Uuid| {
        cart.items
            .iter()
            .find(|line| line.sku_id == sku)
            .map(|line| line.id)
            .expect("cart line")
    };
    let (first, second, third) = (
        line_for(fixture.sku_ids[0]),
        line_for(fixture.sku_ids[1]),
        line_for(fixture.sku_ids[2]),
    );

    let updated = cart_service::update_cart_item(&state.pool, &user, first, UpdateCartRequest { quantity: 4 })
        .await?
        .data
        .expect("line");
    assert_eq!(updated.quantity, 4);

    let err = cart_service::update_cart_item(&state.pool, &user, second, UpdateCartRequest { quantity: 3 })
        .await
        .expect_err("stock is 2");
    assert_eq!(err.code(), "insufficient_stock");

    let err = cart_service::update_cart_item(&state.pool, &stranger, first, UpdateCartRequest { quantity: 1 })
        .await
        .expect_err("not the owner");
    assert_eq!(err.code(), "not_found");

    disable_sku(&state, fixture.sku_ids[2]).await?;
    let err = cart_service::update_cart_item(&state.pool, &user, third, UpdateCartRequest { quantity: 2 })
        .await
        .expect_err("sku off shelf");
    assert_eq!(err.code(), "unavailable");

    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.total_quantity, 5, "off-shelf lines are left out of totals");
    assert_eq!(cart.total_amount, 450 * 4 + 650);

    cart_service::remove_from_cart(&state.pool, &user, second).await?;
    let err = cart_service::remove_from_cart(&state.pool, &user, second)
        .await
        .expect_err("already removed");
    assert_eq!(err.code(), "not_found");

    let cleared = cart_service::clear_cart(&state.pool, &user)
        .await?
        .data
        .expect("result");
    assert_eq!(cleared["removed"], 2);
    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());
    Ok(())
}
