#![allow(dead_code)]

use petshop_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::orders::{CheckoutLine, CheckoutRequest, ShippingAddress},
    entity::{
        categories::ActiveModel as CategoryActive,
        product_skus::{ActiveModel as SkuActive, Column as SkuCol, Entity as ProductSkus},
        products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connects to the test database, or `None` when none is configured.
///
/// Fixtures use fresh ids and names, so tests in one binary can share the database
/// without truncating it.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database tests.");
            return Ok(None);
        }
    };

    let config = AppConfig::for_database(database_url);
    let orm = create_orm_conn(&config).await?;
    MIGRATED
        .get_or_try_init(|| async { run_migrations(&orm).await })
        .await?;

    Ok(Some(AppState::from_orm(orm, config)))
}

pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    let tag = id.simple().to_string();
    UserActive {
        id: Set(id),
        username: Set(format!("u_{}", &tag[..16])),
        nickname: Set("Test Shopper".into()),
        phone: Set(format!("p{}", &tag[..16])),
        role: Set(role.into()),
        status: Set(1),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: id,
        role: role.into(),
    })
}

pub struct Fixture {
    pub product_id: Uuid,
    pub category_id: Uuid,
    pub sku_ids: Vec<Uuid>,
}

/// Short random marker for names that searches can single out.
pub fn unique_tag() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub async fn create_category(
    state: &AppState,
    name: &str,
    parent_id: Option<Uuid>,
    sort: i32,
) -> anyhow::Result<Uuid> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        parent_id: Set(parent_id),
        name: Set(name.to_string()),
        icon: Set(None),
        sort: Set(sort),
        status: Set(1),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

/// One on-shelf product with a SKU per `(price, stock)` pair.
pub async fn create_product(state: &AppState, skus: &[(i64, i32)]) -> anyhow::Result<Fixture> {
    create_named_product(state, &format!("Test Kibble {}", unique_tag()), skus).await
}

pub async fn create_named_product(
    state: &AppState,
    name: &str,
    skus: &[(i64, i32)],
) -> anyhow::Result<Fixture> {
    let tag = unique_tag();
    let category_id = create_category(state, &format!("Category {tag}"), None, 0).await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        brand_id: Set(None),
        name: Set(name.to_string()),
        subtitle: Set(Some("For testing".into())),
        main_images: Set(serde_json::json!(["/images/test.jpg"])),
        detail: Set(String::new()),
        pet_type: Set(Some(1)),
        sales: Set(0),
        views: Set(0),
        status: Set(1),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let mut sku_ids = Vec::with_capacity(skus.len());
    for (index, (price, stock)) in skus.iter().enumerate() {
        let sku = SkuActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            sku_code: Set(format!("T-{tag}-{index}")),
            spec: Set(format!("Size {index}")),
            price: Set(*price),
            original_price: Set(None),
            stock: Set(*stock),
            status: Set(1),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
        sku_ids.push(sku.id);
    }

    Ok(Fixture {
        product_id: product.id,
        category_id,
        sku_ids,
    })
}

/// Takes a SKU off the shelf.
pub async fn disable_sku(state: &AppState, sku_id: Uuid) -> anyhow::Result<()> {
    ProductSkus::update_many()
        .col_expr(SkuCol::Status, Expr::value(2i16))
        .filter(SkuCol::Id.eq(sku_id))
        .exec(&state.orm)
        .await?;
    Ok(())
}

pub async fn sku_stock(state: &AppState, sku_id: Uuid) -> anyhow::Result<i32> {
    let sku = ProductSkus::find_by_id(sku_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("sku {sku_id} missing"))?;
    Ok(sku.stock)
}

pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        name: "Han Meimei".into(),
        phone: "13700000000".into(),
        province: "Guangdong".into(),
        city: "Shenzhen".into(),
        district: "Nanshan".into(),
        detail: "8 Keyuan Rd".into(),
    }
}

pub fn checkout_request(lines: &[(Uuid, i32)]) -> CheckoutRequest {
    CheckoutRequest {
        items: lines
            .iter()
            .map(|(sku_id, quantity)| CheckoutLine {
                sku_id: *sku_id,
                quantity: *quantity,
            })
            .collect(),
        address: Some(shipping_address()),
        address_id: None,
        remark: None,
    }
}
