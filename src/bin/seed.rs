use petshop_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    state::AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

struct SeedSku {
    code: &'static str,
    spec: &'static str,
    price: i64,
    original_price: Option<i64>,
    stock: i32,
}

struct SeedProduct {
    name: &'static str,
    subtitle: &'static str,
    category: &'static str,
    brand: &'static str,
    pet_type: i16,
    image: &'static str,
    skus: &'static [SeedSku],
}

const PET_DOG: i16 = 1;
const PET_CAT: i16 = 2;

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Dog Supplies", &["Dog Food", "Dog Toys", "Dog Grooming"]),
    ("Cat Supplies", &["Cat Food", "Cat Litter", "Cat Toys"]),
    ("Small Pets", &["Hamster Food", "Cages"]),
];

const BRANDS: &[(&str, &str)] = &[
    ("Royal Canin", "Breed-specific nutrition"),
    ("Purina", "Everyday pet food"),
    ("Pedigree", "Dog food and treats"),
    ("Whiskas", "Cat food"),
    ("Kong", "Durable toys"),
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Royal Canin Medium Adult Dry Dog Food",
        subtitle: "For medium breeds, 12 months to 7 years",
        category: "Dog Food",
        brand: "Royal Canin",
        pet_type: PET_DOG,
        image: "/images/products/rc-medium-adult.jpg",
        skus: &[
            SeedSku { code: "RC-MA-4KG", spec: "4kg", price: 23900, original_price: Some(25900), stock: 120 },
            SeedSku { code: "RC-MA-10KG", spec: "10kg", price: 52900, original_price: Some(56900), stock: 60 },
        ],
    },
    SeedProduct {
        name: "Pedigree Beef Adult Dog Food",
        subtitle: "Complete nutrition with real beef",
        category: "Dog Food",
        brand: "Pedigree",
        pet_type: PET_DOG,
        image: "/images/products/pedigree-beef.jpg",
        skus: &[
            SeedSku { code: "PD-BF-1.5KG", spec: "1.5kg", price: 5900, original_price: None, stock: 200 },
            SeedSku { code: "PD-BF-7.5KG", spec: "7.5kg", price: 19900, original_price: Some(21900), stock: 8 },
        ],
    },
    SeedProduct {
        name: "Kong Classic Chew Toy",
        subtitle: "Stuffable rubber toy",
        category: "Dog Toys",
        brand: "Kong",
        pet_type: PET_DOG,
        image: "/images/products/kong-classic.jpg",
        skus: &[
            SeedSku { code: "KG-CL-S", spec: "Small", price: 6900, original_price: None, stock: 80 },
            SeedSku { code: "KG-CL-M", spec: "Medium", price: 8900, original_price: None, stock: 5 },
            SeedSku { code: "KG-CL-L", spec: "Large", price: 10900, original_price: None, stock: 40 },
        ],
    },
    SeedProduct {
        name: "Whiskas Tuna Adult Cat Food",
        subtitle: "Wet pouches, ocean tuna",
        category: "Cat Food",
        brand: "Whiskas",
        pet_type: PET_CAT,
        image: "/images/products/whiskas-tuna.jpg",
        skus: &[
            SeedSku { code: "WK-TN-12P", spec: "12 x 85g", price: 4500, original_price: Some(4900), stock: 150 },
            SeedSku { code: "WK-TN-24P", spec: "24 x 85g", price: 8500, original_price: Some(9800), stock: 90 },
        ],
    },
    SeedProduct {
        name: "Purina Tidy Cats Clumping Litter",
        subtitle: "Low dust, odor control",
        category: "Cat Litter",
        brand: "Purina",
        pet_type: PET_CAT,
        image: "/images/products/tidy-cats.jpg",
        skus: &[
            SeedSku { code: "PR-TC-9KG", spec: "9kg", price: 7900, original_price: None, stock: 3 },
        ],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")?;
    let config = AppConfig::for_database(database_url);
    let orm = create_orm_conn(&config).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let state = AppState::from_orm(orm, config);
    let pool = &state.pool;

    let admin_id = ensure_user(pool, "admin", "Store Admin", "13800000000", ROLE_ADMIN).await?;
    let user_id = ensure_user(pool, "demo", "Demo Shopper", "13900000000", ROLE_USER).await?;

    for (sort, (root, children)) in CATEGORIES.iter().enumerate() {
        let root_id = ensure_category(pool, None, root, sort as i32).await?;
        for (child_sort, child) in children.iter().enumerate() {
            ensure_category(pool, Some(root_id), child, child_sort as i32).await?;
        }
    }

    for (sort, (name, description)) in BRANDS.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO brands (id, name, description, sort)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(*name)
        .bind(*description)
        .bind(sort as i32)
        .execute(pool)
        .await?;
    }

    for product in PRODUCTS {
        seed_product(pool, product).await?;
    }

    tracing::info!(%admin_id, %user_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    nickname: &str,
    phone: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, nickname, phone, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(nickname)
    .bind(phone)
    .bind(role)
    .fetch_one(pool)
    .await?;

    tracing::info!(username, role, "ensured user");
    Ok(id)
}

async fn ensure_category(
    pool: &sqlx::PgPool,
    parent_id: Option<Uuid>,
    name: &str,
    sort: i32,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM categories WHERE name = $1 AND parent_id IS NOT DISTINCT FROM $2",
    )
    .bind(name)
    .bind(parent_id)
    .fetch_optional(pool)
    .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, parent_id, name, sort) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(parent_id)
        .bind(name)
        .bind(sort)
        .execute(pool)
        .await?;
    Ok(id)
}

async fn seed_product(pool: &sqlx::PgPool, product: &SeedProduct) -> anyhow::Result<()> {
    let (category_id,): (Uuid,) =
        sqlx::query_as("SELECT id FROM categories WHERE name = $1 AND parent_id IS NOT NULL")
            .bind(product.category)
            .fetch_one(pool)
            .await?;
    let (brand_id,): (Uuid,) = sqlx::query_as("SELECT id FROM brands WHERE name = $1")
        .bind(product.brand)
        .fetch_one(pool)
        .await?;

    let (product_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO products (id, category_id, brand_id, name, subtitle, main_images, detail, pet_type)
        VALUES ($1, $2, $3, $4, $5, $6::jsonb, $7, $8)
        ON CONFLICT (name) DO UPDATE SET updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(category_id)
    .bind(brand_id)
    .bind(product.name)
    .bind(product.subtitle)
    .bind(serde_json::json!([product.image]).to_string())
    .bind(format!("<p>{}</p>", product.subtitle))
    .bind(product.pet_type)
    .fetch_one(pool)
    .await?;

    for sku in product.skus {
        sqlx::query(
            r#"
            INSERT INTO product_skus (id, product_id, sku_code, spec, price, original_price, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (sku_code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(sku.code)
        .bind(sku.spec)
        .bind(sku.price)
        .bind(sku.original_price)
        .bind(sku.stock)
        .execute(pool)
        .await?;
    }

    tracing::info!(name = product.name, skus = product.skus.len(), "seeded product");
    Ok(())
}
