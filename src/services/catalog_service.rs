use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, sea_query::Expr};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dto::catalog::{BrandList, CategoryTree, ProductList},
    entity::{
        brands::{Column as BrandCol, Entity as Brands},
        categories::{Column as CategoryCol, Entity as Categories},
        product_skus::{Column as SkuCol, Entity as ProductSkus},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{Category, CategoryNode, ProductDetail, ProductSummary, STATUS_ACTIVE, Sku},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryTree>> {
    let categories = Categories::find()
        .filter(CategoryCol::Status.eq(STATUS_ACTIVE))
        .order_by_asc(CategoryCol::Sort)
        .order_by_asc(CategoryCol::CreatedAt)
        .order_by_asc(CategoryCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    let items = build_category_tree(categories);
    let total = items.len();
    Ok(ApiResponse::success(
        "Categories",
        CategoryTree { items, total },
        Some(Meta::empty()),
    ))
}

/// Nests categories under their parents, keeping input order at every level.
///
/// Categories whose parent is absent from the input (deleted or disabled) are
/// dropped along with their subtree.
pub fn build_category_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let known: HashSet<Uuid> = categories.iter().map(|c| c.id).collect();
    let mut children: HashMap<Uuid, Vec<Category>> = HashMap::new();
    let mut roots = Vec::new();

    for category in categories {
        match category.parent_id {
            None => roots.push(category),
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(category)
            }
            Some(_) => {}
        }
    }

    roots
        .into_iter()
        .map(|root| attach_children(root, &mut children))
        .collect()
}

// Each bucket is removed once it is consumed, so a malformed parent cycle cannot recurse forever.
fn attach_children(
    category: Category,
    children: &mut HashMap<Uuid, Vec<Category>>,
) -> CategoryNode {
    let direct = children.remove(&category.id).unwrap_or_default();
    CategoryNode {
        id: category.id,
        parent_id: category.parent_id,
        name: category.name,
        icon: category.icon,
        sort: category.sort,
        children: direct
            .into_iter()
            .map(|child| attach_children(child, children))
            .collect(),
    }
}

pub async fn list_brands(state: &AppState) -> AppResult<ApiResponse<BrandList>> {
    let items = Brands::find()
        .filter(BrandCol::Status.eq(STATUS_ACTIVE))
        .order_by_asc(BrandCol::Sort)
        .order_by_asc(BrandCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::success(
        "Brands",
        BrandList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut select = QueryBuilder::<Postgres>::new(
        r#"
        SELECT p.id, p.name, p.subtitle,
               COALESCE(p.main_images->>0, '') AS image,
               p.category_id, p.brand_id, p.sales,
               COALESCE(MIN(ps.price), 0)::BIGINT AS min_price,
               COALESCE(MAX(ps.price), 0)::BIGINT AS max_price,
               COALESCE(SUM(ps.stock), 0)::BIGINT AS total_stock
        FROM products p
        LEFT JOIN product_skus ps ON ps.product_id = p.id AND ps.status = 1
        WHERE p.status = 1
        "#,
    );
    push_product_filters(&mut select, &query);
    select
        .push(" GROUP BY p.id ORDER BY ")
        .push(sort_by.as_sql())
        .push(" ")
        .push(sort_order.as_sql())
        .push(", p.id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let items = select
        .build_query_as::<ProductSummary>()
        .fetch_all(&state.pool)
        .await?;

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p WHERE p.status = 1");
    push_product_filters(&mut count, &query);
    let (total,): (i64,) = count.build_query_as().fetch_one(&state.pool).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

fn push_product_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    if let Some(keyword) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{keyword}%");
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.subtitle ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(brand_id) = query.brand_id {
        builder.push(" AND p.brand_id = ").push_bind(brand_id);
    }
    if let Some(pet_type) = query.pet_type {
        builder.push(" AND p.pet_type = ").push_bind(pet_type);
    }
    if query.min_price.is_some() || query.max_price.is_some() {
        builder.push(
            " AND EXISTS (SELECT 1 FROM product_skus f WHERE f.product_id = p.id AND f.status = 1",
        );
        if let Some(min_price) = query.min_price {
            builder.push(" AND f.price >= ").push_bind(min_price);
        }
        if let Some(max_price) = query.max_price {
            builder.push(" AND f.price <= ").push_bind(max_price);
        }
        builder.push(")");
    }
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .filter(ProdCol::Status.eq(STATUS_ACTIVE))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let skus: Vec<Sku> = ProductSkus::find()
        .filter(SkuCol::ProductId.eq(id))
        .filter(SkuCol::Status.eq(STATUS_ACTIVE))
        .order_by_asc(SkuCol::Price)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Sku::from)
        .collect();

    Products::update_many()
        .col_expr(ProdCol::Views, Expr::col(ProdCol::Views).add(1))
        .filter(ProdCol::Id.eq(id))
        .exec(&state.orm)
        .await?;

    let min_price = skus.iter().map(|s| s.price).min().unwrap_or(0);
    let max_price = skus.iter().map(|s| s.price).max().unwrap_or(0);
    let total_stock = skus.iter().map(|s| i64::from(s.stock)).sum();
    let images: Vec<String> =
        serde_json::from_value(product.main_images.clone()).unwrap_or_default();

    let detail = ProductDetail {
        id: product.id,
        name: product.name,
        subtitle: product.subtitle,
        detail: product.detail,
        images,
        category_id: product.category_id,
        brand_id: product.brand_id,
        pet_type: product.pet_type,
        sales: product.sales,
        views: product.views + 1,
        min_price,
        max_price,
        total_stock,
        skus,
    };

    Ok(ApiResponse::success("Product", detail, Some(Meta::empty())))
}
