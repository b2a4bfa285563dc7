mod common;

use common::{create_category, create_named_product, create_product, setup_state, unique_tag};
use petshop_api::{
    entity::brands::ActiveModel as BrandActive,
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::catalog_service,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use uuid::Uuid;

#[tokio::test]
async fn product_search_filters_sorts_and_paginates() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let tag = unique_tag();
    let bites = create_named_product(&state, &format!("Salmon Bites {tag}"), &[(2599, 3), (1299, 4)])
        .await?;
    let jerky = create_named_product(&state, &format!("Chicken Jerky {tag}"), &[(500, 1)]).await?;

    let search = |page: Option<i64>, per_page: Option<i64>| ProductQuery {
        q: Some(tag.clone()),
        page,
        per_page,
        sort_by: Some(ProductSortBy::Price),
        sort_order: Some(SortOrder::Asc),
        ..Default::default()
    };

    let resp = catalog_service::list_products(&state, search(None, None)).await?;
    let meta = resp.meta.expect("meta");
    assert_eq!(meta.total, Some(2));
    let items = resp.data.expect("products").items;
    assert_eq!(
        items.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![jerky.product_id, bites.product_id],
        "cheapest first"
    );
    assert_eq!(items[1].min_price, 1299);
    assert_eq!(items[1].max_price, 2599);
    assert_eq!(items[1].total_stock, 7);

    let resp = catalog_service::list_products(&state, search(Some(2), Some(1))).await?;
    let meta = resp.meta.expect("meta");
    assert_eq!(meta.total_pages, Some(2));
    assert_eq!(meta.page, Some(2));
    let items = resp.data.expect("products").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, bites.product_id);

    let priced = ProductQuery {
        min_price: Some(1000),
        max_price: Some(2000),
        ..search(None, None)
    };
    let items = catalog_service::list_products(&state, priced)
        .await?
        .data
        .expect("products")
        .items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, bites.product_id);

    let by_category = ProductQuery {
        category_id: Some(jerky.category_id),
        ..search(None, None)
    };
    let items = catalog_service::list_products(&state, by_category)
        .await?
        .data
        .expect("products")
        .items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, jerky.product_id);
    Ok(())
}

#[tokio::test]
async fn product_detail_orders_skus_and_counts_views() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let fixture = create_product(&state, &[(3999, 2), (1999, 8), (2999, 0)]).await?;

    let first = catalog_service::get_product(&state, fixture.product_id)
        .await?
        .data
        .expect("product");
    let prices: Vec<i64> = first.skus.iter().map(|s| s.price).collect();
    assert_eq!(prices, vec![1999, 2999, 3999]);
    assert_eq!(first.min_price, 1999);
    assert_eq!(first.max_price, 3999);
    assert_eq!(first.total_stock, 10);
    assert_eq!(first.images, vec!["/images/test.jpg".to_string()]);
    assert_eq!(first.views, 1);

    let second = catalog_service::get_product(&state, fixture.product_id)
        .await?
        .data
        .expect("product");
    assert_eq!(second.views, 2);

    let err = catalog_service::get_product(&state, Uuid::new_v4())
        .await
        .expect_err("unknown product");
    assert_eq!(err.code(), "not_found");
    Ok(())
}

#[tokio::test]
async fn categories_nest_and_brands_skip_disabled() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let tag = unique_tag();
    let root = create_category(&state, &format!("Dogs {tag}"), None, 0).await?;
    let food = create_category(&state, &format!("Dog Food {tag}"), Some(root), 2).await?;
    let toys = create_category(&state, &format!("Dog Toys {tag}"), Some(root), 1).await?;

    let tree = catalog_service::list_categories(&state)
        .await?
        .data
        .expect("tree");
    assert_eq!(tree.total, tree.items.len());
    let node = tree
        .items
        .iter()
        .find(|node| node.id == root)
        .expect("root category listed");
    let children: Vec<Uuid> = node.children.iter().map(|child| child.id).collect();
    assert_eq!(children, vec![toys, food], "children follow sort order");
    assert!(tree.items.iter().all(|node| node.id != food));

    let mut brand_ids = Vec::new();
    for (name, status) in [(format!("Paws {tag}"), 1i16), (format!("Retired {tag}"), 2)] {
        let brand = BrandActive {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            logo: Set(None),
            description: Set(None),
            sort: Set(0),
            status: Set(status),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
        brand_ids.push(brand.id);
    }

    let brands = catalog_service::list_brands(&state)
        .await?
        .data
        .expect("brands")
        .items;
    assert!(brands.iter().any(|brand| brand.id == brand_ids[0]));
    assert!(brands.iter().all(|brand| brand.id != brand_ids[1]));
    Ok(())
}
