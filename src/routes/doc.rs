use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, AddressRequest},
        admin::{
            CategoryStat, DailyTrend, DashboardStats, InventoryAdjustRequest, LowStockList,
            LowStockSku, PendingTasks, SalesPoint, SalesReport, StatusStat, TodayStats,
            TopProduct, TotalStats, UpdateOrderStatusRequest,
        },
        cart::{AddToCartRequest, CartLine, CartList, UpdateCartRequest},
        catalog::{BrandList, CategoryTree, ProductList},
        orders::{AdminOrderDetail, CheckoutLine, CheckoutRequest, OrderList, OrderWithItems, ShippingAddress},
        payments::{CreatePaymentRequest, PaymentCallbackRequest, PaymentIntent, PaymentResult},
        users::UpdateProfileRequest,
    },
    error::ErrorData,
    models::{
        Address, Brand, CartItem, Category, CategoryNode, Order, OrderItem, ProductDetail,
        ProductSummary, Sku, UserProfile, UserSummary,
    },
    order_status::OrderStatus,
    response::{ApiResponse, Meta},
    routes::{addresses, admin, cart, catalog, health, orders, payments, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        catalog::list_categories,
        catalog::list_brands,
        catalog::list_products,
        catalog::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        addresses::list_addresses,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        payments::create_payment,
        payments::payment_callback,
        users::get_profile,
        users::update_profile,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::dashboard,
        admin::sales_report
    ),
    components(
        schemas(
            OrderStatus,
            Category,
            CategoryNode,
            Brand,
            ProductSummary,
            ProductDetail,
            Sku,
            CartItem,
            Address,
            Order,
            OrderItem,
            UserSummary,
            UserProfile,
            UpdateProfileRequest,
            CategoryTree,
            BrandList,
            ProductList,
            AddToCartRequest,
            UpdateCartRequest,
            CartLine,
            CartList,
            AddressRequest,
            AddressList,
            CheckoutLine,
            ShippingAddress,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            AdminOrderDetail,
            CreatePaymentRequest,
            PaymentIntent,
            PaymentCallbackRequest,
            PaymentResult,
            UpdateOrderStatusRequest,
            InventoryAdjustRequest,
            LowStockSku,
            LowStockList,
            TodayStats,
            TotalStats,
            StatusStat,
            DailyTrend,
            TopProduct,
            CategoryStat,
            PendingTasks,
            DashboardStats,
            SalesPoint,
            SalesReport,
            ErrorData,
            Meta,
            ApiResponse<ErrorData>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Catalog", description = "Categories, brands and products"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Addresses", description = "Saved shipping addresses"),
        (name = "Orders", description = "Checkout and order lifecycle"),
        (name = "Payments", description = "Mock payment flow"),
        (name = "Users", description = "Current user profile"),
        (name = "Admin", description = "Order management and inventory"),
        (name = "Statistics", description = "Admin dashboards and sales reports"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
