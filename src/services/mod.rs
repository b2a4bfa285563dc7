pub mod address_service;
pub mod admin_service;
pub mod cart_service;
pub mod catalog_service;
pub mod order_service;
pub mod payment_service;
pub mod statistics_service;
pub mod user_service;
