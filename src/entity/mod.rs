pub mod audit_logs;
pub mod brands;
pub mod cart_items;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod product_skus;
pub mod products;
pub mod user_addresses;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use brands::Entity as Brands;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_skus::Entity as ProductSkus;
pub use products::Entity as Products;
pub use user_addresses::Entity as UserAddresses;
pub use users::Entity as Users;
