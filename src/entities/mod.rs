pub mod address;
pub mod cart_item;
pub mod customer;
pub mod inventory;
pub mod order;
pub mod order_item;
pub mod password_reset_token;
pub mod product;

pub use address::Entity as Address;
pub use cart_item::Entity as CartItem;
pub use customer::Entity as Customer;
pub use inventory::Entity as Inventory;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use password_reset_token::Entity as PasswordResetToken;
pub use product::Entity as Product;
