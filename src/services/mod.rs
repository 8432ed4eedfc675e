pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod customers;
pub mod orders;

pub use addresses::AddressService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use customers::CustomerService;
pub use orders::OrderService;
