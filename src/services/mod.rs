pub mod carts;
pub mod orders;

pub use carts::CartService;
pub use orders::OrderService;
