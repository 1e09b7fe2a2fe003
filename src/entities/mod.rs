//! Domain entities: menus, customers, orders and the order status table

pub mod customer;
pub mod macros;
pub mod menu;
pub mod order;
pub mod status;

pub use customer::{Address, User};
pub use menu::Menu;
pub use order::{Order, OrderBuilder};
pub use status::OrderStatus;
