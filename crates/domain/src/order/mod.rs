//! Orders placed from carts.

mod model;
mod service;
mod status;

pub use model::{Order, OrderItem};
pub use service::{OrderListRequest, OrderService, PlaceOrder};
pub use status::OrderStatus;
