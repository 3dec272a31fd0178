//! Domain layer: carts, orders and fulfillment tasks.
//!
//! This crate provides:
//! - `CartService` for building carts
//! - `OrderService` for checkout, status changes and order listings
//! - `TaskService` for fulfillment tasks and task listings
//! - `Publisher`/`Subscription` messaging with an in-memory implementation
//! - `FulfillmentHandler`, which turns `OrderPlaced` messages into tasks

pub mod cart;
pub mod error;
pub mod fulfillment;
pub mod messaging;
pub mod order;
mod records;
pub mod task;
pub mod value_objects;

pub use cart::{Cart, CartItem, CartService};
pub use error::{DomainError, Result};
pub use fulfillment::{FulfillmentHandler, FulfillmentReport};
pub use messaging::{InMemoryPublisher, Message, Publisher, Subscription};
pub use order::{Order, OrderItem, OrderListRequest, OrderService, OrderStatus, PlaceOrder};
pub use task::{FulfillmentTask, NewTask, TaskListRequest, TaskService, TaskStatus};
pub use value_objects::{Money, ProductCode};
