//! HTTP handlers and the state they share.

pub mod carts;
pub mod health;
pub mod listing;
pub mod metrics;
pub mod orders;
pub mod tasks;

use domain::{CartService, InMemoryPublisher, OrderService, TaskService};
use paging::CancellationToken;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub carts: CartService<S>,
    pub orders: OrderService<S, InMemoryPublisher>,
    pub tasks: TaskService<S>,
    /// Cancelled on shutdown; each listing runs on a child token.
    pub shutdown: CancellationToken,
}
