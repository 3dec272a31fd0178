//! HTTP API for carts, orders and fulfillment tasks.
//!
//! Provides REST endpoints with cursor-paginated listings, structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use document_store::DocumentStore;
use domain::{
    CartService, FulfillmentHandler, InMemoryPublisher, OrderService, Subscription, TaskService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use paging::{CancellationToken, PageSizeLimits};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/carts", post(routes::carts::create::<S>))
        .route("/carts/{id}", get(routes::carts::get::<S>))
        .route("/carts/{id}/items", post(routes::carts::add_item::<S>))
        .route(
            "/carts/{id}/items/{product_code}",
            delete(routes::carts::remove_item::<S>),
        )
        .route("/carts/{id}/checkout", post(routes::carts::checkout::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", post(routes::orders::update_status::<S>))
        .route("/tasks", get(routes::tasks::list::<S>))
        .route("/tasks/{id}", get(routes::tasks::get::<S>))
        .route("/tasks/{id}/status", post(routes::tasks::update_status::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store`.
///
/// Also returns the fulfillment handler and the subscription it should
/// drain; the caller decides where the handler runs.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(
    store: S,
    limits: PageSizeLimits,
    shutdown: CancellationToken,
) -> (Arc<AppState<S>>, FulfillmentHandler<S>, Subscription) {
    let (publisher, subscription) = InMemoryPublisher::channel();
    let tasks = TaskService::new(store.clone(), limits);
    let handler = FulfillmentHandler::new(store.clone(), tasks.clone());

    let state = Arc::new(AppState {
        carts: CartService::new(store.clone()),
        orders: OrderService::new(store, publisher, limits),
        tasks,
        shutdown,
    });

    (state, handler, subscription)
}
