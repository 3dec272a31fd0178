//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::routes::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use document_store::InMemoryDocumentStore;
use domain::{FulfillmentHandler, Subscription};
use metrics_exporter_prometheus::PrometheusHandle;
use paging::{CancellationToken, PageSizeLimits};
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: axum::Router,
    state: Arc<AppState<InMemoryDocumentStore>>,
    handler: FulfillmentHandler<InMemoryDocumentStore>,
    subscription: Subscription,
}

fn setup() -> TestApp {
    let (state, handler, subscription) = api::create_default_state(
        InMemoryDocumentStore::new(),
        PageSizeLimits::default(),
        CancellationToken::new(),
    );
    let router = api::create_app(state.clone(), get_metrics_handle());
    TestApp {
        router,
        state,
        handler,
        subscription,
    }
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_cart_with_items(app: &axum::Router, codes: &[&str]) -> String {
    let (status, cart) = send(app, "POST", "/carts", Some(json!({"user_id": "user-1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let cart_id = cart["id"].as_str().unwrap().to_string();

    for code in codes {
        let (status, _) = send(
            app,
            "POST",
            &format!("/carts/{cart_id}/items"),
            Some(json!({"product_code": code, "quantity": 1, "unit_price_cents": 500})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    cart_id
}

async fn place_order(app: &axum::Router, family: &str, codes: &[&str]) -> Value {
    let cart_id = create_cart_with_items(app, codes).await;
    let (status, order) = send(
        app,
        "POST",
        &format!("/carts/{cart_id}/checkout"),
        Some(json!({"orderer_family_name": family, "orderer_given_name": "Taro"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    order
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_health_reports_draining_after_shutdown() {
    let app = setup();
    app.state.shutdown.cancel();
    let (status, json) = send(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "draining");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

mod carts {
    use super::*;

    #[tokio::test]
    async fn test_cart_lifecycle() {
        let app = setup();
        let cart_id = create_cart_with_items(&app.router, &["SKU-1", "SKU-2", "SKU-1"]).await;

        let (status, cart) = send(&app.router, "GET", &format!("/carts/{cart_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["items"].as_array().unwrap().len(), 2);
        assert_eq!(cart["items"][0]["quantity"], 2);
        assert_eq!(cart["total_cents"], 1500);

        let (status, cart) = send(
            &app.router,
            "DELETE",
            &format!("/carts/{cart_id}/items/SKU-1"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["items"].as_array().unwrap().len(), 1);
        assert_eq!(cart["items"][0]["product_code"], "SKU-2");
    }

    #[tokio::test]
    async fn test_get_nonexistent_cart() {
        let app = setup();
        let (status, json) = send(&app.router, "GET", "/carts/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_add_item_with_zero_quantity() {
        let app = setup();
        let cart_id = create_cart_with_items(&app.router, &[]).await;
        let (status, json) = send(
            &app.router,
            "POST",
            &format!("/carts/{cart_id}/items"),
            Some(json!({"product_code": "SKU-1", "quantity": 0, "unit_price_cents": 500})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_checkout_consumes_cart() {
        let app = setup();
        let cart_id = create_cart_with_items(&app.router, &["SKU-1"]).await;

        let (status, order) = send(
            &app.router,
            "POST",
            &format!("/carts/{cart_id}/checkout"),
            Some(json!({"orderer_family_name": "Yamada", "orderer_given_name": "Taro"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["status"], "placed");
        assert_eq!(order["cart_id"], cart_id.as_str());
        assert_eq!(order["items"][0]["id"], "item-1");

        let (status, _) = send(&app.router, "GET", &format!("/carts/{cart_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_checkout_requires_names_and_items() {
        let app = setup();
        let cart_id = create_cart_with_items(&app.router, &["SKU-1"]).await;
        let (status, _) = send(
            &app.router,
            "POST",
            &format!("/carts/{cart_id}/checkout"),
            Some(json!({"orderer_family_name": "", "orderer_given_name": "Taro"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let empty_id = create_cart_with_items(&app.router, &[]).await;
        let (status, _) = send(
            &app.router,
            "POST",
            &format!("/carts/{empty_id}/checkout"),
            Some(json!({"orderer_family_name": "Yamada", "orderer_given_name": "Taro"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn test_list_orders_pages_through_all() {
        let app = setup();
        let mut created = Vec::new();
        for _ in 0..5 {
            let order = place_order(&app.router, "Yamada", &["SKU-1"]).await;
            created.push(order["id"].as_str().unwrap().to_string());
        }

        let mut seen = Vec::new();
        let mut token = String::new();
        let mut pages = 0;
        loop {
            let (status, page) = send(
                &app.router,
                "GET",
                &format!("/orders?page_size=2&page_token={token}"),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            pages += 1;
            for record in page["records"].as_array().unwrap() {
                seen.push(record["id"].as_str().unwrap().to_string());
            }
            token = page["next_page_token"].as_str().unwrap().to_string();
            if token.is_empty() {
                break;
            }
        }

        assert_eq!(pages, 3);
        seen.sort();
        created.sort();
        assert_eq!(seen, created);
    }

    #[tokio::test]
    async fn test_list_orders_filters_by_family_name() {
        let app = setup();
        place_order(&app.router, "Yamada", &["SKU-1"]).await;
        place_order(&app.router, "Suzuki", &["SKU-1"]).await;
        place_order(&app.router, "Yamada", &["SKU-2"]).await;

        let (status, page) = send(
            &app.router,
            "GET",
            "/orders?orderer_family_name=Suzuki&orderer_given_name=",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let records = page["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["orderer_family_name"], "Suzuki");
        assert_eq!(page["next_page_token"], "");
    }

    #[tokio::test]
    async fn test_list_orders_time_range() {
        let app = setup();
        let order = place_order(&app.router, "Yamada", &["SKU-1"]).await;
        let created_at = order["created_at"].as_str().unwrap().replace('+', "%2B");

        let (status, page) = send(
            &app.router,
            "GET",
            &format!("/orders?start_time={created_at}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["records"].as_array().unwrap().len(), 1);

        let (status, page) = send(
            &app.router,
            "GET",
            &format!("/orders?end_time={created_at}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(page["records"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_page_token_is_bad_request() {
        let app = setup();
        place_order(&app.router, "Yamada", &["SKU-1"]).await;

        let (status, json) = send(
            &app.router,
            "GET",
            "/orders?page_token=not_a_number,not_a_uuid",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("page token"));
        assert!(json.get("records").is_none());
    }

    #[tokio::test]
    async fn test_invalid_time_is_bad_request() {
        let app = setup();
        let (status, _) = send(&app.router, "GET", "/orders?start_time=yesterday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_listing_after_shutdown_is_unavailable() {
        let app = setup();
        app.state.shutdown.cancel();

        let (status, json) = send(&app.router, "GET", "/orders", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_update_order_status() {
        let app = setup();
        let order = place_order(&app.router, "Yamada", &["SKU-1"]).await;
        let id = order["id"].as_str().unwrap();

        let (status, json) = send(
            &app.router,
            "POST",
            &format!("/orders/{id}/status"),
            Some(json!({"status": "fulfilled"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());

        let (status, json) = send(
            &app.router,
            "POST",
            &format!("/orders/{id}/status"),
            Some(json!({"status": "fulfilling"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "fulfilling");
    }

    #[tokio::test]
    async fn test_get_nonexistent_order() {
        let app = setup();
        let (status, _) = send(&app.router, "GET", "/orders/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn test_checkout_creates_tasks() {
        let mut app = setup();
        let order = place_order(&app.router, "Yamada", &["SKU-1", "SKU-2"]).await;
        let order_id = order["id"].as_str().unwrap();

        let message = app.subscription.next().await.unwrap().unwrap();
        let report = app.handler.handle(message).await.unwrap();
        assert_eq!(report.created, 2);

        let (status, page) = send(
            &app.router,
            "GET",
            &format!("/tasks?order_id={order_id}&page_size=1"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["records"].as_array().unwrap().len(), 1);
        let token = page["next_page_token"].as_str().unwrap();
        assert!(!token.is_empty());

        let (status, page) = send(
            &app.router,
            "GET",
            &format!("/tasks?order_id={order_id}&page_size=1&page_token={token}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["records"].as_array().unwrap().len(), 1);

        let (status, page) = send(
            &app.router,
            "GET",
            &format!("/tasks?order_id={order_id}&product_code=SKU-2"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let records = page["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["status"], "pending");
        assert_eq!(records[0]["order_item_id"], "item-2");
    }

    #[tokio::test]
    async fn test_update_task_status() {
        let mut app = setup();
        place_order(&app.router, "Yamada", &["SKU-1"]).await;
        let message = app.subscription.next().await.unwrap().unwrap();
        app.handler.handle(message).await.unwrap();

        let (_, page) = send(&app.router, "GET", "/tasks", None).await;
        let task_id = page["records"][0]["id"].as_str().unwrap().to_string();

        let (status, task) = send(&app.router, "GET", &format!("/tasks/{task_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["status"], "pending");

        let (status, task) = send(
            &app.router,
            "POST",
            &format!("/tasks/{task_id}/status"),
            Some(json!({"status": "in_progress"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["status"], "in_progress");

        let (status, _) = send(
            &app.router,
            "POST",
            &format!("/tasks/{task_id}/status"),
            Some(json!({"status": "pending"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_nonexistent_task() {
        let app = setup();
        let (status, json) = send(&app.router, "GET", "/tasks/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].is_string());
    }
}
