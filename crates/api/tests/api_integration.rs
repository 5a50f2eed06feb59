//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::routes::orders::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::{CustomerId, InMemoryOrderRepository, InMemoryUserDirectory, UserSummary};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

type TestState = AppState<InMemoryOrderRepository, InMemoryUserDirectory>;

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

fn setup_with_users() -> (axum::Router, Arc<TestState>, InMemoryUserDirectory) {
    let users = InMemoryUserDirectory::new();
    let state = api::create_default_state(InMemoryOrderRepository::new(), users.clone());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state, users)
}

fn setup() -> axum::Router {
    setup_with_users().0
}

fn order_body(user_id: i64) -> Value {
    json!({
        "userId": user_id,
        "shippingAddress": "123 Main St, City, Country 12345",
        "notes": "Leave at door",
        "items": [
            {
                "productId": 1,
                "productName": "Widget A",
                "productSku": "SKU-001",
                "quantity": 2,
                "unitPrice": 1000
            },
            {
                "productId": 2,
                "productName": "Widget B",
                "productSku": "SKU-002",
                "quantity": 1,
                "unitPrice": 500
            }
        ]
    })
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
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

async fn create_order(app: &axum::Router, user_id: i64) -> Value {
    let (status, json) = send(app, "POST", "/orders", Some(order_body(user_id))).await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

async fn set_status(app: &axum::Router, id: i64, status: &str) -> (StatusCode, Value) {
    send(
        app,
        "PATCH",
        &format!("/orders/{id}/status"),
        Some(json!({ "status": status })),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "UP");
    assert_eq!(json["service"], "order-service");
}

#[tokio::test]
async fn test_service_info() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["service"], "order-service");
    assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    create_order(&app, 1).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_created_total"));
}

#[tokio::test]
async fn test_create_order() {
    let app = setup();
    let json = create_order(&app, 1).await;

    assert!(json["id"].as_i64().is_some());
    assert!(json["orderNumber"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(json["userId"], 1);
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["totalAmount"], 2500);
    assert_eq!(json["itemCount"], 2);
    assert_eq!(json["shippingAddress"], "123 Main St, City, Country 12345");
    assert_eq!(json["notes"], "Leave at door");
    assert_eq!(json["items"][0]["productSku"], "SKU-001");
    assert_eq!(json["items"][0]["totalPrice"], 2000);
    assert_eq!(json["items"][1]["totalPrice"], 500);
    assert!(json["createdAt"].as_str().is_some());
}

#[tokio::test]
async fn test_create_order_validation() {
    let app = setup();

    let mut body = order_body(1);
    body.as_object_mut().unwrap().remove("userId");
    let (status, json) = send(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "userId is required");

    let mut body = order_body(1);
    body["items"] = json!([]);
    let (status, json) = send(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Order must contain at least one item");

    let mut body = order_body(1);
    body["items"][0]["quantity"] = json!(0);
    let (status, _) = send(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_order_with_huge_amounts() {
    let (app, state, _) = setup_with_users();

    let mut body = order_body(1);
    body["items"][0]["quantity"] = json!(2);
    body["items"][0]["unitPrice"] = json!(i64::MAX / 2 + 1);
    let (status, json) = send(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "items[0].unitPrice times items[0].quantity exceeds the supported amount"
    );

    let mut body = order_body(1);
    body["items"][0]["quantity"] = json!(i64::from(i32::MAX) + 1);
    let (status, json) = send(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "items[0].quantity must not exceed 2147483647");

    // Two lines whose sum overflows.
    let mut body = order_body(1);
    body["items"][0]["quantity"] = json!(1);
    body["items"][0]["unitPrice"] = json!(i64::MAX);
    body["items"][1]["quantity"] = json!(1);
    body["items"][1]["unitPrice"] = json!(i64::MAX);
    let (status, json) = send(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Order amount exceeds the supported range");

    assert_eq!(state.order_service.repository().order_count().await, 0);
}

#[tokio::test]
async fn test_create_order_malformed_json() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_order() {
    let app = setup();
    let created = create_order(&app, 1).await;
    let id = created["id"].as_i64().unwrap();
    let number = created["orderNumber"].as_str().unwrap();

    let (status, by_id) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["orderNumber"], number);
    assert_eq!(by_id["totalAmount"], 2500);

    let (status, by_number) = send(&app, "GET", &format!("/orders/number/{number}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_number["id"], id);

    // Repeated reads are identical
    let (_, again) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(again, by_id);
}

#[tokio::test]
async fn test_get_order_not_found() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/orders/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Order not found with id: 999");

    let (status, _) = send(&app, "GET", "/orders/number/ORD-00000000-XXXXX", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_order_id() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/orders/not-a-number", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid ID format"));
}

#[tokio::test]
async fn test_list_orders() {
    let app = setup();
    create_order(&app, 1).await;
    create_order(&app, 2).await;
    let third = create_order(&app, 1).await;
    let third_id = third["id"].as_i64().unwrap();
    set_status(&app, third_id, "CONFIRMED").await;

    let (status, all) = send(&app, "GET", "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, for_user) = send(&app, "GET", "/orders/user/1", None).await;
    assert_eq!(for_user.as_array().unwrap().len(), 2);

    let (_, confirmed) = send(&app, "GET", "/orders/status/confirmed", None).await;
    let confirmed = confirmed.as_array().unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0]["id"], third_id);

    let (status, json) = send(&app, "GET", "/orders/status/LOST", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Unknown order status: LOST");
}

#[tokio::test]
async fn test_status_lifecycle() {
    let app = setup();
    let id = create_order(&app, 1).await["id"].as_i64().unwrap();

    for next in ["CONFIRMED", "PROCESSING", "SHIPPED", "DELIVERED"] {
        let (status, json) = set_status(&app, id, next).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], next);
    }

    let (status, json) = set_status(&app, id, "REFUNDED").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        json["error"],
        "Invalid status transition from DELIVERED to REFUNDED"
    );
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let app = setup();
    let id = create_order(&app, 1).await["id"].as_i64().unwrap();

    let (status, json) = set_status(&app, id, "SHIPPED").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        json["error"],
        "Invalid status transition from PENDING to SHIPPED"
    );

    let (_, current) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(current["status"], "PENDING");
}

#[tokio::test]
async fn test_update_status_bad_request() {
    let app = setup();
    let id = create_order(&app, 1).await["id"].as_i64().unwrap();

    let (status, _) = set_status(&app, id, "LOST").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(&app, "PATCH", &format!("/orders/{id}/status"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "status is required");
}

#[tokio::test]
async fn test_cancel_order() {
    let app = setup();
    let id = create_order(&app, 1).await["id"].as_i64().unwrap();

    let (status, json) = send(&app, "POST", &format!("/orders/{id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "CANCELLED");
}

#[tokio::test]
async fn test_cancel_processing_order_is_conflict() {
    let app = setup();
    let id = create_order(&app, 1).await["id"].as_i64().unwrap();
    set_status(&app, id, "CONFIRMED").await;
    set_status(&app, id, "PROCESSING").await;

    let (status, json) = send(&app, "POST", &format!("/orders/{id}/cancel"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        json["error"],
        "Order cannot be cancelled. Current status: PROCESSING"
    );
}

#[tokio::test]
async fn test_delete_order() {
    let app = setup();
    let id = create_order(&app, 1).await["id"].as_i64().unwrap();
    set_status(&app, id, "CONFIRMED").await;

    let (status, _) = send(&app, "DELETE", &format!("/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_enriched_with_user() {
    let (app, _, users) = setup_with_users();
    users
        .insert(UserSummary {
            id: CustomerId::new(1),
            username: Some("alice".to_string()),
            email: Some("alice@example.com".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: None,
        })
        .await;

    let id = create_order(&app, 1).await["id"].as_i64().unwrap();
    let (status, json) = send(&app, "GET", &format!("/orders/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["username"], "alice");
    assert_eq!(json["user"]["firstName"], "Alice");
}

#[tokio::test]
async fn test_user_service_down_still_serves_orders() {
    let (app, state, users) = setup_with_users();
    let id = create_order(&app, 1).await["id"].as_i64().unwrap();
    users.set_unavailable(true).await;

    let (status, json) = send(&app, "GET", &format!("/orders/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["user"].is_null());
    assert_eq!(json["totalAmount"], 2500);
    assert_eq!(state.order_service.repository().order_count().await, 1);
}
