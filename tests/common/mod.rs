//! Shared helpers for the in-process route tests.
//!
//! Every test builds the full router over a fresh `MemoryStore` and drives it with
//! `tower::ServiceExt::oneshot`, so no socket or database is involved.

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode},
};
use backoffice_orderservice::{
    app_state::AppState, clock::Clock, routes, store::MemoryStore,
};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Clock that moves one minute forward on every reading, so order dates are strictly increasing.
pub struct StepClock {
    start: NaiveDateTime,
    ticks: AtomicI64,
}

impl StepClock {
    pub fn new() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> NaiveDateTime {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + TimeDelta::minutes(tick)
    }
}

/// Router over the demo catalog: products 1..=5 (Laptop 999.99, Mouse 29.99,
/// Keyboard 79.99, Monitor 299.99, Headphones 149.99).
pub async fn make_router() -> Router {
    make_router_with(MemoryStore::with_demo_catalog().await)
}

pub fn make_router_with(store: MemoryStore) -> Router {
    let state = AppState::new(Arc::new(store), Arc::new(StepClock::new()));
    routes::build_router(state)
}

/// Drive the router with a single request and return (status, body_bytes).
pub async fn call(router: &Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = router.clone().oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

pub fn parse_json(body: Bytes) -> Value {
    serde_json::from_slice(&body).expect("body is not valid JSON")
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(router, req).await;
    (status, parse_json(body))
}

pub async fn send_json(router: &Router, method: &str, uri: &str, json: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    let (status, body) = call(router, req).await;
    (status, parse_json(body))
}

pub async fn post_empty(router: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(router, req).await;
    (status, parse_json(body))
}

pub async fn create_order(router: &Router, customer_id: i64, total_amount: f64) -> Value {
    let (status, order) = send_json(
        router,
        "POST",
        "/api/orders",
        serde_json::json!({ "customerId": customer_id, "totalAmount": total_amount }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    order
}

pub async fn set_status(router: &Router, order_id: i64, status: &str) -> (StatusCode, Value) {
    send_json(
        router,
        "PATCH",
        &format!("/api/orders/{order_id}/status"),
        serde_json::json!({ "status": status }),
    )
    .await
}

pub async fn add_to_cart(router: &Router, product_id: i64, quantity: i32) -> Value {
    let (status, item) = send_json(
        router,
        "POST",
        "/api/cart/items",
        serde_json::json!({ "productId": product_id, "quantity": quantity }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{item}");
    item
}
