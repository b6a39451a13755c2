//! Order endpoint against the in-memory store.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use candy_boxes_core::{Filter, Order, Schema, Value};
use rust_decimal::Decimal;
use serde_json::json;

use candy_boxes_api::db;
use candy_boxes_integration_tests::TestApp;

fn order_body() -> serde_json::Value {
    json!({
        "customer_name": "Astrid Lindgren",
        "email": "astrid@example.se",
        "address": "Dalagatan 46, Stockholm",
        "items": [{"box_id": "b-1", "quantity": 2}],
        "total": 49.80
    })
}

#[tokio::test]
async fn valid_order_is_created_with_default_status() {
    let app = TestApp::new();
    let (status, created) = app.post("/api/orders", &order_body()).await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let id = created["id"].as_str().unwrap();

    let store: db::SharedStore = app.memory.clone();
    let orders = db::get_documents(&store, &Order::collection(), Filter::new())
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].get("id"), Some(&Value::Text(id.to_owned())));
    assert_eq!(orders[0].get("status"), Some(&Value::Text("pending".into())));
}

#[tokio::test]
async fn empty_items_are_rejected() {
    let app = TestApp::new();
    let mut body = order_body();
    body["items"] = json!([]);

    let (status, errors) = app.post("/api/orders", &body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(errors["detail"][0]["field"], "items");
    assert_eq!(errors["detail"][0]["kind"], "too_few_items");
    assert_eq!(app.counting.inserts(), 0);
}

#[tokio::test]
async fn zero_quantity_is_reported_with_item_path() {
    let app = TestApp::new();
    let mut body = order_body();
    body["items"] = json!([
        {"box_id": "b-1", "quantity": 1},
        {"box_id": "b-2", "quantity": 0}
    ]);

    let (status, errors) = app.post("/api/orders", &body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(errors["detail"][0]["field"], "items.1.quantity");
}

#[tokio::test]
async fn total_keeps_exact_precision() {
    let app = TestApp::new();
    let body = r#"{
        "customer_name": "Karl",
        "email": "karl@example.se",
        "address": "Storgatan 1",
        "items": [{"box_id": "b-1", "quantity": 1}],
        "total": 42.50
    }"#;
    let (status, _) = app
        .send(axum::http::Method::POST, "/api/orders", Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);

    let store: db::SharedStore = app.memory.clone();
    let orders = db::get_documents(&store, &Order::collection(), Filter::new())
        .await
        .unwrap();
    let total = orders[0].get("total").and_then(Value::as_decimal).unwrap();
    assert_eq!(total, Decimal::new(4250, 2));
    assert_eq!(total.to_string(), "42.50");

    let text = serde_json::to_string(&orders[0]).unwrap();
    assert!(text.contains("\"total\":42.50"));
}

#[tokio::test]
async fn unknown_status_is_stored_as_given() {
    let app = TestApp::new();
    let mut body = order_body();
    body["status"] = json!("gift-wrapped");

    let (status, _) = app.post("/api/orders", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.counting.inserts(), 1);
}

#[tokio::test]
async fn tiny_negative_total_is_rejected_not_rounded() {
    let app = TestApp::new();
    let mut body = order_body();
    body["total"] = json!("-0.00000000000000000000000000000001");
    let (status, errors) = app.post("/api/orders", &body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(errors["detail"][0]["field"], "total");
    assert_eq!(errors["detail"][0]["kind"], "out_of_range");
    assert_eq!(app.counting.inserts(), 0);
}
