//! Candy box endpoints against the in-memory store.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use candy_boxes_core::{CandyBox, Schema};
use serde_json::{Value, json};

use candy_boxes_integration_tests::TestApp;

async fn create_box(app: &TestApp, body: Value) -> String {
    let (status, created) = app.post("/api/boxes", &body).await;
    assert_eq!(status, StatusCode::OK, "{created}");
    created["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn create_then_list_returns_same_fields() {
    let app = TestApp::new();
    let id = create_box(
        &app,
        json!({
            "title": "Sura Colanappar",
            "description": "Fizzy sour cola bottles",
            "price": 19.90,
            "tags": ["sour"]
        }),
    )
    .await;

    let (status, listed) = app.get("/api/boxes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        listed,
        json!([{
            "id": id,
            "title": "Sura Colanappar",
            "description": "Fizzy sour cola bottles",
            "price": 19.90,
            "is_limited": false,
            "tags": ["sour"],
            "image": null
        }])
    );
}

#[tokio::test]
async fn tag_filter_returns_only_matching_boxes() {
    let app = TestApp::new();
    let vegan = create_box(&app, json!({"title": "Vegan Bears", "price": 10, "tags": ["vegan", "sweet"]})).await;
    create_box(&app, json!({"title": "Gelatin Mix", "price": 12, "tags": ["sweet"]})).await;
    create_box(&app, json!({"title": "Untagged", "price": 8})).await;

    let (status, listed) = app.get("/api/boxes?tag=vegan").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![vegan.as_str()]);
}

#[tokio::test]
async fn tag_without_matches_is_empty_list() {
    let app = TestApp::new();
    create_box(&app, json!({"title": "Sweet", "price": 5, "tags": ["sweet"]})).await;

    let (status, listed) = app.get("/api/boxes?tag=liquorice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn empty_tag_is_no_filter() {
    let app = TestApp::new();
    create_box(&app, json!({"title": "One", "price": 5, "tags": ["a"]})).await;
    create_box(&app, json!({"title": "Two", "price": 5})).await;

    let (_, listed) = app.get("/api/boxes?tag=").await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn negative_price_never_reaches_the_store() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/boxes", &json!({"title": "Cheap", "price": -1}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "price");
    assert_eq!(body["detail"][0]["kind"], "below_minimum");
    assert_eq!(app.counting.inserts(), 0);
    assert_eq!(app.memory.count(&CandyBox::collection()).await, 0);
}

#[tokio::test]
async fn tiny_negative_price_is_rejected_not_rounded() {
    let app = TestApp::new();
    let (status, text) = app
        .send(
            Method::POST,
            "/api/boxes",
            Some(r#"{"title": "Almost Free", "price": -0.00000000000000000000000000000001}"#),
        )
        .await;
    let body: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "price");
    assert_eq!(body["detail"][0]["kind"], "out_of_range");
    assert_eq!(app.counting.inserts(), 0);
}

#[tokio::test]
async fn every_invalid_field_is_reported() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/boxes", &json!({"price": "abc", "tags": ["ok", 3]}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "price", "tags.1"]);
}

#[tokio::test]
async fn malformed_json_is_single_body_error() {
    let app = TestApp::new();
    let (status, text) = app
        .send(Method::POST, "/api/boxes", Some("{\"title\": "))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&text).unwrap();
    let detail = body["detail"].as_array().unwrap();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0]["field"], "body");
    assert_eq!(app.counting.inserts(), 0);
}

#[tokio::test]
async fn non_object_body_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app.post("/api/boxes", &json!(["not", "a", "box"])).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "body");
    assert_eq!(body["detail"][0]["kind"], "wrong_type");
}
