//! Integration tests for Candy Boxes.
//!
//! The tests drive the full router (middleware included) in-process with
//! `tower::ServiceExt::oneshot`, backed by the in-memory document store or by
//! no store at all.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p candy-boxes-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `boxes` - Candy box creation and tag filtering
//! - `orders` - Order placement and validation
//! - `service` - Banner, diagnostics, health, degraded mode and store failures

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use candy_boxes_api::app;
use candy_boxes_api::config::ApiConfig;
use candy_boxes_api::db::{
    DocumentStore, MemoryDocumentStore, SharedStore, StoreError, StoredDocument, UnavailableStore,
};
use candy_boxes_api::state::AppState;
use candy_boxes_core::{CollectionName, Document, DocumentId, Filter};

/// A router plus handles on its store for assertions.
pub struct TestApp {
    router: Router,
    pub memory: Arc<MemoryDocumentStore>,
    pub counting: Arc<CountingStore>,
}

impl TestApp {
    /// App backed by a fresh in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let memory = Arc::new(MemoryDocumentStore::new());
        let counting = Arc::new(CountingStore::new(memory.clone()));
        let store: SharedStore = counting.clone();
        Self {
            router: app(AppState::new(ApiConfig::default(), store)),
            memory,
            counting,
        }
    }

    /// Send a request and return the status and raw body text.
    pub async fn send(&self, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, String) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(text) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(text.to_owned())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// GET `uri` and parse the JSON response.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let (status, text) = self.send(Method::GET, uri, None).await;
        (status, serde_json::from_str(&text).unwrap())
    }

    /// POST `body` as JSON to `uri` and parse the JSON response.
    pub async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        let (status, text) = self.send(Method::POST, uri, Some(&body.to_string())).await;
        (status, serde_json::from_str(&text).unwrap())
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Router with no document store configured.
#[must_use]
pub fn degraded_router() -> Router {
    let store: SharedStore = Arc::new(UnavailableStore::new("DATABASE_URL is not set"));
    app(AppState::new(ApiConfig::default(), store))
}

/// Router whose store is reachable but fails every read and write.
#[must_use]
pub fn failing_router() -> Router {
    let store: SharedStore = Arc::new(FailingStore);
    app(AppState::new(ApiConfig::default(), store))
}

/// Send a request to `router` and return the status and parsed JSON body.
pub async fn call(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Store wrapper that counts the calls reaching the inner store.
pub struct CountingStore {
    inner: Arc<MemoryDocumentStore>,
    inserts: AtomicUsize,
    finds: AtomicUsize,
}

impl CountingStore {
    #[must_use]
    pub const fn new(inner: Arc<MemoryDocumentStore>) -> Self {
        Self {
            inner,
            inserts: AtomicUsize::new(0),
            finds: AtomicUsize::new(0),
        }
    }

    /// Number of `insert` calls so far.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of `find` calls so far.
    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn insert(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<DocumentId, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(collection, document).await
    }

    async fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(collection, filter).await
    }

    async fn database_name(&self) -> Result<String, StoreError> {
        self.inner.database_name().await
    }

    async fn list_collections(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        self.inner.list_collections(limit).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

/// Connected store that rejects every insert and find.
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn insert(&self, _: &CollectionName, _: Document) -> Result<DocumentId, StoreError> {
        Err(StoreError::persistence("disk full"))
    }

    async fn find(&self, _: &CollectionName, _: &Filter) -> Result<Vec<StoredDocument>, StoreError> {
        Err(StoreError::persistence("relation \"documents\" does not exist"))
    }

    async fn database_name(&self) -> Result<String, StoreError> {
        Ok("candy".to_owned())
    }

    async fn list_collections(&self, _: usize) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
