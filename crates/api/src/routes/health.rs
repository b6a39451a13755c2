//! Health and diagnostic endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

/// Most collection names reported by `/test`.
pub const MAX_LISTED_COLLECTIONS: usize = 10;

/// Longest error text reported by `/test`.
pub const MAX_DIAGNOSTIC_ERROR_LEN: usize = 50;

/// Store diagnostics returned by `GET /test`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Diagnostics {
    pub backend: String,
    pub database: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub connection_status: String,
    pub collections: Vec<String>,
}

impl Diagnostics {
    fn not_connected() -> Self {
        Self {
            backend: "✅ Running".to_owned(),
            database: "⚠️  Available but not initialized".to_owned(),
            database_url: None,
            database_name: None,
            connection_status: "Not Connected".to_owned(),
            collections: Vec::new(),
        }
    }
}

fn summarize(error: &impl std::fmt::Display) -> String {
    error.to_string().chars().take(MAX_DIAGNOSTIC_ERROR_LEN).collect()
}

/// Report store connectivity. Always 200: every failure is folded into the body.
pub async fn diagnostics(State(state): State<AppState>) -> Json<Diagnostics> {
    let store = state.store();
    let mut report = Diagnostics::not_connected();

    if !store.is_configured() {
        return Json(report);
    }
    report.database_url = Some("✅ Set".to_owned());

    match store.database_name().await {
        Ok(name) => {
            report.database = "✅ Available".to_owned();
            report.database_name = Some(name);
            report.connection_status = "Connected".to_owned();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Diagnostics could not reach the store");
            report.database = format!("❌ Error: {}", summarize(&e));
            return Json(report);
        }
    }

    match store.list_collections(MAX_LISTED_COLLECTIONS).await {
        Ok(collections) => {
            report.collections = collections;
            report.database = "✅ Connected & Working".to_owned();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Diagnostics could not list collections");
            report.database = format!("⚠️  Connected but Error: {}", summarize(&e));
        }
    }

    Json(report)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the document store does not answer.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::debug!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use candy_boxes_core::{CollectionName, Document, DocumentId, Filter};

    use super::*;
    use crate::config::ApiConfig;
    use crate::db::{
        DocumentStore, MemoryDocumentStore, StoreError, StoredDocument, UnavailableStore,
    };

    /// Reachable store whose collection listing fails.
    struct BrokenListing;

    #[async_trait]
    impl DocumentStore for BrokenListing {
        fn backend(&self) -> &'static str {
            "broken"
        }

        async fn insert(&self, _: &CollectionName, _: Document) -> Result<DocumentId, StoreError> {
            Err(StoreError::persistence("read only"))
        }

        async fn find(
            &self,
            _: &CollectionName,
            _: &Filter,
        ) -> Result<Vec<StoredDocument>, StoreError> {
            Ok(Vec::new())
        }

        async fn database_name(&self) -> Result<String, StoreError> {
            Ok("candy".to_owned())
        }

        async fn list_collections(&self, _: usize) -> Result<Vec<String>, StoreError> {
            Err(StoreError::persistence("x".repeat(120)))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn state(store: impl DocumentStore + 'static) -> AppState {
        AppState::new(ApiConfig::default(), Arc::new(store))
    }

    #[tokio::test]
    async fn test_diagnostics_without_store() {
        let Json(report) = diagnostics(State(state(UnavailableStore::new("unset")))).await;
        assert_eq!(report.backend, "✅ Running");
        assert_eq!(report.database, "⚠️  Available but not initialized");
        assert_eq!(report.database_url, None);
        assert_eq!(report.database_name, None);
        assert_eq!(report.connection_status, "Not Connected");
        assert!(report.collections.is_empty());
    }

    #[tokio::test]
    async fn test_diagnostics_with_working_store() {
        let store = MemoryDocumentStore::new();
        let boxes = CollectionName::parse("candybox").unwrap();
        store.insert(&boxes, Document::new()).await.unwrap();

        let Json(report) = diagnostics(State(state(store))).await;
        assert_eq!(report.database, "✅ Connected & Working");
        assert_eq!(report.database_url.as_deref(), Some("✅ Set"));
        assert_eq!(report.database_name.as_deref(), Some("memory"));
        assert_eq!(report.connection_status, "Connected");
        assert_eq!(report.collections, vec!["candybox"]);
    }

    #[tokio::test]
    async fn test_diagnostics_truncates_listing_error() {
        let Json(report) = diagnostics(State(state(BrokenListing))).await;
        assert_eq!(report.connection_status, "Connected");
        let cause = report
            .database
            .strip_prefix("⚠️  Connected but Error: ")
            .unwrap();
        assert_eq!(cause.chars().count(), MAX_DIAGNOSTIC_ERROR_LEN);
    }

    #[tokio::test]
    async fn test_readiness() {
        assert_eq!(
            readiness(State(state(MemoryDocumentStore::new()))).await,
            StatusCode::OK
        );
        assert_eq!(
            readiness(State(state(UnavailableStore::new("unset")))).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
