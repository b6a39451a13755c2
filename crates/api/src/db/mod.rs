//! Document store adapter.
//!
//! Bridges validated entities to a document store and shapes stored
//! documents back into API-safe form.
//!
//! # Store client lifecycle
//!
//! The store is built once at startup by [`connect_store`] and shared through
//! `AppState` as a [`SharedStore`]. With a `DATABASE_URL` it is a
//! [`PostgresDocumentStore`] over a lazily connecting pool, so the first
//! request opens the first connection. Without one (or with an unparseable
//! one) it is an [`UnavailableStore`] and every operation fails with
//! [`StoreError::Unavailable`].
//!
//! # Table: `documents`
//!
//! ```sql
//! CREATE TABLE documents (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     collection TEXT NOT NULL,
//!     body JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p candy-boxes-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use candy_boxes_core::{CollectionName, Document, DocumentId, Filter, Schema};

use crate::config::ApiConfig;

pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;

/// Key under which the store identity is exposed.
pub const ID_FIELD: &str = "id";

/// Key under which a store's native identity could appear in a body; never exposed.
pub const NATIVE_ID_FIELD: &str = "_id";

/// Longest error cause carried in a [`StoreError`].
pub const MAX_CAUSE_LEN: usize = 200;

/// Errors that can occur during document store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No connection could be established (or none was configured).
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// The store was reachable but the operation failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Build an `Unavailable` error, truncating the cause.
    pub fn unavailable(cause: impl std::fmt::Display) -> Self {
        Self::Unavailable(truncate_cause(&cause.to_string(), MAX_CAUSE_LEN))
    }

    /// Build a `Persistence` error, truncating the cause.
    pub fn persistence(cause: impl std::fmt::Display) -> Self {
        Self::Persistence(truncate_cause(&cause.to_string(), MAX_CAUSE_LEN))
    }

    /// Returns `true` for [`StoreError::Unavailable`].
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            Self::unavailable(err)
        } else {
            Self::persistence(err)
        }
    }
}

/// Connection-level failures, as opposed to failures of a single statement.
fn is_connection_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => true,
        // 08xxx connection exception, 28xxx auth failure, 3D000 unknown
        // database, 57P0x server shutting down or not yet accepting
        sqlx::Error::Database(db) => db.code().is_some_and(|code| {
            code.starts_with("08")
                || code.starts_with("28")
                || code == "3D000"
                || code.starts_with("57P")
        }),
        _ => false,
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
#[must_use]
pub fn truncate_cause(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

/// A document as held by a store: its body plus the identity the store gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// `None` only if the backing data lost its identity.
    pub id: Option<DocumentId>,
    pub body: Document,
}

/// A schema-flexible store of documents grouped into named collections.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for diagnostics (`postgres`, `memory`, `unavailable`).
    fn backend(&self) -> &'static str;

    /// Whether a connection was configured at all.
    fn is_configured(&self) -> bool {
        true
    }

    /// Insert a document and return the identity the store assigned.
    async fn insert(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<DocumentId, StoreError>;

    /// All documents in `collection` matching `filter`.
    async fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Name of the underlying database.
    async fn database_name(&self) -> Result<String, StoreError>;

    /// Up to `limit` collection names that hold documents.
    async fn list_collections(&self, limit: usize) -> Result<Vec<String>, StoreError>;

    /// Cheap round trip to check the store answers.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Store handle shared by every request.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Store used when no connection can be configured.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::unavailable(&self.reason)
    }
}

#[async_trait]
impl DocumentStore for UnavailableStore {
    fn backend(&self) -> &'static str {
        "unavailable"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn insert(&self, _: &CollectionName, _: Document) -> Result<DocumentId, StoreError> {
        Err(self.error())
    }

    async fn find(&self, _: &CollectionName, _: &Filter) -> Result<Vec<StoredDocument>, StoreError> {
        Err(self.error())
    }

    async fn database_name(&self) -> Result<String, StoreError> {
        Err(self.error())
    }

    async fn list_collections(&self, _: usize) -> Result<Vec<String>, StoreError> {
        Err(self.error())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(self.error())
    }
}

/// Build the store client from configuration.
///
/// Never fails: a missing or invalid connection string yields an
/// [`UnavailableStore`] so the server can still start and report its state.
#[must_use]
pub fn connect_store(config: &ApiConfig) -> SharedStore {
    let Some(database_url) = config.database_url.as_ref() else {
        tracing::warn!("DATABASE_URL is not set, document store unavailable");
        return Arc::new(UnavailableStore::new("DATABASE_URL is not set"));
    };

    match create_lazy_pool(database_url, config.database_max_connections) {
        Ok(pool) => {
            tracing::info!("Document store configured (connects on first use)");
            Arc::new(PostgresDocumentStore::new(pool))
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid DATABASE_URL, document store unavailable");
            Arc::new(UnavailableStore::new(format!("invalid DATABASE_URL: {e}")))
        }
    }
}

/// Create a pool that opens connections on first use.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string cannot be parsed.
pub fn create_lazy_pool(
    database_url: &SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy(database_url.expose_secret())
}

/// Create a `PostgreSQL` connection pool, connecting immediately.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run a store operation on its own task so it completes even if the
/// request that started it goes away.
async fn run_to_completion<T, F>(operation: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    tokio::spawn(operation)
        .await
        .map_err(|e| StoreError::persistence(format!("store task failed: {e}")))?
}

/// Insert a validated entity into `collection` and return its new id as text.
///
/// The insert is attempted exactly once.
///
/// # Errors
///
/// Returns `StoreError::Unavailable` if the store cannot be reached and
/// `StoreError::Persistence` if the insert is rejected.
pub async fn create_document<S: Schema>(
    store: &SharedStore,
    collection: &CollectionName,
    entity: &S,
) -> Result<String, StoreError> {
    let document = entity.to_document();
    let task_store = Arc::clone(store);
    let task_collection = collection.clone();

    let id = run_to_completion(async move {
        task_store.insert(&task_collection, document).await
    })
    .await
    .inspect_err(|e| tracing::warn!(collection = %collection, error = %e, "Insert failed"))?;

    tracing::info!(collection = %collection, id = %id, "Document created");
    Ok(id.to_string())
}

/// Fetch every document in `collection` matching `filter`, with the store
/// identity exposed as a text `id` field.
///
/// # Errors
///
/// Returns `StoreError::Unavailable` if the store cannot be reached and
/// `StoreError::Persistence` if the query fails.
pub async fn get_documents(
    store: &SharedStore,
    collection: &CollectionName,
    filter: Filter,
) -> Result<Vec<Document>, StoreError> {
    let task_store = Arc::clone(store);
    let task_collection = collection.clone();

    let stored = run_to_completion(async move {
        task_store.find(&task_collection, &filter).await
    })
    .await
    .inspect_err(|e| tracing::warn!(collection = %collection, error = %e, "Query failed"))?;

    tracing::debug!(collection = %collection, count = stored.len(), "Documents fetched");
    Ok(stored.into_iter().map(shape_document).collect())
}

/// Translate a stored document into its API form.
///
/// Total: the native identity key is always removed, and `id` is set from
/// the store identity. A document without an identity comes back without
/// `id` rather than failing the request.
#[must_use]
pub fn shape_document(stored: StoredDocument) -> Document {
    let StoredDocument { id, mut body } = stored;
    body.remove(NATIVE_ID_FIELD);

    if let Some(id) = id {
        body.insert(ID_FIELD, id.to_string());
    } else {
        tracing::warn!("Stored document has no identity");
        body.remove(ID_FIELD);
    }
    body
}
