//! `PostgreSQL` document store.
//!
//! Every collection lives in the single `documents` table; bodies are JSONB.
//! Filters are translated to JSONB comparisons, which compare numbers by value
//! the same way [`Filter::matches`] does.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use candy_boxes_core::{CollectionName, Criterion, Document, DocumentId, Filter, Value};

use super::{DocumentStore, StoreError, StoredDocument};

/// Document store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    #[tracing::instrument(skip(self, document), fields(collection = %collection))]
    async fn insert(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<DocumentId, StoreError> {
        let id: DocumentId = sqlx::query_scalar(
            "INSERT INTO documents (collection, body) VALUES ($1, $2) RETURNING id",
        )
        .bind(collection.as_str())
        .bind(document.into_json())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    #[tracing::instrument(skip(self, filter), fields(collection = %collection))]
    async fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut query = select_matching(collection, filter);
        let rows: Vec<(DocumentId, serde_json::Value)> =
            query.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(id, body)| -> Result<StoredDocument, StoreError> {
                let body = Document::try_from(body).map_err(|e| {
                    StoreError::persistence(format!("stored document {id} is unreadable: {e}"))
                })?;
                Ok(StoredDocument {
                    id: Some(id),
                    body,
                })
            })
            .collect()
    }

    async fn database_name(&self) -> Result<String, StoreError> {
        let name: String = sqlx::query_scalar("SELECT current_database()")
            .fetch_one(&self.pool)
            .await?;
        Ok(name)
    }

    async fn list_collections(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT collection FROM documents ORDER BY collection LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Build the `SELECT` for every document in `collection` matching `filter`.
fn select_matching<'a>(
    collection: &'a CollectionName,
    filter: &'a Filter,
) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new("SELECT id, body FROM documents WHERE collection = ");
    query.push_bind(collection.as_str());

    for (field, criterion) in filter.conditions() {
        let candidates: &[Value] = match criterion {
            Criterion::Equals(value) => std::slice::from_ref(value),
            Criterion::OneOf(values) => values,
        };

        query.push(" AND (");
        if candidates.is_empty() {
            query.push("FALSE");
        }
        for (i, candidate) in candidates.iter().enumerate() {
            if i > 0 {
                query.push(" OR ");
            }
            push_field_matches(&mut query, field, candidate);
        }
        query.push(")");
    }

    query.push(" ORDER BY created_at, id");
    query
}

/// Field equals the candidate, or is an array containing it. A missing field
/// reads as null.
fn push_field_matches<'a>(
    query: &mut QueryBuilder<'a, Postgres>,
    field: &'a str,
    candidate: &Value,
) {
    let candidate = serde_json::Value::from(candidate.clone());
    let is_null = candidate.is_null();

    query.push("(body -> ");
    query.push_bind(field);
    query.push(" = ");
    query.push_bind(candidate.clone());

    query.push(" OR CASE WHEN jsonb_typeof(body -> ");
    query.push_bind(field);
    query.push(") = 'array' THEN EXISTS (SELECT 1 FROM jsonb_array_elements(body -> ");
    query.push_bind(field);
    query.push(") AS element WHERE element = ");
    query.push_bind(candidate);
    query.push(") ELSE FALSE END");

    if is_null {
        query.push(" OR body -> ");
        query.push_bind(field);
        query.push(" IS NULL");
    }
    query.push(")");
}
