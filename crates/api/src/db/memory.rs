//! In-process document store.
//!
//! Used by tests and local development without a database. Documents keep
//! insertion order within a collection, matching the `PostgreSQL` store's
//! `created_at` ordering.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use candy_boxes_core::{CollectionName, Document, DocumentId, Filter};

use super::{DocumentStore, StoreError, StoredDocument};

type Collections = BTreeMap<CollectionName, Vec<(DocumentId, Document)>>;

/// Document store held in memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &CollectionName) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        self.collections
            .write()
            .await
            .entry(collection.clone())
            .or_default()
            .push((id, document));
        Ok(id)
    }

    async fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(documents
            .iter()
            .filter(|(_, document)| filter.matches(document))
            .map(|(id, document)| StoredDocument {
                id: Some(*id),
                body: document.clone(),
            })
            .collect())
    }

    async fn database_name(&self) -> Result<String, StoreError> {
        Ok("memory".to_owned())
    }

    async fn list_collections(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .iter()
            .filter(|(_, documents)| !documents.is_empty())
            .map(|(name, _)| name.to_string())
            .take(limit)
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
