//! Seed the document store with sample candy boxes.
//!
//! Every sample is validated before the first insert, so a bad sample never
//! leaves a partially seeded collection behind.
//!
//! # Usage
//!
//! ```bash
//! # Insert the built-in samples
//! candy-cli seed
//!
//! # Insert boxes from a JSON array instead
//! candy-cli seed --file boxes.json
//!
//! # Validate only
//! candy-cli seed --dry-run
//! ```

use std::path::Path;
use std::sync::Arc;

use serde_json::{Value as JsonValue, json};

use candy_boxes_api::db::{self, PostgresDocumentStore, SharedStore};
use candy_boxes_core::{CandyBox, Schema};

use super::{CommandError, database_url};

/// Built-in sample boxes.
fn builtin_samples() -> Vec<JsonValue> {
    vec![
        json!({
            "title": "Classic Lösgodis Mix",
            "description": "Sour, salty and sweet pick-and-mix favourites",
            "price": "24.90",
            "tags": ["classic", "mix"],
        }),
        json!({
            "title": "Salty Liquorice Lovers",
            "description": "Salmiak, saltlakrits and double salt bites",
            "price": "29.90",
            "tags": ["liquorice", "salty"],
        }),
        json!({
            "title": "Vegan Sour Box",
            "price": "27.50",
            "tags": ["vegan", "sour"],
        }),
        json!({
            "title": "Midsommar Limited Edition",
            "description": "Strawberry, elderflower and cream flavours",
            "price": "34.00",
            "is_limited": true,
            "tags": ["seasonal", "vegan"],
        }),
    ]
}

/// Read a JSON array of boxes from `path`.
async fn samples_from_file(path: &Path) -> Result<Vec<JsonValue>, CommandError> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CommandError::Read {
                path: path.display().to_string(),
                source,
            })?;

    match serde_json::from_str(&content) {
        Ok(JsonValue::Array(items)) => Ok(items),
        Ok(_) => Err(CommandError::InvalidSample(
            "expected a JSON array of boxes".to_owned(),
        )),
        Err(e) => Err(CommandError::InvalidSample(e.to_string())),
    }
}

/// Validate every sample, reporting all failures at once.
fn validate_samples(samples: &[JsonValue]) -> Result<Vec<CandyBox>, CommandError> {
    let mut boxes = Vec::with_capacity(samples.len());
    let mut failures = Vec::new();

    for (index, sample) in samples.iter().enumerate() {
        match CandyBox::validate(sample) {
            Ok(candy_box) => boxes.push(candy_box),
            Err(errors) => failures.push(format!("#{index}: {errors}")),
        }
    }

    if failures.is_empty() {
        Ok(boxes)
    } else {
        Err(CommandError::InvalidSample(failures.join("; ")))
    }
}

/// Insert validated boxes, returning their new ids in order.
async fn insert_boxes(store: &SharedStore, boxes: &[CandyBox]) -> Result<Vec<String>, CommandError> {
    let collection = CandyBox::collection();
    let mut ids = Vec::with_capacity(boxes.len());
    for candy_box in boxes {
        let id = db::create_document(store, &collection, candy_box).await?;
        tracing::info!(%id, title = %candy_box.title, "Seeded candy box");
        ids.push(id);
    }
    Ok(ids)
}

/// Seed candy boxes from `file`, or the built-in samples when `None`.
///
/// # Errors
///
/// Returns an error if a sample is invalid, `DATABASE_URL` is unset, or an
/// insert fails.
pub async fn run(file: Option<&Path>, dry_run: bool) -> Result<(), CommandError> {
    let samples = match file {
        Some(path) => samples_from_file(path).await?,
        None => builtin_samples(),
    };
    let boxes = validate_samples(&samples)?;
    tracing::info!(count = boxes.len(), "Samples validated");

    if dry_run {
        tracing::info!("Dry run, nothing inserted");
        return Ok(());
    }

    let pool = db::create_pool(&database_url()?).await?;
    let store: SharedStore = Arc::new(PostgresDocumentStore::new(pool));

    let ids = insert_boxes(&store, &boxes).await?;
    tracing::info!(count = ids.len(), "Seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use candy_boxes_api::db::MemoryDocumentStore;

    use super::*;

    #[test]
    fn test_builtin_samples_are_valid() {
        let boxes = validate_samples(&builtin_samples()).unwrap();
        assert_eq!(boxes.len(), builtin_samples().len());
        assert!(boxes.iter().any(|b| b.tags.iter().any(|t| t == "vegan")));
    }

    #[test]
    fn test_invalid_samples_are_all_reported() {
        let samples = vec![
            json!({"title": "Fine", "price": 1}),
            json!({"title": "Negative", "price": -1}),
            json!({"price": 3}),
        ];
        let CommandError::InvalidSample(message) = validate_samples(&samples).unwrap_err() else {
            panic!("expected invalid sample error");
        };
        assert!(message.contains("#1: "));
        assert!(message.contains("#2: "));
        assert!(!message.contains("#0: "));
    }

    #[tokio::test]
    async fn test_insert_boxes_into_store() {
        let memory = Arc::new(MemoryDocumentStore::new());
        let store: SharedStore = memory.clone();
        let boxes = validate_samples(&builtin_samples()).unwrap();

        let ids = insert_boxes(&store, &boxes).await.unwrap();

        assert_eq!(ids.len(), boxes.len());
        assert_eq!(memory.count(&CandyBox::collection()).await, boxes.len());
    }
}
