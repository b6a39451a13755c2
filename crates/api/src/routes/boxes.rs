//! Candy box route handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use candy_boxes_core::{CandyBox, Document, Filter, Schema};

use crate::db;
use crate::error::Result;
use crate::state::AppState;

/// Field holding a box's tags.
const TAGS_FIELD: &str = "tags";

/// Response to a successful create.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Created {
    pub id: String,
}

/// Query parameters for listing boxes.
#[derive(Debug, Default, Deserialize)]
pub struct BoxQuery {
    /// Only boxes whose tags contain this value; empty means no filter.
    pub tag: Option<String>,
}

impl BoxQuery {
    /// Translate the query into a store filter.
    #[must_use]
    pub fn to_filter(&self) -> Filter {
        match self.tag.as_deref() {
            Some(tag) if !tag.is_empty() => Filter::new().one_of(TAGS_FIELD, [tag]),
            _ => Filter::new(),
        }
    }
}

/// Create a candy box.
///
/// The body is validated in full before anything reaches the store.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<Created>> {
    let Json(input) = payload?;
    let candy_box = CandyBox::validate(&input)?;

    let id = db::create_document(state.store(), &CandyBox::collection(), &candy_box).await?;
    Ok(Json(Created { id }))
}

/// List candy boxes, optionally only those tagged `tag`.
#[tracing::instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BoxQuery>,
) -> Result<Json<Vec<Document>>> {
    let documents =
        db::get_documents(state.store(), &CandyBox::collection(), query.to_filter()).await?;
    Ok(Json(documents))
}
