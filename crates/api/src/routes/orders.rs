//! Order route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value as JsonValue;

use candy_boxes_core::{Order, Schema};

use super::boxes::Created;
use crate::db;
use crate::error::Result;
use crate::state::AppState;

/// Place an order.
///
/// Items must be non-empty with positive quantities. The total is stored as
/// given and is not recomputed from the items.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<Created>> {
    let Json(input) = payload?;
    let order = Order::validate(&input)?;

    let id = db::create_document(state.store(), &Order::collection(), &order).await?;
    tracing::info!(%id, items = order.items.len(), "Order placed");
    Ok(Json(Created { id }))
}
