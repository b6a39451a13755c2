//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Every error body is JSON with a single `detail` key:
//!
//! - validation failures (422): a list of `{"field", "kind", "message"}` entries
//! - store failures (500): the error text

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use candy_boxes_core::ValidationErrors;
use candy_boxes_core::schema::validate::BODY_FIELD;

use crate::db::StoreError;

/// `kind` reported for bodies that could not be parsed as JSON at all.
pub const MALFORMED_BODY_KIND: &str = "malformed_body";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed schema validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Request body was not a readable JSON document.
    #[error("Malformed body: {0}")]
    MalformedBody(String),

    /// Document store operation failed.
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

/// One entry of a 422 `detail` list.
#[derive(Debug, Serialize)]
struct DetailEntry {
    field: String,
    kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<T> {
    detail: T,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                tracing::debug!(error = %errors, "Validation failed");
                let detail: Vec<DetailEntry> = errors
                    .into_iter()
                    .map(|error| DetailEntry {
                        message: error.kind.to_string(),
                        kind: error.kind.code(),
                        field: error.field,
                    })
                    .collect();
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorBody { detail })).into_response()
            }
            Self::MalformedBody(reason) => {
                tracing::debug!(%reason, "Malformed request body");
                let detail = vec![DetailEntry {
                    field: BODY_FIELD.to_owned(),
                    kind: MALFORMED_BODY_KIND,
                    message: reason,
                }];
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorBody { detail })).into_response()
            }
            Self::Store(err) => {
                let event_id = sentry::capture_error(&err);
                tracing::error!(
                    error = %err,
                    sentry_event_id = %event_id,
                    "Request error"
                );
                let detail = err.to_string();
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { detail })).into_response()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use candy_boxes_core::{FieldError, FieldErrorKind};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use super::*;

    async fn into_json(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_every_field() {
        let errors = ValidationErrors::new(vec![
            FieldError::new("title", FieldErrorKind::Missing),
            FieldError::new(
                "price",
                FieldErrorKind::BelowMinimum {
                    min: "0".to_owned(),
                },
            ),
        ]);
        let (status, body) = into_json(AppError::Validation(errors)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({"detail": [
                {"field": "title", "kind": "missing", "message": "field required"},
                {"field": "price", "kind": "below_minimum",
                 "message": "must be greater than or equal to 0"}
            ]})
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_single_body_entry() {
        let (status, body) = into_json(AppError::MalformedBody("EOF".to_owned())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = body["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0]["field"], "body");
        assert_eq!(detail[0]["kind"], MALFORMED_BODY_KIND);
    }

    #[tokio::test]
    async fn test_store_error_is_500_with_text() {
        let error = AppError::Store(StoreError::unavailable("DATABASE_URL is not set"));
        let (status, body) = into_json(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"detail": "document store unavailable: DATABASE_URL is not set"})
        );
    }
}
