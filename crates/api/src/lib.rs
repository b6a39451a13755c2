//! Candy Boxes API library.
//!
//! HTTP backend for candy boxes and orders over a document store. Exposed as
//! a library so the router can be driven directly in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{Router, extract::Request};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application: routes, middleware and state.
///
/// Layers run outermost first: Sentry, CORS, tracing, request ID. Each
/// `.layer` call wraps everything added before it.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .layer(CorsLayer::very_permissive())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
