//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Service banner
//! GET  /test                   - Store diagnostics (never fails)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store round trip)
//!
//! # Candy boxes
//! POST /api/boxes              - Create a candy box
//! GET  /api/boxes?tag=         - List candy boxes, optionally by tag
//!
//! # Orders
//! POST /api/orders             - Place an order
//! ```

pub mod boxes;
pub mod health;
pub mod home;
pub mod orders;

use axum::{Router, routing::get, routing::post};

use crate::state::AppState;

/// Create the candy box routes router.
pub fn box_routes() -> Router<AppState> {
    Router::new().route("/", get(boxes::index).post(boxes::create))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", post(orders::create))
}

/// Create the health routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/test", get(health::diagnostics))
        .nest("/health", health_routes())
        .nest("/api/boxes", box_routes())
        .nest("/api/orders", order_routes())
}
