//! Service banner.

use axum::Json;
use serde::Serialize;

/// Banner text returned by `GET /`.
pub const BANNER: &str = "Swedish Candy Boxes Backend Running";

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
}

/// Confirm the service is up.
pub async fn home() -> Json<Banner> {
    Json(Banner { message: BANNER })
}
