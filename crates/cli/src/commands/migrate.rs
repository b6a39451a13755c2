//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! candy-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile time.

use candy_boxes_api::db;

use super::{CommandError, database_url};

/// Run the document store migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset, the database cannot be
/// reached, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
