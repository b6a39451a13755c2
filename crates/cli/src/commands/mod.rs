//! CLI subcommands.

pub mod migrate;
pub mod seed;

/// Error returned by every command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] candy_boxes_api::config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Store(#[from] candy_boxes_api::db::StoreError),

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid sample data: {0}")]
    InvalidSample(String),
}

/// Load `DATABASE_URL`, reading `.env` first when present.
pub fn database_url() -> Result<secrecy::SecretString, CommandError> {
    dotenvy::dotenv().ok();
    let url = candy_boxes_api::config::get_required_env("DATABASE_URL")?;
    Ok(secrecy::SecretString::from(url))
}
