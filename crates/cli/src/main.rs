//! Candy Boxes CLI - Database migrations and sample data.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! candy-cli migrate
//!
//! # Insert sample candy boxes
//! candy-cli seed
//! candy-cli seed --file boxes.json --dry-run
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Validate and insert sample candy boxes

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "candy-cli")]
#[command(author, version, about = "Candy Boxes CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert sample candy boxes
    Seed {
        /// JSON array of boxes to insert instead of the built-in samples
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Validate the samples without inserting them
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed { file, dry_run } => commands::seed::run(file.as_deref(), dry_run).await,
    }
}
