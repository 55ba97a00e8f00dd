//! Origami CLI - session database and shop API tooling.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! origami-cli migrate
//!
//! # Delete expired sessions
//! origami-cli sessions prune
//!
//! # Verify the shop API answers
//! origami-cli check-api
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "origami-cli")]
#[command(author, version, about = "Origami storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session table
    Migrate,
    /// Maintain stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Check that the shop API answers the catalogue endpoints
    CheckApi,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Delete expired sessions
    Prune,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sessions { action } => match action {
            SessionAction::Prune => commands::sessions::prune().await?,
        },
        Commands::CheckApi => {
            commands::api::run().await?;
        }
    }
    Ok(())
}
