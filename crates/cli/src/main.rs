//! Shopfloor CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sf-cli migrate
//!
//! # Approve a basket
//! sf-cli basket approve --id basket_k3j9x0a2b
//!
//! # Complete a basket
//! sf-cli basket set-status --id basket_k3j9x0a2b --status completed
//!
//! # Import a catalog sheet
//! sf-cli catalog import --file products.xlsx
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations and create the session table
//! - `basket approve` / `basket set-status` - Basket status edits
//! - `catalog import` - Load products from a spreadsheet

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Shopfloor CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage baskets
    Basket {
        #[command(subcommand)]
        action: BasketAction,
    },
    /// Manage the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum BasketAction {
    /// Approve a basket waiting for a cashier
    Approve {
        /// Basket id
        #[arg(short, long)]
        id: String,
    },
    /// Set a basket's status
    SetStatus {
        /// Basket id
        #[arg(short, long)]
        id: String,

        /// New status (`pending_cashier_approval`, `active`, `completed`, `inactive`)
        #[arg(short, long)]
        status: String,

        /// Allow moves that are not forward in the lifecycle
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Import products from a spreadsheet
    Import {
        /// Path to the workbook
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Basket { action } => match action {
            BasketAction::Approve { id } => commands::basket::approve(&id).await?,
            BasketAction::SetStatus { id, status, force } => {
                commands::basket::set_status(&id, &status, force).await?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Import { file } => commands::catalog::import(&file).await?,
        },
    }
    Ok(())
}
