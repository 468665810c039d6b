//! Monogram CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mg-cli migrate run
//!
//! # Store an offline Admin API token for a shop
//! mg-cli token set -s demo-store.myshopify.com -t shpat_... --scopes read_products
//!
//! # Revoke a shop's token
//! mg-cli token revoke -s demo-store.myshopify.com
//!
//! # Check whether a shop has a token
//! mg-cli token status -s demo-store.myshopify.com
//! ```
//!
//! # Commands
//!
//! - `migrate run` - Run database migrations
//! - `token set|revoke|status` - Manage per-shop Admin API tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mg-cli")]
#[command(author, version, about = "Monogram CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Manage per-shop Admin API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply pending migrations
    Run,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Store (or replace) a shop's offline Admin API token
    Set {
        /// Shop domain (e.g., demo-store.myshopify.com)
        #[arg(short, long)]
        shop: String,

        /// Offline Admin API access token
        #[arg(short, long)]
        token: String,

        /// Granted scopes, comma-separated
        #[arg(long, default_value = "")]
        scopes: String,
    },
    /// Delete a shop's token
    Revoke {
        /// Shop domain
        #[arg(short, long)]
        shop: String,
    },
    /// Report whether a shop has a token stored
    Status {
        /// Shop domain
        #[arg(short, long)]
        shop: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate { action } => match action {
            MigrateAction::Run => commands::migrate::run().await?,
        },
        Commands::Token { action } => match action {
            TokenAction::Set {
                shop,
                token,
                scopes,
            } => {
                commands::token::set(&shop, &token, &scopes).await?;
            }
            TokenAction::Revoke { shop } => commands::token::revoke(&shop).await?,
            TokenAction::Status { shop } => commands::token::status(&shop).await?,
        },
    }
    Ok(())
}
