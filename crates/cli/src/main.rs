//! Shopfront CLI - Database migrations, seeding and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront and session-store migrations
//! shopfront-cli migrate
//!
//! # Load the bundled catalog and demo account
//! shopfront-cli seed
//!
//! # Load a custom catalog, appending to what is already there
//! shopfront-cli seed --file products.yaml --keep-existing
//!
//! # Create a customer account
//! shopfront-cli user create -u alice -p secret1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the product catalog and the demo account
//! - `user create` - Create customer accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopfront-cli")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the product catalog and the demo account
    Seed {
        /// YAML catalog file (defaults to the bundled catalog)
        #[arg(short, long)]
        file: Option<String>,

        /// Append to the existing catalog instead of replacing it
        #[arg(long)]
        keep_existing: bool,
    },
    /// Manage customer accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new customer account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Plain-text password (hashed before storage)
        #[arg(short, long)]
        password: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            file,
            keep_existing,
        } => commands::seed::catalog(file.as_deref(), keep_existing).await?,
        Commands::User { action } => match action {
            UserAction::Create { username, password } => {
                commands::user::create(&username, &password).await?;
            }
        },
    }
    Ok(())
}
