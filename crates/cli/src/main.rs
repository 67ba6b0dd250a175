//! Bookstore CLI - Database migrations, seeding and development tokens.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! bookstore migrate
//!
//! # Upsert users and books from a YAML file
//! bookstore seed --file demos/seed.yaml
//!
//! # Print a bearer token for user 1
//! bookstore token issue --user-id 1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Upsert users and books
//! - `token issue` - Issue a development bearer token

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bookstore_core::UserId;

mod commands;

#[derive(Parser)]
#[command(name = "bookstore")]
#[command(author, version, about = "Bookstore backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed users and books from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Manage bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for a user
    Issue {
        /// User the token authenticates
        #[arg(short, long)]
        user_id: UserId,
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
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            let summary = commands::seed::run(&file).await?;
            tracing::info!(users = summary.users, books = summary.books, "Seed complete");
        }
        Commands::Token { action } => match action {
            TokenAction::Issue { user_id } => {
                let token = commands::token::issue(user_id)?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{token}");
                }
            }
        },
    }
    Ok(())
}
