//! Maison admin CLI - Database migrations and order fulfillment.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! maison-admin migrate
//!
//! # Print an order receipt
//! maison-admin orders show 482913305
//!
//! # Move an order along its lifecycle
//! maison-admin orders status 482913305 shipped
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `orders show` - Print an order
//! - `orders status` - Change an order's fulfillment status

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "maison-admin")]
#[command(author, version, about = "Maison admin tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect and fulfill orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Print an order receipt
    Show {
        /// Order number
        order_number: String,
    },
    /// Change an order's status
    Status {
        /// Order number
        order_number: String,
        /// pending, processing, shipped, delivered or cancelled
        status: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "maison_cli=info,maison_admin=info,maison_storefront=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Orders { action } => match action {
            OrderAction::Show { order_number } => commands::orders::show(&order_number).await?,
            OrderAction::Status {
                order_number,
                status,
            } => commands::orders::set_status(&order_number, &status).await?,
        },
    }
    Ok(())
}
