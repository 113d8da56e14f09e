//! Maison Storefront - Command-line storefront client.
//!
//! Browse the catalog, manage the cart, check out and track orders.
//!
//! # Architecture
//!
//! - `clap` subcommands, one module per area under `commands/`
//! - Cart persisted as JSON under `MAISON_DATA_DIR`
//! - `PostgreSQL` for orders and accounts when `MAISON_DATABASE_URL` is set,
//!   an in-memory store otherwise
//!
//! # Usage
//!
//! ```bash
//! maison products --collection women --sort price-asc
//! maison cart add 1
//! maison checkout --shipping ship.json --payment-reference PAY-1 --guest
//! maison track 482913305 ada@example.com --receipt
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maison_storefront::config::StorefrontConfig;
use maison_storefront::error::AppError;
use maison_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "maison")]
#[command(author, version, about = "Maison storefront")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Browse the catalog
    Products(commands::catalog::ProductsArgs),
    /// Show one product
    Product {
        /// Product id
        id: String,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Check out the cart
    Checkout(commands::checkout::CheckoutArgs),
    /// Look up an order by number and email
    Track {
        /// Order number
        order_number: String,
        /// Email used at checkout
        email: String,
        /// Print a full receipt
        #[arg(long)]
        receipt: bool,
    },
    /// Order history of the signed-in customer
    Orders {
        #[command(flatten)]
        credentials: commands::Credentials,
    },
    /// Manage the customer account
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.sentry_environment.clone().into()),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "maison_storefront=info,maison=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{}", e.user_message());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let state = AppState::connect(config).await?;

    match cli.command {
        Command::Products(args) => commands::catalog::products(&state, &args),
        Command::Product { id } => commands::catalog::product(&state, &id),
        Command::Cart { action } => commands::cart::run(&state, action),
        Command::Checkout(args) => commands::checkout::run(&state, args).await,
        Command::Track {
            order_number,
            email,
            receipt,
        } => commands::orders::track(&state, &order_number, &email, receipt).await,
        Command::Orders { credentials } => commands::orders::history(&state, &credentials).await,
        Command::Account { action } => commands::account::run(&state, action).await,
    }
}
