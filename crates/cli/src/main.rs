//! RocketShoes CLI - Drive the shopping cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rs-cart show
//!
//! # Add, update and remove products
//! rs-cart add 1
//! rs-cart update 1 3
//! rs-cart remove 1
//! ```
//!
//! # Commands
//!
//! - `show` - Print line items, subtotals and the total
//! - `add` - Add one unit of a product
//! - `update` - Set a product's amount (zero or negative is ignored)
//! - `remove` - Remove a product
//!
//! Configuration comes from the environment, see `rocketshoes_cart::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rocketshoes_cart::{CartConfig, CartManager, FileSlot, HttpCatalog};
use rocketshoes_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::cart::CartAction;

mod commands;

#[derive(Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "RocketShoes shopping cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Catalog product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Catalog product ID
        product_id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Update {
        /// Catalog product ID
        product_id: ProductId,

        /// New amount (zero or negative is ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

impl Commands {
    const fn action(&self) -> Option<CartAction> {
        match *self {
            Self::Show => None,
            Self::Add { product_id } => Some(CartAction::Add(product_id)),
            Self::Remove { product_id } => Some(CartAction::Remove(product_id)),
            Self::Update { product_id, amount } => Some(CartAction::Update { product_id, amount }),
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    Some(sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=info,rs_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first so Sentry is up before tracing
    let config = CartConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if config.sentry_dsn.is_some() {
        tracing::debug!("Sentry initialized");
    }

    match run(cli, &config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut manager = CartManager::new(
        HttpCatalog::new(&config.catalog),
        FileSlot::new(&config.storage.path),
        config.storage.key.clone(),
    );

    let mut code = ExitCode::SUCCESS;
    if let Some(action) = cli.command.action()
        && let Err(e) = commands::cart::apply(&mut manager, action).await
    {
        // The notification is what a shopper would see; details go to the log
        tracing::debug!(error = %e, "Cart operation failed");
        writeln!(std::io::stderr().lock(), "{}", e.notification())?;
        code = ExitCode::FAILURE;
    }

    commands::show::render(manager.cart(), &mut std::io::stdout().lock())?;
    Ok(code)
}
