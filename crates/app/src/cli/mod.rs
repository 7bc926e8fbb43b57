use clap::{Parser, Subcommand};
use jiff::Timestamp;
use serde::Serialize;
use vouchers_app::{
    config::{LoggingConfig, StorageConfig},
    context::AppContext,
    observability,
};

pub(crate) use vouchers_app::domain::vouchers::responses::error_chain;

mod cart;
mod catalog;
mod table;
mod wallet;

#[derive(Debug, Parser)]
#[command(name = "vouchers-app", about = "Voucher engine CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(flatten)]
    storage: StorageConfig,

    /// Evaluate vouchers as of this instant instead of the current time
    #[arg(long, env = "VOUCHER_NOW", global = true)]
    now: Option<Timestamp>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Catalog(catalog::CatalogCommand),
    Wallet(wallet::WalletCommand),
    Cart(cart::CartCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_logging(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let app = AppContext::from_config(&self.storage)
            .await
            .map_err(|error| format!("failed to start: {}", error_chain(&error)))?;

        let now = self.now.unwrap_or_else(Timestamp::now);

        match self.command {
            Commands::Catalog(command) => catalog::run(&app, command, now).await,
            Commands::Wallet(command) => wallet::run(&app, command, now).await,
            Commands::Cart(command) => cart::run(&app, command, now).await,
        }
    }
}

pub(crate) fn print_json(value: &impl Serialize) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to serialise output: {error}"))?;

    println!("{json}");

    Ok(())
}
