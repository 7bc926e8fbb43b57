//! Voucher Application CLI

use std::process;

use clap::Parser;
use vouchers_app::config;

mod cli;

#[tokio::main]
pub async fn main() {
    config::load_dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = cli.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
