use clap::{Args, Subcommand};
use jiff::Timestamp;
use vouchers_app::{
    context::AppContext,
    domain::{vouchers::records::UserId, wallet::VoucherView},
};

use super::{error_chain, print_json, table};

#[derive(Debug, Args)]
pub(crate) struct WalletCommand {
    #[command(subcommand)]
    command: WalletSubcommand,
}

#[derive(Debug, Subcommand)]
enum WalletSubcommand {
    /// Show a user's saved vouchers by tab
    Show(ShowArgs),

    /// Save a voucher to a user's wallet
    Save(SaveArgs),
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// User identifier
    #[arg(long)]
    user: String,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct SaveArgs {
    /// User identifier
    #[arg(long)]
    user: String,

    /// Voucher code
    #[arg(long)]
    code: String,
}

pub(crate) async fn run(
    app: &AppContext,
    command: WalletCommand,
    now: Timestamp,
) -> Result<(), String> {
    match command.command {
        WalletSubcommand::Show(args) => {
            let wallet = app
                .wallet
                .get_wallet(UserId::new(args.user), now)
                .await
                .map_err(|error| format!("failed to load wallet: {}", error_chain(&error)))?;

            if args.json {
                return print_json(&wallet);
            }

            for (title, views) in [
                ("Available", &wallet.available),
                ("Used", &wallet.used),
                ("Expired", &wallet.expired),
            ] {
                println!("{title} ({})", views.len());

                if !views.is_empty() {
                    println!("{}", render_tab(views));
                }
            }

            Ok(())
        }
        WalletSubcommand::Save(args) => {
            let view = app
                .wallet
                .save_voucher(UserId::new(args.user), args.code, now)
                .await
                .map_err(|error| format!("failed to save voucher: {}", error_chain(&error)))?;

            print_json(&view)
        }
    }
}

fn render_tab(views: &[VoucherView]) -> String {
    table::render(
        ["Code", "Name", "Status", "Used", "Saved At"],
        views.iter().map(|view| {
            [
                view.voucher.code.to_string(),
                view.voucher.name.clone(),
                view.status.to_string(),
                format!("{}/{}", view.used_count, view.voucher.per_user_limit),
                view.saved_at.to_string(),
            ]
        }),
        3..4,
    )
}
