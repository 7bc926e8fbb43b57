use clap::{Args, Subcommand};
use jiff::Timestamp;
use rust_decimal::Decimal;
use vouchers::amounts::parse_amount;
use vouchers_app::{
    context::AppContext,
    domain::{
        checkout::{ApplyResponse, CartTotals, CartUuid},
        vouchers::records::UserId,
    },
};

use super::{error_chain, print_json};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Apply a voucher code to a cart and print the adjusted total
    Apply(ApplyArgs),
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// User identifier
    #[arg(long)]
    user: String,

    /// Voucher code
    #[arg(long)]
    code: String,

    /// Merchandise subtotal
    #[arg(long, value_parser = amount)]
    subtotal: Decimal,

    /// Shipping fee
    #[arg(long, value_parser = amount, default_value = "0")]
    shipping_fee: Decimal,

    /// Place the order after a successful apply, redeeming the voucher
    #[arg(long)]
    checkout: bool,
}

fn amount(raw: &str) -> Result<Decimal, String> {
    parse_amount(raw).map_err(|error| error.to_string())
}

pub(crate) async fn run(
    app: &AppContext,
    command: CartCommand,
    now: Timestamp,
) -> Result<(), String> {
    match command.command {
        CartSubcommand::Apply(args) => {
            let cart = CartUuid::new();
            let user = UserId::new(args.user);
            let totals = CartTotals {
                subtotal: args.subtotal,
                shipping_fee: args.shipping_fee,
            };

            let response = app
                .checkout
                .apply_code(cart, user.clone(), args.code, totals, now)
                .await
                .map_err(|error| format!("failed to apply code: {}", error_chain(&error)))?;

            print_json(&response)?;

            if !args.checkout || !matches!(response, ApplyResponse::Applied { .. }) {
                return Ok(());
            }

            let receipt = app
                .checkout
                .complete_checkout(cart, user, totals, now)
                .await
                .map_err(|error| format!("checkout failed: {}", error_chain(&error)))?;

            print_json(&receipt)
        }
    }
}
