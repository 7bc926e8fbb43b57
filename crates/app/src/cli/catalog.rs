use std::{fs, path::PathBuf};

use clap::{Args, Subcommand};
use jiff::Timestamp;
use serde::Serialize;
use vouchers::{
    validation::VoucherInput,
    vouchers::{DiscountRule, VoucherScope},
};
use vouchers_app::{
    context::AppContext,
    domain::vouchers::{
        CatalogServiceError,
        records::{CatalogEntry, VoucherUuid},
        responses::CatalogResponse,
    },
};

use super::{print_json, table};

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List every voucher with its current status
    List(ListArgs),

    /// Show one voucher
    Show(UuidArgs),

    /// Create a voucher from a JSON input file
    Create(CreateArgs),

    /// Replace a voucher's fields from a JSON input file
    Update(UpdateArgs),

    /// Switch a voucher on or off
    Toggle(UuidArgs),

    /// Delete a voucher
    Delete(UuidArgs),

    /// Propose an unused code
    GenerateCode(GenerateCodeArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct UuidArgs {
    /// Voucher UUID
    #[arg(long)]
    uuid: VoucherUuid,
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// JSON file holding the voucher input
    #[arg(long)]
    input: PathBuf,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Voucher UUID
    #[arg(long)]
    uuid: VoucherUuid,

    /// JSON file holding the voucher input
    #[arg(long)]
    input: PathBuf,
}

#[derive(Debug, Args)]
struct GenerateCodeArgs {
    /// Text the code starts with
    #[arg(long)]
    prefix: Option<String>,
}

pub(crate) async fn run(
    app: &AppContext,
    command: CatalogCommand,
    now: Timestamp,
) -> Result<(), String> {
    let catalog = &app.catalog;

    match command.command {
        CatalogSubcommand::List(args) => {
            let entries = catalog
                .list_vouchers(now)
                .await
                .map_err(|error| format!("failed to list vouchers: {error}"))?;

            if args.json {
                return print_json(&entries);
            }

            if entries.is_empty() {
                println!("no vouchers found");
                return Ok(());
            }

            println!("{}", render_catalog(&entries));

            Ok(())
        }
        CatalogSubcommand::Show(args) => {
            let record = catalog
                .get_voucher(args.uuid)
                .await
                .map_err(|error| format!("failed to get voucher: {error}"))?;

            print_json(&record)
        }
        CatalogSubcommand::Create(args) => {
            let input = read_input(&args.input)?;

            respond(catalog.create_voucher(input).await, "voucher created")
        }
        CatalogSubcommand::Update(args) => {
            let input = read_input(&args.input)?;

            respond(
                catalog.update_voucher(args.uuid, input).await,
                "voucher updated",
            )
        }
        CatalogSubcommand::Toggle(args) => {
            respond(catalog.toggle_voucher(args.uuid).await, "voucher toggled")
        }
        CatalogSubcommand::Delete(args) => {
            respond(catalog.delete_voucher(args.uuid).await, "voucher deleted")
        }
        CatalogSubcommand::GenerateCode(args) => {
            let code = catalog
                .generate_code(args.prefix)
                .await
                .map_err(|error| format!("failed to generate code: {error}"))?;

            println!("{code}");

            Ok(())
        }
    }
}

fn read_input(path: &PathBuf) -> Result<VoucherInput, String> {
    let contents = fs::read_to_string(path)
        .map_err(|error| format!("failed to read {}: {error}", path.display()))?;

    serde_json::from_str(&contents)
        .map_err(|error| format!("failed to parse {}: {error}", path.display()))
}

/// Print the `{success, message}` envelope, failing the command on error.
fn respond<T: Serialize>(result: Result<T, CatalogServiceError>, message: &str) -> Result<(), String> {
    match result {
        Ok(data) => print_json(&CatalogResponse::ok(message, Some(data))),
        Err(error) => {
            let response = CatalogResponse::<T>::failure(&error);

            print_json(&response)?;

            Err(response.message)
        }
    }
}

fn render_catalog(entries: &[CatalogEntry]) -> String {
    table::render(
        [
            "Code", "Name", "Scope", "Discount", "Min Order", "Valid", "Used", "Status",
        ],
        entries.iter().map(|entry| {
            let voucher = &entry.record.voucher;

            [
                voucher.code.to_string(),
                voucher.name.clone(),
                scope_label(&voucher.scope),
                discount_label(&voucher.discount),
                voucher.min_order_amount.to_string(),
                format!(
                    "{} .. {}",
                    voucher.validity.valid_from(),
                    voucher.validity.valid_until()
                ),
                voucher.usage_limit.map_or_else(
                    || voucher.times_used.to_string(),
                    |limit| format!("{}/{limit}", voucher.times_used),
                ),
                entry.status.to_string(),
            ]
        }),
        4..5,
    )
}

fn scope_label(scope: &VoucherScope) -> String {
    match scope {
        VoucherScope::Platform => "platform".to_string(),
        VoucherScope::Store {
            owner_store_name: Some(name),
            ..
        } => name.clone(),
        VoucherScope::Store {
            owner_store_id: Some(id),
            ..
        } => format!("store {id}"),
        VoucherScope::Store { .. } => "store".to_string(),
    }
}

fn discount_label(discount: &DiscountRule) -> String {
    match discount {
        DiscountRule::Percent {
            percent,
            max_discount: Some(cap),
        } => format!("{percent}% up to {cap}"),
        DiscountRule::Percent { percent, .. } => format!("{percent}%"),
        DiscountRule::Fixed { amount } => format!("{amount} off"),
        DiscountRule::FreeShipping { amount } => format!("{amount} off shipping"),
    }
}
