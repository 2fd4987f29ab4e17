use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::AppConfig;
use gateway::{paystar::Paystar, CallbackParams};
use ledger::{Checkout, Ledger, PaymentRecord};
use paystar_core::{validation, Invoice};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "paystar", version, about = "Paystar payment gateway client")]
pub struct Cli {
    /// Config file (defaults to the per-user config location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger directory, overrides the config file
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the merchant pin in the OS keychain
    #[command(subcommand)]
    Secret(SecretCommand),
    #[command(flatten)]
    Payment(PaymentCommand),
}

#[derive(Debug, Subcommand)]
pub enum PaymentCommand {
    /// Create a payment with the provider
    Purchase(PurchaseArgs),
    /// Print the redirect that sends the payer to the payment page
    Pay(Target),
    /// Confirm a payment after the payer returns
    Verify(VerifyArgs),
    /// List recorded payments
    Status,
}

#[derive(Debug, Args)]
pub struct PurchaseArgs {
    #[arg(long)]
    pub amount: u64,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub mobile: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct Target {
    #[arg(long)]
    pub invoice: Option<String>,
    #[arg(long)]
    pub transid: Option<String>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct VerifyArgs {
    #[arg(long)]
    pub invoice: Option<String>,
    #[arg(long)]
    pub transid: Option<String>,
    /// Full URL the provider redirected the payer to
    #[arg(long)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum SecretCommand {
    Set { value: String },
    Delete,
}

#[derive(Debug, Serialize)]
struct PurchaseOutput {
    invoice_id: String,
    transaction_id: String,
    amount: u64,
}

#[derive(Debug, Serialize)]
struct PayOutput {
    invoice_id: String,
    redirect: serde_json::Value,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut cfg = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };
    if let Some(dir) = &cli.ledger {
        cfg.ledger_dir = dir.clone();
    }
    Ok(cfg)
}

fn checkout(cfg: &AppConfig) -> Result<Checkout> {
    let settings = cfg.settings(crate::merchant_id(cfg)?);
    validation::validate_settings(&settings)
        .map_err(|errs| anyhow!("invalid gateway settings: {}", errs.join("; ")))?;

    let transport = crate::create_transport(cfg)?;
    let driver = Arc::new(Paystar::new(settings, transport));
    let ledger = Arc::new(Ledger::open(&cfg.ledger_dir)?);
    Ok(Checkout::new(driver, ledger))
}

fn resolve_invoice(
    checkout: &Checkout,
    invoice: Option<String>,
    transid: Option<String>,
) -> Result<String> {
    match (invoice, transid) {
        (Some(id), _) => Ok(id),
        (None, Some(transid)) => checkout
            .ledger()
            .find_by_transaction(&transid)?
            .map(|rec: PaymentRecord| rec.invoice_id)
            .ok_or_else(|| anyhow!("no payment recorded for transaction {transid}")),
        (None, None) => bail!("either --invoice or --transid is required"),
    }
}

fn manage_secret(cmd: SecretCommand) -> Result<()> {
    match cmd {
        SecretCommand::Set { value } => {
            config::store_secret(config::MERCHANT_SECRET_KEY, &value)
                .context("Failed to store merchant pin")?;
            tracing::info!("merchant pin stored in keychain");
            Ok(())
        }
        SecretCommand::Delete => config::delete_secret(config::MERCHANT_SECRET_KEY)
            .context("Failed to delete merchant pin"),
    }
}

async fn execute(checkout: &Checkout, command: PaymentCommand) -> Result<()> {
    match command {
        PaymentCommand::Purchase(args) => {
            let mut invoice = Invoice::new(args.amount);
            let details = [
                ("email", args.email),
                ("mobile", args.mobile),
                ("phone", args.phone),
                ("description", args.description),
            ];
            for (key, value) in details {
                if let Some(value) = value {
                    invoice = invoice.with_detail(key, value);
                }
            }

            let transaction_id = checkout.purchase(&mut invoice).await?;
            print_json(&PurchaseOutput {
                invoice_id: invoice.uuid().to_string(),
                transaction_id,
                amount: invoice.amount(),
            })
        }
        PaymentCommand::Pay(target) => {
            let invoice_id = resolve_invoice(checkout, target.invoice, target.transid)?;
            let form = checkout.pay(&invoice_id)?;
            print_json(&PayOutput {
                invoice_id,
                redirect: form.to_json(),
            })
        }
        PaymentCommand::Verify(args) => {
            let receipt = match args.callback_url {
                Some(url) => {
                    let callback = CallbackParams::from_url(&url)?;
                    checkout.verify_callback(&callback).await?
                }
                None => {
                    let invoice_id = resolve_invoice(checkout, args.invoice, args.transid)?;
                    checkout.verify(&invoice_id).await?
                }
            };
            print_json(&receipt)
        }
        PaymentCommand::Status => print_json(&checkout.ledger().list()?),
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli)?;
    match cli.command {
        Command::Secret(cmd) => manage_secret(cmd),
        Command::Payment(command) => {
            let checkout = checkout(&cfg)?;
            let result = execute(&checkout, command).await;
            checkout.ledger().flush()?;
            result
        }
    }
}
