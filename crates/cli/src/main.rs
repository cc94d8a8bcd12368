//! vendorcart CLI - Cart inspection and reconciliation tools.
//!
//! # Usage
//!
//! ```bash
//! # Print a stored guest cart
//! vc-cli cart show --vendor 1 --owner guest:<uuid>
//!
//! # Reprice a cart document
//! vc-cli cart price cart.json
//!
//! # Merge two cart documents offline and print the replay plan
//! vc-cli cart merge --local guest.json --server server.json
//!
//! # Move a stored guest cart into a customer's server cart
//! VENDORCART_ACCESS_TOKEN=<token> vc-cli cart login --vendor 1 --owner guest:<uuid>
//! ```
//!
//! # Commands
//!
//! - `cart show` - Print a stored guest cart as a cart document
//! - `cart price` - Recompute a cart document's totals
//! - `cart merge` - Merge a guest cart document into a server cart document
//! - `cart login` - Run login reconciliation against the server cart API

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use vendorcart_core::{CartDocument, OwnerRef, TaxRate, VendorId};

mod commands;

#[derive(Parser)]
#[command(name = "vc-cli")]
#[command(author, version, about = "vendorcart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect, price and reconcile carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print a stored guest cart
    Show {
        /// Vendor the cart belongs to
        #[arg(short, long)]
        vendor: VendorId,

        /// Cart owner (`guest:<uuid>` or `user:<id>`)
        #[arg(short, long)]
        owner: OwnerRef,

        /// Directory holding stored carts
        #[arg(short, long, env = "VENDORCART_DATA_DIR", default_value = "./data/carts")]
        data_dir: PathBuf,

        /// Tax rate fraction; defaults to the vendor's configured rate
        #[arg(short, long)]
        tax_rate: Option<TaxRate>,
    },
    /// Recompute a cart document's totals
    Price {
        /// Cart document (JSON)
        file: PathBuf,

        /// Tax rate fraction; defaults to the vendor's configured rate
        #[arg(short, long)]
        tax_rate: Option<TaxRate>,
    },
    /// Merge a guest cart document into a server cart document
    Merge {
        /// Guest cart document (JSON)
        #[arg(short, long)]
        local: PathBuf,

        /// Server cart document (JSON)
        #[arg(short, long)]
        server: PathBuf,

        /// Tax rate fraction; defaults to the vendor's configured rate
        #[arg(short, long)]
        tax_rate: Option<TaxRate>,
    },
    /// Move a stored guest cart into a customer's server cart
    Login {
        /// Vendor the cart belongs to
        #[arg(short, long)]
        vendor: VendorId,

        /// Guest owner (`guest:<uuid>`)
        #[arg(short, long)]
        owner: OwnerRef,

        /// Customer access token
        #[arg(long, env = "VENDORCART_ACCESS_TOKEN", hide_env_values = true)]
        token: String,

        /// Directory holding stored carts
        #[arg(short, long, env = "VENDORCART_DATA_DIR", default_value = "./data/carts")]
        data_dir: PathBuf,

        /// Tax rate fraction; defaults to the vendor's configured rate
        #[arg(short, long)]
        tax_rate: Option<TaxRate>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show {
                vendor,
                owner,
                data_dir,
                tax_rate,
            } => {
                let document = commands::cart::show(&data_dir, vendor, owner, tax_rate)?;
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
            CartAction::Price { file, tax_rate } => {
                let report = commands::cart::price(&file, tax_rate)?;
                println!("{}", serde_json::to_string_pretty(&report.document)?);
                if !report.totals_match {
                    println!("reported totals were wrong; recomputed above");
                }
            }
            CartAction::Merge {
                local,
                server,
                tax_rate,
            } => {
                let reconciliation = commands::cart::merge_documents(&local, &server, tax_rate)?;
                println!("{}", serde_json::to_string_pretty(&CartDocument::from(&reconciliation.cart))?);
                if reconciliation.is_noop() {
                    println!("plan: nothing to replay");
                } else {
                    println!("plan:");
                    for step in &reconciliation.plan {
                        println!("  {}", commands::cart::describe_step(step));
                    }
                }
            }
            CartAction::Login {
                vendor,
                owner,
                token,
                data_dir,
                tax_rate,
            } => {
                let document = commands::cart::login(
                    &data_dir,
                    vendor,
                    owner,
                    SecretString::from(token),
                    tax_rate,
                )
                .await?;
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
        },
    }
    Ok(())
}
