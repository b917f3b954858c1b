//! Receipt CLI commands.
//!
//! Import receipt text through the assistant and browse past imports.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};

use larder_core::{Receipt, Receipts};

use super::{assistant, slot_err, AppContext, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ReceiptCommand {
    #[command(subcommand)]
    pub command: ReceiptSubcommand,
}

#[derive(Subcommand)]
pub enum ReceiptSubcommand {
    /// List imported receipts
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one receipt with its line items
    Show {
        /// Receipt id
        id: String,
    },

    /// Parse receipt text and store the result ("-" reads stdin)
    Import {
        /// Path to a text file with the receipt contents
        file: PathBuf,
    },
}

impl ReceiptCommand {
    pub async fn run(
        &self,
        ctx: &AppContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ReceiptSubcommand::List { format } => {
                let mut receipts = self.hook(ctx, config, false)?;
                receipts.load().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(receipts.receipts())?);
                    }
                    OutputFormat::Table => {
                        if receipts.receipts().is_empty() {
                            println!("No receipts imported yet.");
                            return Ok(());
                        }
                        println!("Receipts");
                        println!("{}", "=".repeat(60));
                        for receipt in receipts.receipts() {
                            println!(
                                "{:<12} {:<25} {:<12} {}",
                                receipt.id,
                                receipt.store_name,
                                receipt
                                    .purchased_at
                                    .map(|d| d.format("%Y-%m-%d").to_string())
                                    .unwrap_or_else(|| "-".to_string()),
                                total_display(receipt)
                            );
                        }
                    }
                }
                Ok(())
            }

            ReceiptSubcommand::Show { id } => {
                let mut receipts = self.hook(ctx, config, false)?;
                receipts.load().await?;
                let Some(receipt) = receipts.receipt(id) else {
                    return Err(format!("No receipt with id '{}'", id).into());
                };
                print_receipt(receipt);
                Ok(())
            }

            ReceiptSubcommand::Import { file } => {
                let text = read_input(file)?;
                if text.trim().is_empty() {
                    return Err("Receipt text is empty".into());
                }
                let mut receipts = self.hook(ctx, config, true)?;
                let receipt = receipts
                    .import(&text)
                    .await
                    .map_err(|e| slot_err(receipts.last_error(), e))?;
                println!("Imported receipt from {}", receipt.store_name);
                print_receipt(&receipt);
                Ok(())
            }
        }
    }

    fn hook(
        &self,
        ctx: &AppContext,
        config: &Config,
        need_assistant: bool,
    ) -> Result<Receipts, Box<dyn std::error::Error>> {
        // Browsing commands never call the assistant; only import needs
        // one configured.
        let assistant = if need_assistant {
            Some(assistant(config)?)
        } else {
            None
        };
        Ok(Receipts::new(
            Arc::clone(&ctx.api),
            assistant,
            ctx.session.user_id(),
            ctx.session.household_id(),
        ))
    }
}

fn read_input(file: &PathBuf) -> Result<String, Box<dyn std::error::Error>> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(file)?)
    }
}

fn print_receipt(receipt: &Receipt) {
    println!("{}", receipt.store_name);
    println!("{}", "=".repeat(44));
    if let Some(date) = receipt.purchased_at {
        println!("purchased: {}", date.format("%Y-%m-%d"));
    }
    for item in &receipt.items {
        match item.price {
            Some(price) => println!(
                "{:<25} {:>5} x {:>8.2}",
                item.name, item.quantity, price
            ),
            None => println!("{:<25} {:>5}", item.name, item.quantity),
        }
    }
    println!("{}", "-".repeat(44));
    println!("total: {}", total_display(receipt));
}

fn total_display(receipt: &Receipt) -> String {
    match receipt.total {
        Some(total) => format!("{:.2}", total),
        None => "-".to_string(),
    }
}
