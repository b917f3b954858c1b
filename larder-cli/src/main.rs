use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{
    AppContext, ConfigCommand, FoodCommand, HouseholdCommand, ReceiptCommand, ShoppingCommand,
    WatchCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "larder")]
#[command(version)]
#[command(about = "Household food inventory and shared shopping lists", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage shopping lists and their items
    Shopping(ShoppingCommand),

    /// Manage foods, products, and dishes
    Food(FoodCommand),

    /// Show household membership
    Household(HouseholdCommand),

    /// Import and browse scanned receipts
    Receipt(ReceiptCommand),

    /// Follow the active shopping list live
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    match &cli.command {
        Some(Commands::Shopping(cmd)) => {
            let ctx = AppContext::connect(&config).await?;
            cmd.run(&ctx, &config).await?;
        }
        Some(Commands::Food(cmd)) => {
            let ctx = AppContext::connect(&config).await?;
            cmd.run(&ctx, &config).await?;
        }
        Some(Commands::Household(cmd)) => {
            let ctx = AppContext::connect(&config).await?;
            cmd.run(&ctx)?;
        }
        Some(Commands::Receipt(cmd)) => {
            let ctx = AppContext::connect(&config).await?;
            cmd.run(&ctx, &config).await?;
        }
        Some(Commands::Watch(cmd)) => {
            let ctx = AppContext::connect(&config).await?;
            cmd.run(&ctx, &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
