//! Shopping list CLI commands.
//!
//! Manage the household's shared shopping lists and the items on the
//! active list.

use std::collections::HashMap;
use std::sync::Arc;

use clap::{Args, Subcommand};

use larder_core::{Inventory, ShoppingSync};

use super::{shopping_sync, slot_err, AppContext, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ShoppingCommand {
    #[command(subcommand)]
    pub command: ShoppingSubcommand,
}

#[derive(Subcommand)]
pub enum ShoppingSubcommand {
    /// Show all shopping lists for the household
    Lists {
        /// Output format
        #[arg(long, short, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Switch the active shopping list
    Use {
        /// List id or name
        list: String,
    },

    /// Create a new shopping list and make it active
    CreateList {
        /// List name
        name: String,
    },

    /// Delete a shopping list
    DeleteList {
        /// List id or name
        list: String,
    },

    /// Show items on the active list
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Add a food item to the active list
    Add {
        /// Food item id or name
        food: String,

        /// Quantity
        #[arg(long, short, default_value_t = 1.0)]
        qty: f64,
    },

    /// Change an item's quantity (0 removes it)
    Qty {
        /// Item id or food name
        item: String,

        /// New quantity
        qty: f64,
    },

    /// Mark an item as picked up
    Check {
        /// Item id or food name
        item: String,
    },

    /// Uncheck a previously checked item
    Uncheck {
        /// Item id or food name
        item: String,
    },

    /// Remove an item from the active list
    Remove {
        /// Item id or food name
        item: String,
    },

    /// Remove every checked item from the active list
    ClearChecked,
}

impl ShoppingCommand {
    pub async fn run(
        &self,
        ctx: &AppContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut sync = shopping_sync(ctx, config).await?;

        match &self.command {
            ShoppingSubcommand::Lists { format } => {
                print_lists(&sync, format)?;
                Ok(())
            }

            ShoppingSubcommand::Use { list } => {
                let id = resolve_list(&sync, list)?;
                sync.select_list(&id)
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                let name = sync.active_list().map(|l| l.name.clone()).unwrap_or(id);
                println!("Now using '{}'", name);
                Ok(())
            }

            ShoppingSubcommand::CreateList { name } => {
                let list = sync
                    .create_list(name)
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                println!("Created list '{}' ({})", list.name, list.id);
                Ok(())
            }

            ShoppingSubcommand::DeleteList { list } => {
                let id = resolve_list(&sync, list)?;
                let name = sync
                    .lists()
                    .iter()
                    .find(|l| l.id == id)
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| id.clone());
                sync.delete_list(&id)
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                println!("Deleted list '{}'", name);
                Ok(())
            }

            ShoppingSubcommand::List { format } => {
                let inventory = load_inventory(ctx).await?;
                print_items(&sync, &inventory, format)?;
                Ok(())
            }

            ShoppingSubcommand::Add { food, qty } => {
                let inventory = load_inventory(ctx).await?;
                let food = resolve_food(&inventory, food)?;
                sync.add_item(&food.0, *qty)
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                println!("Added {} x {}", format_quantity(*qty), food.1);
                Ok(())
            }

            ShoppingSubcommand::Qty { item, qty } => {
                let inventory = load_inventory(ctx).await?;
                let id = resolve_item(&sync, &inventory, item)?;
                sync.update_quantity(&id, *qty)
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                if *qty <= 0.0 {
                    println!("Removed '{}'", item);
                } else {
                    println!("Set '{}' to {}", item, format_quantity(*qty));
                }
                Ok(())
            }

            ShoppingSubcommand::Check { item } => {
                let inventory = load_inventory(ctx).await?;
                let id = resolve_item(&sync, &inventory, item)?;
                sync.toggle_checked(&id, true)
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                println!("Checked '{}'", item);
                Ok(())
            }

            ShoppingSubcommand::Uncheck { item } => {
                let inventory = load_inventory(ctx).await?;
                let id = resolve_item(&sync, &inventory, item)?;
                sync.toggle_checked(&id, false)
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                println!("Unchecked '{}'", item);
                Ok(())
            }

            ShoppingSubcommand::Remove { item } => {
                let inventory = load_inventory(ctx).await?;
                let id = resolve_item(&sync, &inventory, item)?;
                sync.remove_item(&id)
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                println!("Removed '{}'", item);
                Ok(())
            }

            ShoppingSubcommand::ClearChecked => {
                let count = sync
                    .clear_completed()
                    .await
                    .map_err(|e| slot_err(sync.last_error(), e))?;
                if count == 0 {
                    println!("No checked items to clear");
                } else {
                    println!("Cleared {} checked items", count);
                }
                Ok(())
            }
        }
    }
}

async fn load_inventory(ctx: &AppContext) -> Result<Inventory, Box<dyn std::error::Error>> {
    let mut inventory = Inventory::new(
        Arc::clone(&ctx.api),
        ctx.session.user_id(),
        ctx.session.household_id(),
    );
    inventory.load().await?;
    Ok(inventory)
}

/// Resolve a list argument: exact id first, then case-insensitive name.
pub(crate) fn resolve_list(
    sync: &ShoppingSync,
    arg: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(list) = sync.lists().iter().find(|l| l.id == arg) {
        return Ok(list.id.clone());
    }
    let lowered = arg.to_lowercase();
    let mut matches = sync
        .lists()
        .iter()
        .filter(|l| l.name.to_lowercase() == lowered);
    match (matches.next(), matches.next()) {
        (Some(list), None) => Ok(list.id.clone()),
        (Some(_), Some(_)) => Err(format!(
            "'{}' matches more than one list, use the list id",
            arg
        )
        .into()),
        (None, _) => Err(format!("No list named '{}'", arg).into()),
    }
}

/// Resolve a food argument to (id, name): exact id first, then
/// case-insensitive name.
fn resolve_food(
    inventory: &Inventory,
    arg: &str,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    if let Some(food) = inventory.food(arg) {
        return Ok((food.id.clone(), food.name.clone()));
    }
    let lowered = arg.to_lowercase();
    let mut matches = inventory
        .foods()
        .iter()
        .filter(|f| f.name.to_lowercase() == lowered);
    match (matches.next(), matches.next()) {
        (Some(food), None) => Ok((food.id.clone(), food.name.clone())),
        (Some(_), Some(_)) => Err(format!(
            "'{}' matches more than one food item, use the item id",
            arg
        )
        .into()),
        (None, _) => Err(format!(
            "No food item named '{}'. Add it with 'larder food add' first.",
            arg
        )
        .into()),
    }
}

/// Resolve an item argument: item id on the active list, or a food name
/// whose item is on the active list.
fn resolve_item(
    sync: &ShoppingSync,
    inventory: &Inventory,
    arg: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    if sync.item(arg).is_some() {
        return Ok(arg.to_string());
    }
    let (food_id, name) = resolve_food(inventory, arg)?;
    match sync.find_by_food(&food_id) {
        Some(item) => Ok(item.id.clone()),
        None => Err(format!("'{}' is not on the active list", name).into()),
    }
}

fn print_lists(
    sync: &ShoppingSync,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "active": sync.active_list_id(),
                "lists": sync.lists(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            if sync.lists().is_empty() {
                println!("No shopping lists.");
                return Ok(());
            }
            println!("Shopping Lists");
            println!("{}", "=".repeat(44));
            for list in sync.lists() {
                let marker = if sync.active_list_id() == Some(list.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {:<25} {}", marker, list.name, list.id);
            }
        }
    }
    Ok(())
}

fn print_items(
    sync: &ShoppingSync,
    inventory: &Inventory,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let names: HashMap<&str, &str> = inventory
        .foods()
        .iter()
        .map(|f| (f.id.as_str(), f.name.as_str()))
        .collect();
    let list_name = sync.active_list().map(|l| l.name.as_str()).unwrap_or("-");

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "list": sync.active_list(),
                "items": sync.items().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            println!("Shopping List - {}", list_name);
            println!("{}", "=".repeat(44));

            let mut total = 0;
            let mut checked_count = 0;
            for item in sync.items() {
                total += 1;
                if item.checked {
                    checked_count += 1;
                }
                let check = if item.checked { "[x]" } else { "[ ]" };
                let name = names
                    .get(item.food_item_id.as_str())
                    .copied()
                    .unwrap_or(item.food_item_id.as_str());
                println!(
                    "{} {:<25} {}",
                    check,
                    name,
                    format_quantity(item.quantity)
                );
            }

            if total == 0 {
                println!("No items on this list.");
            } else {
                println!("{}", "-".repeat(44));
                println!("{} of {} items checked", checked_count, total);
            }
        }
    }
    Ok(())
}

/// Format a quantity, removing unnecessary decimal places.
pub(crate) fn format_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        format!("{:.1}", qty)
    }
}
