//! Live follow of the active shopping list.
//!
//! Keeps the push subscription open and prints every inbound change until
//! interrupted. The only long-running command, so it is also the only one
//! that installs the tracing subscriber.

use std::collections::HashMap;

use clap::Args;

use larder_core::{DataApi, ItemChange};
use tracing_subscriber::EnvFilter;

use super::{shopping_sync, AppContext};
use crate::config::Config;

#[derive(Args)]
pub struct WatchCommand {
    /// Follow this list instead of the remembered active list
    #[arg(long, short)]
    pub list: Option<String>,
}

impl WatchCommand {
    pub async fn run(
        &self,
        ctx: &AppContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();

        let mut sync = shopping_sync(ctx, config).await?;
        if let Some(list) = &self.list {
            let id = super::shopping::resolve_list(&sync, list)?;
            sync.select_list(&id).await?;
        }

        let Some(list) = sync.active_list() else {
            return Err("No active shopping list to watch".into());
        };
        println!("Watching '{}' (Ctrl-C to stop)", list.name);

        // Food names for readable change lines.
        let mut names: HashMap<String, String> = HashMap::new();
        for food in ctx
            .api
            .food_items(ctx.session.user_id(), ctx.session.household_id())
            .await?
        {
            names.insert(food.id, food.name);
        }

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("Stopped.");
                    break;
                }
                change = sync.next_change() => {
                    match change {
                        Some(change) => print_change(&change, &names),
                        None => {
                            tracing::warn!("push feed closed, exiting");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn print_change(change: &ItemChange, names: &HashMap<String, String>) {
    match change {
        ItemChange::Upsert(item) => {
            let name = names
                .get(&item.food_item_id)
                .map(String::as_str)
                .unwrap_or(item.food_item_id.as_str());
            let check = if item.checked { "[x]" } else { "[ ]" };
            println!("{} {:<25} {}", check, name, item.quantity);
        }
        ItemChange::Delete(id) => {
            println!("    removed item {}", id);
        }
    }
}
