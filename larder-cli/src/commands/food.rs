//! Food inventory CLI commands.
//!
//! Manage the user's foods, products, and dishes, including household
//! sharing and assistant-backed search.

use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};

use larder_core::{FoodFilter, FoodItem, FoodKind, FoodSort, Inventory};

use super::{assistant, slot_err, AppContext, OutputFormat};
use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum SortArg {
    #[default]
    Name,
    Rating,
    Newest,
}

impl From<&SortArg> for FoodSort {
    fn from(arg: &SortArg) -> Self {
        match arg {
            SortArg::Name => FoodSort::Name,
            SortArg::Rating => FoodSort::Rating,
            SortArg::Newest => FoodSort::Newest,
        }
    }
}

#[derive(Clone, ValueEnum)]
pub enum KindArg {
    Food,
    Product,
    Dish,
}

impl From<&KindArg> for FoodKind {
    fn from(arg: &KindArg) -> Self {
        match arg {
            KindArg::Food => FoodKind::Food,
            KindArg::Product => FoodKind::Product,
            KindArg::Dish => FoodKind::Dish,
        }
    }
}

#[derive(Args)]
pub struct FoodCommand {
    #[command(subcommand)]
    pub command: FoodSubcommand,
}

#[derive(Subcommand)]
pub enum FoodSubcommand {
    /// List visible food items (own plus household-shared)
    List {
        /// Filter by category
        #[arg(long, short)]
        category: Option<String>,

        /// Text filter against name, notes, and tags
        #[arg(long, short)]
        query: Option<String>,

        /// Sort order
        #[arg(long, short, value_enum, default_value = "name")]
        sort: SortArg,

        /// Output format
        #[arg(long, short, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one food item in full
    Show {
        /// Item id or name
        item: String,
    },

    /// Add a food item
    Add {
        /// Item name
        name: String,

        /// Kind of entry
        #[arg(long, short, value_enum)]
        kind: Option<KindArg>,

        /// Category (e.g., "dairy", "produce")
        #[arg(long, short)]
        category: Option<String>,

        /// Rating from 1 to 5
        #[arg(long, short)]
        rating: Option<i32>,

        /// Free-form notes
        #[arg(long, short)]
        notes: Option<String>,

        /// Comma-separated tags
        #[arg(long, short, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Edit a food item you own
    Edit {
        /// Item id or name
        item: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New category
        #[arg(long, short)]
        category: Option<String>,

        /// New rating from 1 to 5
        #[arg(long, short)]
        rating: Option<i32>,

        /// New notes
        #[arg(long, short)]
        notes: Option<String>,
    },

    /// Delete a food item you own
    Remove {
        /// Item id or name
        item: String,
    },

    /// Make an item visible to the whole household
    Share {
        /// Item id or name
        item: String,
    },

    /// Make an item private again
    Unshare {
        /// Item id or name
        item: String,
    },

    /// Natural-language search over your food items
    Search {
        /// What you are looking for
        query: String,
    },
}

impl FoodCommand {
    pub async fn run(
        &self,
        ctx: &AppContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut inventory = Inventory::new(
            Arc::clone(&ctx.api),
            ctx.session.user_id(),
            ctx.session.household_id(),
        );
        inventory.load().await?;

        match &self.command {
            FoodSubcommand::List {
                category,
                query,
                sort,
                format,
            } => {
                let filter = FoodFilter {
                    query: query.clone(),
                    category: category.clone(),
                    sort: sort.into(),
                };
                let foods = inventory.filtered(&filter);
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&foods)?);
                    }
                    OutputFormat::Table => {
                        if foods.is_empty() {
                            println!("No food items.");
                            return Ok(());
                        }
                        println!("Food Items");
                        println!("{}", "=".repeat(60));
                        for food in foods {
                            let shared = if food.shared { "shared" } else { "" };
                            println!(
                                "{:<25} {:<12} {:<8} {}",
                                food.name,
                                food.category.as_deref().unwrap_or("-"),
                                rating_display(food.rating),
                                shared
                            );
                        }
                    }
                }
                Ok(())
            }

            FoodSubcommand::Show { item } => {
                let food = resolve(&inventory, item)?;
                println!("{}", food.name);
                println!("{}", "=".repeat(44));
                println!("id:       {}", food.id);
                println!("kind:     {}", food.kind.as_deref().unwrap_or("-"));
                println!("category: {}", food.category.as_deref().unwrap_or("-"));
                println!("rating:   {}", rating_display(food.rating));
                println!("shared:   {}", if food.shared { "yes" } else { "no" });
                if !food.tags.is_empty() {
                    println!("tags:     {}", food.tags.join(", "));
                }
                if let Some(calories) = food.calories {
                    println!("calories: {}", calories);
                }
                if let Some(protein) = food.protein {
                    println!("protein:  {}g", protein);
                }
                if !food.dietary.is_empty() {
                    println!("dietary:  {}", food.dietary.join(", "));
                }
                if let Some(notes) = &food.notes {
                    println!("\n{}", notes);
                }
                Ok(())
            }

            FoodSubcommand::Add {
                name,
                kind,
                category,
                rating,
                notes,
                tags,
            } => {
                let mut draft = FoodItem::draft(
                    name,
                    ctx.session.user_id(),
                    ctx.session.household_id(),
                );
                if let Some(kind) = kind {
                    draft = draft.with_kind(kind.into());
                }
                if let Some(category) = category {
                    draft = draft.with_category(category);
                }
                if let Some(rating) = rating {
                    validate_rating(*rating)?;
                    draft = draft.with_rating(*rating);
                }
                if let Some(notes) = notes {
                    draft = draft.with_notes(notes);
                }
                if !tags.is_empty() {
                    draft = draft.with_tags(tags.clone());
                }

                let food = inventory
                    .add(draft)
                    .await
                    .map_err(|e| slot_err(inventory.last_error(), e))?;
                println!("Added '{}' ({})", food.name, food.id);
                Ok(())
            }

            FoodSubcommand::Edit {
                item,
                name,
                category,
                rating,
                notes,
            } => {
                let mut updated = resolve(&inventory, item)?;
                if let Some(name) = name {
                    updated.name = name.clone();
                }
                if let Some(category) = category {
                    updated.category = Some(category.clone());
                }
                if let Some(rating) = rating {
                    validate_rating(*rating)?;
                    updated.rating = Some(*rating);
                }
                if let Some(notes) = notes {
                    updated.notes = Some(notes.clone());
                }
                let display = updated.name.clone();
                inventory
                    .update(updated)
                    .await
                    .map_err(|e| slot_err(inventory.last_error(), e))?;
                println!("Updated '{}'", display);
                Ok(())
            }

            FoodSubcommand::Remove { item } => {
                let food = resolve(&inventory, item)?;
                inventory
                    .remove(&food.id)
                    .await
                    .map_err(|e| slot_err(inventory.last_error(), e))?;
                println!("Removed '{}'", food.name);
                Ok(())
            }

            FoodSubcommand::Share { item } => {
                let food = resolve(&inventory, item)?;
                inventory
                    .set_shared(&food.id, true)
                    .await
                    .map_err(|e| slot_err(inventory.last_error(), e))?;
                println!("'{}' is now shared with the household", food.name);
                Ok(())
            }

            FoodSubcommand::Unshare { item } => {
                let food = resolve(&inventory, item)?;
                inventory
                    .set_shared(&food.id, false)
                    .await
                    .map_err(|e| slot_err(inventory.last_error(), e))?;
                println!("'{}' is now private", food.name);
                Ok(())
            }

            FoodSubcommand::Search { query } => {
                let assistant = assistant(config)?;
                let names: Vec<String> =
                    inventory.foods().iter().map(|f| f.name.clone()).collect();
                if names.is_empty() {
                    println!("No food items to search.");
                    return Ok(());
                }
                let matches = assistant.search(query, &names).await?;
                if matches.is_empty() {
                    println!("No matches for '{}'", query);
                } else {
                    for name in matches {
                        println!("{}", name);
                    }
                }
                Ok(())
            }
        }
    }
}

/// Resolve an item argument: exact id first, then case-insensitive name.
/// Returns a clone so the caller can mutate it freely.
fn resolve(inventory: &Inventory, arg: &str) -> Result<FoodItem, Box<dyn std::error::Error>> {
    if let Some(food) = inventory.food(arg) {
        return Ok(food.clone());
    }
    let lowered = arg.to_lowercase();
    let mut matches = inventory
        .foods()
        .iter()
        .filter(|f| f.name.to_lowercase() == lowered);
    match (matches.next(), matches.next()) {
        (Some(food), None) => Ok(food.clone()),
        (Some(_), Some(_)) => Err(format!(
            "'{}' matches more than one food item, use the item id",
            arg
        )
        .into()),
        (None, _) => Err(format!("No food item named '{}'", arg).into()),
    }
}

fn validate_rating(rating: i32) -> Result<(), Box<dyn std::error::Error>> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(format!("Rating must be between 1 and 5, got {}", rating).into())
    }
}

fn rating_display(rating: Option<i32>) -> String {
    match rating {
        Some(r) => format!("{}/5", r),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_rating_display() {
        assert_eq!(rating_display(Some(4)), "4/5");
        assert_eq!(rating_display(None), "-");
    }
}
