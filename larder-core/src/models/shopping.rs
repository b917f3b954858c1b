//! Shopping lists and their items.
//!
//! Lists belong to a household; items reference food items from the
//! inventory. Both are created optimistically with temporary ids that the
//! server-assigned row replaces on confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::temp_id;

/// A shopping list shared within a household.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShoppingList {
    pub id: String,
    pub household_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShoppingList {
    /// Create a list record with a temporary id for optimistic insert.
    pub fn draft(household_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: temp_id(),
            household_id: household_id.into(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One row on a shopping list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShoppingListItem {
    pub id: String,
    pub list_id: String,
    pub food_item_id: String,
    pub quantity: f64,
    pub checked: bool,
    pub added_by: String,
    /// Set to the acting user when checking, cleared when unchecking.
    pub checked_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShoppingListItem {
    /// Create an item record with a temporary id for optimistic insert.
    pub fn draft(
        list_id: impl Into<String>,
        food_item_id: impl Into<String>,
        quantity: f64,
        added_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: temp_id(),
            list_id: list_id.into(),
            food_item_id: food_item_id.into(),
            quantity,
            checked: false,
            added_by: added_by.into(),
            checked_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Display for ShoppingListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.checked { "[x]" } else { "[ ]" };
        write!(f, "{} {} x{}", check, self.food_item_id, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::is_temp_id;

    #[test]
    fn test_draft_list_has_temp_id() {
        let list = ShoppingList::draft("h1", "Groceries");
        assert!(is_temp_id(&list.id));
        assert_eq!(list.household_id, "h1");
    }

    #[test]
    fn test_draft_item_is_unchecked() {
        let item = ShoppingListItem::draft("l1", "f1", 2.0, "u1");
        assert!(is_temp_id(&item.id));
        assert!(!item.checked);
        assert!(item.checked_by.is_none());
        assert_eq!(item.quantity, 2.0);
    }

    #[test]
    fn test_item_json_roundtrip() {
        let item = ShoppingListItem::draft("l1", "f1", 2.0, "u1");
        let json = serde_json::to_string(&item).unwrap();
        let parsed: ShoppingListItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
    }
}
