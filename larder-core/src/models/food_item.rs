use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::temp_id;

/// Free-form classification of an entry in the inventory.
///
/// Kept as an open string on the wire; this enum only canonicalizes the
/// three values the app proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    Food,
    Product,
    Dish,
}

impl fmt::Display for FoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodKind::Food => write!(f, "food"),
            FoodKind::Product => write!(f, "product"),
            FoodKind::Dish => write!(f, "dish"),
        }
    }
}

/// A food, product, or dish tracked by a user.
///
/// Owned by the creating user and mutated only by the owner. The `shared`
/// flag makes the row visible to the rest of the household; there is no
/// separate shared entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    pub id: String,
    pub user_id: String,
    pub household_id: String,
    pub shared: bool,
    pub name: String,
    pub rating: Option<i32>,
    /// Free-form type tag ("food", "product", "dish", or anything else).
    pub kind: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    /// Dietary markers such as "vegan" or "gluten-free".
    pub dietary: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FoodItem {
    /// Create a draft item with a temporary id, ready for optimistic insert.
    pub fn draft(
        name: impl Into<String>,
        user_id: impl Into<String>,
        household_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: temp_id(),
            user_id: user_id.into(),
            household_id: household_id.into(),
            shared: false,
            name: name.into(),
            rating: None,
            kind: None,
            category: None,
            notes: None,
            tags: Vec::new(),
            calories: None,
            protein: None,
            dietary: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_kind(mut self, kind: FoodKind) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// True if the item is visible to the given user: their own, or a
    /// shared item from the same household.
    pub fn visible_to(&self, user_id: &str, household_id: &str) -> bool {
        self.user_id == user_id || (self.shared && self.household_id == household_id)
    }
}

impl fmt::Display for FoodItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(rating) = self.rating {
            write!(f, " ({}/5)", rating)?;
        }
        if let Some(category) = &self.category {
            write!(f, " [{}]", category)?;
        }
        if self.shared {
            write!(f, " (shared)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::is_temp_id;

    #[test]
    fn test_draft_has_temp_id() {
        let item = FoodItem::draft("Oat milk", "u1", "h1");
        assert!(is_temp_id(&item.id));
        assert!(!item.shared);
    }

    #[test]
    fn test_visible_to_owner() {
        let item = FoodItem::draft("Oat milk", "u1", "h1");
        assert!(item.visible_to("u1", "h1"));
        assert!(!item.visible_to("u2", "h1"));
    }

    #[test]
    fn test_visible_to_household_when_shared() {
        let mut item = FoodItem::draft("Oat milk", "u1", "h1");
        item.shared = true;
        assert!(item.visible_to("u2", "h1"));
        assert!(!item.visible_to("u2", "h2"));
    }

    #[test]
    fn test_display() {
        let item = FoodItem::draft("Oat milk", "u1", "h1")
            .with_rating(4)
            .with_category("dairy-free");
        assert_eq!(format!("{}", item), "Oat milk (4/5) [dairy-free]");
    }

    #[test]
    fn test_json_roundtrip() {
        let item = FoodItem::draft("Oat milk", "u1", "h1")
            .with_kind(FoodKind::Product)
            .with_tags(vec!["breakfast".to_string()]);
        let json = serde_json::to_string(&item).unwrap();
        let parsed: FoodItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
        assert_eq!(parsed.kind.as_deref(), Some("product"));
    }
}
