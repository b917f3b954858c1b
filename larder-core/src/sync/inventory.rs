//! Food inventory hook.
//!
//! Caches the food items visible to the user (their own plus rows shared
//! within the household) and exposes owner-guarded CRUD with the same
//! optimistic/rollback shape as the shopping hook. View state (text
//! query, category, sort) is derived on demand and never stored remotely.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use crate::api::DataApi;
use crate::error::{ApiError, ApiResult};
use crate::ids::is_temp_id;
use crate::models::FoodItem;

/// Sort order for derived inventory views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoodSort {
    #[default]
    Name,
    Rating,
    Newest,
}

/// Derived-view parameters.
#[derive(Debug, Clone, Default)]
pub struct FoodFilter {
    /// Case-insensitive match against name, notes, and tags.
    pub query: Option<String>,
    pub category: Option<String>,
    pub sort: FoodSort,
}

/// Cached food-item collection with optimistic CRUD.
pub struct Inventory {
    api: Arc<dyn DataApi>,
    user_id: String,
    household_id: String,
    foods: Vec<FoodItem>,
    last_error: Option<String>,
}

impl Inventory {
    pub fn new(
        api: Arc<dyn DataApi>,
        user_id: impl Into<String>,
        household_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            household_id: household_id.into(),
            foods: Vec::new(),
            last_error: None,
        }
    }

    pub fn foods(&self) -> &[FoodItem] {
        &self.foods
    }

    pub fn food(&self, id: &str) -> Option<&FoodItem> {
        self.foods.iter().find(|f| f.id == id)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch every item visible to this user.
    pub async fn load(&mut self) -> ApiResult<()> {
        let fetched = self
            .api
            .food_items(&self.user_id, &self.household_id)
            .await;
        match fetched {
            Ok(foods) => {
                self.foods = foods;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Create a food item optimistically. Ownership fields are stamped
    /// from the session regardless of what the draft carries.
    pub async fn add(&mut self, mut draft: FoodItem) -> ApiResult<FoodItem> {
        draft.user_id = self.user_id.clone();
        draft.household_id = self.household_id.clone();
        if !is_temp_id(&draft.id) {
            return Err(self.fail(ApiError::Invalid(
                "new food items must carry a temporary id".to_string(),
            )));
        }
        let temp_id = draft.id.clone();
        let prior = self.foods.clone();
        self.foods.push(draft.clone());

        let api = Arc::clone(&self.api);
        let created = self
            .commit(prior, async move { api.create_food(&draft).await })
            .await?;

        match self.foods.iter_mut().find(|f| f.id == temp_id) {
            Some(slot) => *slot = created.clone(),
            None => self.foods.push(created.clone()),
        }
        Ok(created)
    }

    /// Replace an item's fields. Only the owner may mutate.
    pub async fn update(&mut self, mut updated: FoodItem) -> ApiResult<()> {
        self.ensure_owner(&updated.id)?;
        updated.updated_at = Utc::now();
        let prior = self.foods.clone();
        let Some(slot) = self.foods.iter_mut().find(|f| f.id == updated.id) else {
            return Err(self.fail(ApiError::NotFound(format!("food item {}", updated.id))));
        };
        *slot = updated.clone();

        let api = Arc::clone(&self.api);
        self.commit(prior, async move { api.update_food(&updated).await })
            .await?;
        Ok(())
    }

    /// Delete an item. Only the owner may mutate.
    pub async fn remove(&mut self, id: &str) -> ApiResult<()> {
        self.ensure_owner(id)?;
        let prior = self.foods.clone();
        self.foods.retain(|f| f.id != id);

        let api = Arc::clone(&self.api);
        let id = id.to_string();
        self.commit(prior, async move { api.delete_food(&id).await })
            .await?;
        Ok(())
    }

    /// Toggle household visibility of an owned item.
    pub async fn set_shared(&mut self, id: &str, shared: bool) -> ApiResult<()> {
        self.ensure_owner(id)?;
        let Some(item) = self.food(id) else {
            return Err(self.fail(ApiError::NotFound(format!("food item {}", id))));
        };
        let mut updated = item.clone();
        updated.shared = shared;
        self.update(updated).await
    }

    /// Derived view: filter and sort without touching the cache.
    pub fn filtered(&self, filter: &FoodFilter) -> Vec<&FoodItem> {
        let query = filter.query.as_deref().map(str::to_lowercase);
        let category = filter.category.as_deref().map(str::to_lowercase);

        let mut view: Vec<&FoodItem> = self
            .foods
            .iter()
            .filter(|f| {
                if let Some(q) = &query {
                    let hit = f.name.to_lowercase().contains(q)
                        || f.notes
                            .as_deref()
                            .is_some_and(|n| n.to_lowercase().contains(q))
                        || f.tags.iter().any(|t| t.to_lowercase().contains(q));
                    if !hit {
                        return false;
                    }
                }
                if let Some(c) = &category {
                    if f.category.as_deref().map(str::to_lowercase).as_deref() != Some(c) {
                        return false;
                    }
                }
                true
            })
            .collect();

        match filter.sort {
            FoodSort::Name => {
                view.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            }
            FoodSort::Rating => {
                // Highest first, unrated last.
                view.sort_by(|a, b| b.rating.unwrap_or(i32::MIN).cmp(&a.rating.unwrap_or(i32::MIN)))
            }
            FoodSort::Newest => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        view
    }

    fn ensure_owner(&mut self, id: &str) -> ApiResult<()> {
        let owned = self
            .foods
            .iter()
            .find(|f| f.id == id)
            .map_or(true, |f| f.user_id == self.user_id);
        if owned {
            Ok(())
        } else {
            Err(self.fail(ApiError::Invalid(format!(
                "only the owner can modify food item {}",
                id
            ))))
        }
    }

    async fn commit<T, F>(&mut self, prior: Vec<FoodItem>, remote: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        match remote.await {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(e) => {
                self.foods = prior;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn fail(&mut self, e: ApiError) -> ApiError {
        self.last_error = Some(e.to_string());
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testutil::MemoryApi;

    fn inventory(api: &Arc<MemoryApi>) -> Inventory {
        Inventory::new(Arc::clone(api) as Arc<dyn DataApi>, "u1", "h1")
    }

    #[tokio::test]
    async fn test_load_filters_to_visible_items() {
        let api = MemoryApi::new();
        let mut own = FoodItem::draft("Oat milk", "u1", "h1");
        own.id = "f1".to_string();
        api.seed_food(own);
        let mut shared = FoodItem::draft("Sourdough", "u2", "h1");
        shared.id = "f2".to_string();
        shared.shared = true;
        api.seed_food(shared);
        let mut private = FoodItem::draft("Secret snack", "u2", "h1");
        private.id = "f3".to_string();
        api.seed_food(private);

        let mut inv = inventory(&api);
        inv.load().await.unwrap();

        let names: Vec<_> = inv.foods().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Oat milk", "Sourdough"]);
    }

    #[tokio::test]
    async fn test_add_reconciles_temp_id() {
        let api = MemoryApi::new();
        let mut inv = inventory(&api);
        inv.load().await.unwrap();

        let created = inv
            .add(FoodItem::draft("Oat milk", "ignored", "ignored"))
            .await
            .unwrap();

        assert!(!is_temp_id(&created.id));
        assert_eq!(inv.foods().len(), 1);
        assert_eq!(inv.foods()[0].user_id, "u1");
        assert_eq!(inv.foods()[0].household_id, "h1");
    }

    #[tokio::test]
    async fn test_add_failure_rolls_back() {
        let api = MemoryApi::new();
        let mut inv = inventory(&api);
        inv.load().await.unwrap();

        api.fail_next("boom");
        assert!(inv.add(FoodItem::draft("Oat milk", "u1", "h1")).await.is_err());

        assert!(inv.foods().is_empty());
        assert!(inv.last_error().is_some());
    }

    #[tokio::test]
    async fn test_update_rejected_for_non_owner() {
        let api = MemoryApi::new();
        let mut theirs = FoodItem::draft("Sourdough", "u2", "h1");
        theirs.id = "f2".to_string();
        theirs.shared = true;
        api.seed_food(theirs.clone());

        let mut inv = inventory(&api);
        inv.load().await.unwrap();

        theirs.name = "Rye".to_string();
        let err = inv.update(theirs).await.unwrap_err();
        assert!(matches!(err, ApiError::Invalid(_)));
        assert_eq!(inv.foods()[0].name, "Sourdough");
    }

    #[tokio::test]
    async fn test_set_shared_flips_flag_remotely() {
        let api = MemoryApi::new();
        let mut own = FoodItem::draft("Oat milk", "u1", "h1");
        own.id = "f1".to_string();
        api.seed_food(own);

        let mut inv = inventory(&api);
        inv.load().await.unwrap();
        inv.set_shared("f1", true).await.unwrap();

        assert!(inv.food("f1").unwrap().shared);
        assert!(api.calls().iter().any(|c| c == "update_food:f1"));
    }

    #[tokio::test]
    async fn test_remove_failure_restores_item() {
        let api = MemoryApi::new();
        let mut own = FoodItem::draft("Oat milk", "u1", "h1");
        own.id = "f1".to_string();
        api.seed_food(own);

        let mut inv = inventory(&api);
        inv.load().await.unwrap();

        api.fail_next("boom");
        assert!(inv.remove("f1").await.is_err());
        assert_eq!(inv.foods().len(), 1);
    }

    #[tokio::test]
    async fn test_filtered_query_and_sort() {
        let api = MemoryApi::new();
        let mut inv = inventory(&api);

        let mut a = FoodItem::draft("Bananas", "u1", "h1").with_rating(3);
        a.id = "f1".to_string();
        let mut b = FoodItem::draft("Apple pie", "u1", "h1").with_rating(5);
        b.id = "f2".to_string();
        b.tags = vec!["dessert".to_string()];
        let mut c = FoodItem::draft("apples", "u1", "h1");
        c.id = "f3".to_string();
        inv.foods = vec![a, b, c];

        let by_name = inv.filtered(&FoodFilter {
            query: Some("apple".to_string()),
            ..FoodFilter::default()
        });
        let names: Vec<_> = by_name.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Apple pie", "apples"]);

        let by_rating = inv.filtered(&FoodFilter {
            sort: FoodSort::Rating,
            ..FoodFilter::default()
        });
        let names: Vec<_> = by_rating.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Apple pie", "Bananas", "apples"]);

        let by_tag = inv.filtered(&FoodFilter {
            query: Some("dessert".to_string()),
            ..FoodFilter::default()
        });
        assert_eq!(by_tag.len(), 1);
    }

    #[tokio::test]
    async fn test_filtered_category() {
        let api = MemoryApi::new();
        let mut inv = inventory(&api);
        let mut a = FoodItem::draft("Bananas", "u1", "h1").with_category("Fruit");
        a.id = "f1".to_string();
        let mut b = FoodItem::draft("Cheddar", "u1", "h1").with_category("Dairy");
        b.id = "f2".to_string();
        inv.foods = vec![a, b];

        let dairy = inv.filtered(&FoodFilter {
            category: Some("dairy".to_string()),
            ..FoodFilter::default()
        });
        let names: Vec<_> = dairy.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Cheddar"]);
    }
}
