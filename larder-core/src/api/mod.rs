//! Backend row-CRUD port.
//!
//! The hosted data platform exposes tables as JSON rows. `DataApi` is the
//! seam the sync hooks talk through; [`RestApi`] is the HTTP implementation
//! and tests inject in-memory fakes.

mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::models::{FoodItem, Household, Receipt, ShoppingList, ShoppingListItem, UserProfile};

pub use rest::RestApi;

/// Fields for creating a shopping list item row.
#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
    pub list_id: String,
    pub food_item_id: String,
    pub quantity: f64,
    pub added_by: String,
}

/// Partial update of a shopping list item row.
///
/// `checked_by` uses a double option: absent means "leave alone",
/// `Some(None)` writes an explicit null.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_by: Option<Option<String>>,
}

impl ItemPatch {
    pub fn quantity(quantity: f64) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    pub fn checked(checked: bool, checked_by: Option<String>) -> Self {
        Self {
            checked: Some(checked),
            checked_by: Some(checked_by),
            ..Self::default()
        }
    }
}

/// Fields for creating a receipt row with its nested line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReceipt {
    pub household_id: String,
    pub user_id: String,
    pub store_name: String,
    pub purchased_at: Option<chrono::DateTime<chrono::Utc>>,
    pub total: Option<f64>,
    pub items: Vec<NewReceiptItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReceiptItem {
    pub name: String,
    pub quantity: f64,
    pub price: Option<f64>,
    pub food_item_id: Option<String>,
}

/// Typed row CRUD over the hosted backend.
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Profile of the authenticated user.
    async fn profile(&self) -> ApiResult<UserProfile>;

    /// Household record by id.
    async fn household(&self, id: &str) -> ApiResult<Household>;

    /// All shopping lists for a household.
    async fn lists(&self, household_id: &str) -> ApiResult<Vec<ShoppingList>>;

    /// Create a list and return the server row.
    async fn create_list(&self, household_id: &str, name: &str) -> ApiResult<ShoppingList>;

    async fn delete_list(&self, id: &str) -> ApiResult<()>;

    /// All items on a list.
    async fn items(&self, list_id: &str) -> ApiResult<Vec<ShoppingListItem>>;

    /// Create an item and return the server row.
    async fn create_item(&self, item: &NewItem) -> ApiResult<ShoppingListItem>;

    async fn update_item(&self, id: &str, patch: &ItemPatch) -> ApiResult<()>;

    async fn delete_item(&self, id: &str) -> ApiResult<()>;

    /// Batch delete; one request for all ids.
    async fn delete_items(&self, ids: &[String]) -> ApiResult<()>;

    /// Food items visible to a user: their own plus household-shared rows.
    async fn food_items(&self, user_id: &str, household_id: &str) -> ApiResult<Vec<FoodItem>>;

    /// Create a food item and return the server row.
    async fn create_food(&self, item: &FoodItem) -> ApiResult<FoodItem>;

    async fn update_food(&self, item: &FoodItem) -> ApiResult<()>;

    async fn delete_food(&self, id: &str) -> ApiResult<()>;

    /// Receipts for a household, newest first, with nested line items.
    async fn receipts(&self, household_id: &str) -> ApiResult<Vec<Receipt>>;

    /// Create a receipt with its line items and return the server rows.
    async fn create_receipt(&self, receipt: &NewReceipt) -> ApiResult<Receipt>;
}
