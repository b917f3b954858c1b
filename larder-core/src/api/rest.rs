//! HTTP implementation of [`DataApi`] against the hosted data platform.
//!
//! Rows are exchanged as JSON through the platform's REST surface:
//! `GET /rest/v1/<table>?<col>=eq.<value>`, bearer auth plus an `apikey`
//! header, and `Prefer: return=representation` on inserts so the
//! server-assigned row comes back in the response.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{FoodItem, Household, Receipt, ShoppingList, ShoppingListItem, UserProfile};

use super::{DataApi, ItemPatch, NewItem, NewReceipt};

const LISTS_TABLE: &str = "shopping_lists";
const ITEMS_TABLE: &str = "shopping_list_items";
const FOODS_TABLE: &str = "food_items";
const HOUSEHOLDS_TABLE: &str = "households";
const PROFILES_TABLE: &str = "user_profiles";
const RECEIPTS_TABLE: &str = "receipts";

/// REST client for the hosted backend.
#[derive(Debug, Clone)]
pub struct RestApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: String,
}

impl RestApi {
    /// Creates a client for the given project url, anon key, and user token.
    pub fn new(base_url: &str, api_key: &str, access_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> String {
        let mut url = format!("{}/rest/v1/{}", self.base_url, table);
        if !filters.is_empty() {
            url.push('?');
            url.push_str(&filter_query(filters));
        }
        url
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.access_token))
    }

    async fn ensure_ok(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        let url = self.table_url(table, filters);
        let response = self
            .authed(self.http.get(&url))
            .send()
            .await
            .map_err(ApiError::request)?;
        let response = Self::ensure_ok(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Fetch rows and require exactly one.
    async fn get_row<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> ApiResult<T> {
        let mut rows = self.get_rows::<T>(table, filters).await?;
        if rows.is_empty() {
            return Err(ApiError::NotFound(table.to_string()));
        }
        Ok(rows.remove(0))
    }

    async fn insert_row<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.table_url(table, &[]);
        let response = self
            .authed(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(ApiError::request)?;
        let response = Self::ensure_ok(response).await?;
        let mut rows = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        if rows.is_empty() {
            return Err(ApiError::Decode(format!(
                "insert into {} returned no rows",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    async fn patch_row<B: Serialize>(&self, table: &str, id: &str, body: &B) -> ApiResult<()> {
        let url = self.table_url(table, &[("id", eq(id))]);
        let response = self
            .authed(self.http.patch(&url))
            .json(body)
            .send()
            .await
            .map_err(ApiError::request)?;
        Self::ensure_ok(response).await?;
        Ok(())
    }

    async fn delete_rows(&self, table: &str, filters: &[(&str, String)]) -> ApiResult<()> {
        let url = self.table_url(table, filters);
        let response = self
            .authed(self.http.delete(&url))
            .send()
            .await
            .map_err(ApiError::request)?;
        Self::ensure_ok(response).await?;
        Ok(())
    }
}

/// Build the query string for a set of column filters.
fn filter_query(filters: &[(&str, String)]) -> String {
    filters
        .iter()
        .map(|(col, value)| format!("{}={}", col, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

fn id_in(ids: &[String]) -> String {
    format!("in.({})", ids.join(","))
}

/// Insert body for a food item; the server assigns id and timestamps.
#[derive(Serialize)]
struct FoodInsert<'a> {
    user_id: &'a str,
    household_id: &'a str,
    shared: bool,
    name: &'a str,
    rating: Option<i32>,
    kind: &'a Option<String>,
    category: &'a Option<String>,
    notes: &'a Option<String>,
    tags: &'a [String],
    calories: Option<f64>,
    protein: Option<f64>,
    dietary: &'a [String],
}

impl<'a> From<&'a FoodItem> for FoodInsert<'a> {
    fn from(item: &'a FoodItem) -> Self {
        Self {
            user_id: &item.user_id,
            household_id: &item.household_id,
            shared: item.shared,
            name: &item.name,
            rating: item.rating,
            kind: &item.kind,
            category: &item.category,
            notes: &item.notes,
            tags: &item.tags,
            calories: item.calories,
            protein: item.protein,
            dietary: &item.dietary,
        }
    }
}

#[async_trait]
impl DataApi for RestApi {
    async fn profile(&self) -> ApiResult<UserProfile> {
        // Row-level security scopes the table to the authenticated user.
        self.get_row(PROFILES_TABLE, &[]).await
    }

    async fn household(&self, id: &str) -> ApiResult<Household> {
        self.get_row(HOUSEHOLDS_TABLE, &[("id", eq(id))]).await
    }

    async fn lists(&self, household_id: &str) -> ApiResult<Vec<ShoppingList>> {
        self.get_rows(
            LISTS_TABLE,
            &[
                ("household_id", eq(household_id)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn create_list(&self, household_id: &str, name: &str) -> ApiResult<ShoppingList> {
        #[derive(Serialize)]
        struct Body<'a> {
            household_id: &'a str,
            name: &'a str,
        }
        self.insert_row(LISTS_TABLE, &Body { household_id, name })
            .await
    }

    async fn delete_list(&self, id: &str) -> ApiResult<()> {
        self.delete_rows(LISTS_TABLE, &[("id", eq(id))]).await
    }

    async fn items(&self, list_id: &str) -> ApiResult<Vec<ShoppingListItem>> {
        self.get_rows(
            ITEMS_TABLE,
            &[
                ("list_id", eq(list_id)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn create_item(&self, item: &NewItem) -> ApiResult<ShoppingListItem> {
        self.insert_row(ITEMS_TABLE, item).await
    }

    async fn update_item(&self, id: &str, patch: &ItemPatch) -> ApiResult<()> {
        self.patch_row(ITEMS_TABLE, id, patch).await
    }

    async fn delete_item(&self, id: &str) -> ApiResult<()> {
        self.delete_rows(ITEMS_TABLE, &[("id", eq(id))]).await
    }

    async fn delete_items(&self, ids: &[String]) -> ApiResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.delete_rows(ITEMS_TABLE, &[("id", id_in(ids))]).await
    }

    async fn food_items(&self, user_id: &str, household_id: &str) -> ApiResult<Vec<FoodItem>> {
        let visibility = format!(
            "(user_id.eq.{},and(household_id.eq.{},shared.eq.true))",
            user_id, household_id
        );
        self.get_rows(FOODS_TABLE, &[("or", visibility)]).await
    }

    async fn create_food(&self, item: &FoodItem) -> ApiResult<FoodItem> {
        self.insert_row(FOODS_TABLE, &FoodInsert::from(item)).await
    }

    async fn update_food(&self, item: &FoodItem) -> ApiResult<()> {
        self.patch_row(FOODS_TABLE, &item.id, &FoodInsert::from(item))
            .await
    }

    async fn delete_food(&self, id: &str) -> ApiResult<()> {
        self.delete_rows(FOODS_TABLE, &[("id", eq(id))]).await
    }

    async fn receipts(&self, household_id: &str) -> ApiResult<Vec<Receipt>> {
        self.get_rows(
            RECEIPTS_TABLE,
            &[
                ("household_id", eq(household_id)),
                ("select", "*,items:receipt_items(*)".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn create_receipt(&self, receipt: &NewReceipt) -> ApiResult<Receipt> {
        self.insert_row(RECEIPTS_TABLE, receipt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> RestApi {
        RestApi::new("https://db.example.com/", "anon-key", "user-token")
    }

    #[test]
    fn test_table_url_without_filters() {
        assert_eq!(
            api().table_url("shopping_lists", &[]),
            "https://db.example.com/rest/v1/shopping_lists"
        );
    }

    #[test]
    fn test_table_url_with_filters() {
        let url = api().table_url("shopping_list_items", &[("list_id", eq("l1"))]);
        assert_eq!(
            url,
            "https://db.example.com/rest/v1/shopping_list_items?list_id=eq.l1"
        );
    }

    #[test]
    fn test_filter_values_are_encoded() {
        let url = api().table_url("shopping_lists", &[("name", eq("weekly run"))]);
        assert_eq!(
            url,
            "https://db.example.com/rest/v1/shopping_lists?name=eq.weekly%20run"
        );
    }

    #[test]
    fn test_id_in_filter() {
        assert_eq!(
            id_in(&["a".to_string(), "b".to_string(), "c".to_string()]),
            "in.(a,b,c)"
        );
    }

    #[test]
    fn test_item_patch_skips_absent_fields() {
        let patch = ItemPatch::quantity(3.0);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "quantity": 3.0 }));
    }

    #[test]
    fn test_item_patch_writes_explicit_null_checked_by() {
        let patch = ItemPatch::checked(false, None);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "checked": false, "checked_by": null })
        );
    }
}
