//! In-memory fakes for hook tests.
//!
//! `MemoryApi` plays the backend with scripted failures and a call log;
//! `MemoryChannel` plays the push channel, recording subscription
//! lifecycle events and letting tests inject row changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use crate::api::{DataApi, ItemPatch, NewItem, NewReceipt};
use crate::assistant::{Assistant, ParsedReceipt};
use crate::error::{ApiError, ApiResult};
use crate::ids::is_temp_id;
use crate::models::{
    FoodItem, Household, Receipt, ReceiptItem, ShoppingList, ShoppingListItem, UserProfile,
};
use crate::realtime::{ItemChange, ItemFeed, PushChannel};

pub struct MemoryApi {
    state: Mutex<ApiState>,
}

struct ApiState {
    next_id: u64,
    /// One-shot failure script: the next call whose name starts with the
    /// prefix fails with the message.
    fail_on: Option<(String, String)>,
    lists: Vec<ShoppingList>,
    items: Vec<ShoppingListItem>,
    foods: Vec<FoodItem>,
    receipts: Vec<Receipt>,
    calls: Vec<String>,
}

impl MemoryApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ApiState {
                next_id: 1,
                fail_on: None,
                lists: Vec::new(),
                items: Vec::new(),
                foods: Vec::new(),
                receipts: Vec::new(),
                calls: Vec::new(),
            }),
        })
    }

    /// Make the next API call fail with the given message.
    pub fn fail_next(&self, message: &str) {
        self.fail_on("", message);
    }

    /// Make the next API call whose name starts with `prefix` fail.
    pub fn fail_on(&self, prefix: &str, message: &str) {
        self.state.lock().unwrap().fail_on =
            Some((prefix.to_string(), message.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn seed_list(&self, id: &str, name: &str) {
        let now = Utc::now();
        self.state.lock().unwrap().lists.push(ShoppingList {
            id: id.to_string(),
            household_id: "h1".to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        });
    }

    pub fn seed_item(&self, id: &str, list_id: &str, food_item_id: &str, quantity: f64) {
        let now = Utc::now();
        self.state.lock().unwrap().items.push(ShoppingListItem {
            id: id.to_string(),
            list_id: list_id.to_string(),
            food_item_id: food_item_id.to_string(),
            quantity,
            checked: false,
            added_by: "u1".to_string(),
            checked_by: None,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn seed_food(&self, food: FoodItem) {
        self.state.lock().unwrap().foods.push(food);
    }

    pub fn server_items(&self, list_id: &str) -> Vec<ShoppingListItem> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|i| i.list_id == list_id)
            .cloned()
            .collect()
    }

    pub fn server_lists(&self) -> Vec<ShoppingList> {
        self.state.lock().unwrap().lists.clone()
    }
}

impl ApiState {
    fn begin(&mut self, call: String) -> ApiResult<()> {
        let matched = self
            .fail_on
            .as_ref()
            .is_some_and(|(prefix, _)| call.starts_with(prefix.as_str()));
        self.calls.push(call);
        if matched {
            let (_, message) = self.fail_on.take().unwrap_or_default();
            return Err(ApiError::Request(message));
        }
        Ok(())
    }

    fn assign_id(&mut self) -> String {
        let id = format!("srv-{}", self.next_id);
        self.next_id += 1;
        id
    }
}

#[async_trait]
impl DataApi for MemoryApi {
    async fn profile(&self) -> ApiResult<UserProfile> {
        let mut state = self.state.lock().unwrap();
        state.begin("profile".to_string())?;
        Ok(UserProfile {
            id: "u1".to_string(),
            household_id: "h1".to_string(),
            display_name: "Test User".to_string(),
            email: None,
            created_at: Utc::now(),
        })
    }

    async fn household(&self, id: &str) -> ApiResult<Household> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("household:{}", id))?;
        Ok(Household {
            id: id.to_string(),
            name: "Test Household".to_string(),
            created_at: Utc::now(),
        })
    }

    async fn lists(&self, household_id: &str) -> ApiResult<Vec<ShoppingList>> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("lists:{}", household_id))?;
        Ok(state
            .lists
            .iter()
            .filter(|l| l.household_id == household_id)
            .cloned()
            .collect())
    }

    async fn create_list(&self, household_id: &str, name: &str) -> ApiResult<ShoppingList> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("create_list:{}", name))?;
        let now = Utc::now();
        let list = ShoppingList {
            id: state.assign_id(),
            household_id: household_id.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.lists.push(list.clone());
        Ok(list)
    }

    async fn delete_list(&self, id: &str) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("delete_list:{}", id))?;
        state.lists.retain(|l| l.id != id);
        state.items.retain(|i| i.list_id != id);
        Ok(())
    }

    async fn items(&self, list_id: &str) -> ApiResult<Vec<ShoppingListItem>> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("items:{}", list_id))?;
        Ok(state
            .items
            .iter()
            .filter(|i| i.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn create_item(&self, item: &NewItem) -> ApiResult<ShoppingListItem> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("create_item:{}", item.food_item_id))?;
        let now = Utc::now();
        let row = ShoppingListItem {
            id: state.assign_id(),
            list_id: item.list_id.clone(),
            food_item_id: item.food_item_id.clone(),
            quantity: item.quantity,
            checked: false,
            added_by: item.added_by.clone(),
            checked_by: None,
            created_at: now,
            updated_at: now,
        };
        state.items.push(row.clone());
        Ok(row)
    }

    async fn update_item(&self, id: &str, patch: &ItemPatch) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("update_item:{}", id))?;
        let Some(row) = state.items.iter_mut().find(|i| i.id == id) else {
            return Err(ApiError::NotFound(id.to_string()));
        };
        if let Some(quantity) = patch.quantity {
            row.quantity = quantity;
        }
        if let Some(checked) = patch.checked {
            row.checked = checked;
        }
        if let Some(checked_by) = &patch.checked_by {
            row.checked_by = checked_by.clone();
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("delete_item:{}", id))?;
        state.items.retain(|i| i.id != id);
        Ok(())
    }

    async fn delete_items(&self, ids: &[String]) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("delete_items:{}", ids.join(",")))?;
        state.items.retain(|i| !ids.contains(&i.id));
        Ok(())
    }

    async fn food_items(&self, user_id: &str, household_id: &str) -> ApiResult<Vec<FoodItem>> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("food_items:{}", user_id))?;
        Ok(state
            .foods
            .iter()
            .filter(|f| f.visible_to(user_id, household_id))
            .cloned()
            .collect())
    }

    async fn create_food(&self, item: &FoodItem) -> ApiResult<FoodItem> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("create_food:{}", item.name))?;
        let mut row = item.clone();
        row.id = state.assign_id();
        row.created_at = Utc::now();
        row.updated_at = row.created_at;
        state.foods.push(row.clone());
        Ok(row)
    }

    async fn update_food(&self, item: &FoodItem) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("update_food:{}", item.id))?;
        let Some(row) = state.foods.iter_mut().find(|f| f.id == item.id) else {
            return Err(ApiError::NotFound(item.id.clone()));
        };
        *row = item.clone();
        Ok(())
    }

    async fn delete_food(&self, id: &str) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("delete_food:{}", id))?;
        state.foods.retain(|f| f.id != id);
        Ok(())
    }

    async fn receipts(&self, household_id: &str) -> ApiResult<Vec<Receipt>> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("receipts:{}", household_id))?;
        Ok(state
            .receipts
            .iter()
            .filter(|r| r.household_id == household_id)
            .cloned()
            .collect())
    }

    async fn create_receipt(&self, receipt: &NewReceipt) -> ApiResult<Receipt> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("create_receipt:{}", receipt.store_name))?;
        let id = state.assign_id();
        let row = Receipt {
            id: id.clone(),
            household_id: receipt.household_id.clone(),
            user_id: receipt.user_id.clone(),
            store_name: receipt.store_name.clone(),
            purchased_at: receipt.purchased_at,
            total: receipt.total,
            items: receipt
                .items
                .iter()
                .map(|line| ReceiptItem {
                    id: state.assign_id(),
                    receipt_id: id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    price: line.price,
                    food_item_id: line.food_item_id.clone(),
                })
                .collect(),
            created_at: Utc::now(),
        };
        state.receipts.push(row.clone());
        Ok(row)
    }
}

/// Push channel fake recording subscription lifecycle in order.
pub struct MemoryChannel {
    log: Arc<Mutex<Vec<String>>>,
    senders: Mutex<HashMap<String, mpsc::Sender<ItemChange>>>,
}

impl MemoryChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(Mutex::new(Vec::new())),
            senders: Mutex::new(HashMap::new()),
        })
    }

    /// Lifecycle events so far: `open:<id>` / `close:<id>`.
    pub fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Inject a row change into an open feed.
    pub async fn push(&self, list_id: &str, change: ItemChange) {
        let sender = self
            .senders
            .lock()
            .unwrap()
            .get(list_id)
            .cloned()
            .expect("no open feed for list");
        sender.send(change).await.expect("feed receiver gone");
    }
}

#[async_trait]
impl PushChannel for MemoryChannel {
    async fn subscribe_items(&self, list_id: &str) -> ApiResult<ItemFeed> {
        if is_temp_id(list_id) {
            return Err(ApiError::Channel(format!(
                "temporary id used as subscription target: {}",
                list_id
            )));
        }
        let (tx, rx) = mpsc::channel(16);
        self.log.lock().unwrap().push(format!("open:{}", list_id));
        self.senders
            .lock()
            .unwrap()
            .insert(list_id.to_string(), tx);

        let log = Arc::clone(&self.log);
        let id = list_id.to_string();
        Ok(ItemFeed::new(rx).with_closer(Box::new(move || {
            log.lock().unwrap().push(format!("close:{}", id));
        })))
    }
}

/// Assistant fake returning a scripted parse result.
pub struct FakeAssistant {
    pub parsed: ParsedReceipt,
    pub fail: bool,
}

#[async_trait]
impl Assistant for FakeAssistant {
    async fn parse_receipt(&self, _text: &str) -> ApiResult<ParsedReceipt> {
        if self.fail {
            return Err(ApiError::Assistant("model unavailable".to_string()));
        }
        Ok(self.parsed.clone())
    }

    async fn search(&self, query: &str, names: &[String]) -> ApiResult<Vec<String>> {
        if self.fail {
            return Err(ApiError::Assistant("model unavailable".to_string()));
        }
        let query = query.to_lowercase();
        Ok(names
            .iter()
            .filter(|n| n.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }
}
