//! Shopping list synchronization hook.
//!
//! `ShoppingSync` maintains the household's shopping lists and the item
//! set of the currently active list. Mutations apply locally first so the
//! caller stays responsive, then persist remotely; a failed remote call
//! rolls the affected state back to its pre-operation snapshot and
//! records the error. Inbound push events are merged into the item map by
//! id, last arrival winning.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use crate::api::{DataApi, ItemPatch, NewItem};
use crate::error::{ApiError, ApiResult};
use crate::ids::is_temp_id;
use crate::kv::KeyValueStore;
use crate::models::{ShoppingList, ShoppingListItem};
use crate::realtime::{ItemChange, ItemFeed, PushChannel};

/// Name of the list created when a household has none.
pub const DEFAULT_LIST_NAME: &str = "Groceries";

fn active_key(household_id: &str) -> String {
    format!("active-list/{}", household_id)
}

/// Pre-operation state to restore when a remote call fails.
enum Snapshot {
    /// Only the active list's items changed.
    Items(BTreeMap<String, ShoppingListItem>),
    /// The list set and/or active selection changed too.
    Full {
        lists: Vec<ShoppingList>,
        active: Option<String>,
        items: BTreeMap<String, ShoppingListItem>,
    },
}

/// Realtime-synchronized shopping list state with optimistic mutations.
pub struct ShoppingSync {
    api: Arc<dyn DataApi>,
    push: Arc<dyn PushChannel>,
    kv: Box<dyn KeyValueStore>,
    user_id: String,
    household_id: String,
    lists: Vec<ShoppingList>,
    active: Option<String>,
    /// Items of the active list, keyed by id so push merges stay O(log n).
    items: BTreeMap<String, ShoppingListItem>,
    feed: Option<ItemFeed>,
    last_error: Option<String>,
}

impl ShoppingSync {
    pub fn new(
        api: Arc<dyn DataApi>,
        push: Arc<dyn PushChannel>,
        kv: Box<dyn KeyValueStore>,
        user_id: impl Into<String>,
        household_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            push,
            kv,
            user_id: user_id.into(),
            household_id: household_id.into(),
            lists: Vec::new(),
            active: None,
            items: BTreeMap::new(),
            feed: None,
            last_error: None,
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn lists(&self) -> &[ShoppingList] {
        &self.lists
    }

    pub fn active_list_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_list(&self) -> Option<&ShoppingList> {
        let id = self.active.as_deref()?;
        self.lists.iter().find(|l| l.id == id)
    }

    /// Items of the active list in id order.
    pub fn items(&self) -> impl Iterator<Item = &ShoppingListItem> {
        self.items.values()
    }

    pub fn item(&self, id: &str) -> Option<&ShoppingListItem> {
        self.items.get(id)
    }

    /// Existing item on the active list referencing the given food item.
    pub fn find_by_food(&self, food_item_id: &str) -> Option<&ShoppingListItem> {
        self.items.values().find(|i| i.food_item_id == food_item_id)
    }

    /// Latest mutation error, if the most recent operation failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // --- loading and selection -------------------------------------------

    /// Fetch all lists for the household, creating a default list when
    /// none exist, then activate the remembered list (or the first one)
    /// and load its items.
    pub async fn load_lists(&mut self) -> ApiResult<()> {
        let fetched = self.api.lists(&self.household_id).await;
        let mut lists = self.record(fetched)?;
        if lists.is_empty() {
            let created = self
                .api
                .create_list(&self.household_id, DEFAULT_LIST_NAME)
                .await;
            lists.push(self.record(created)?);
        }
        self.lists = lists;

        let remembered = self
            .kv
            .get(&active_key(&self.household_id))
            .filter(|id| self.lists.iter().any(|l| &l.id == id));
        let target = match remembered {
            Some(id) => id,
            None => self.lists[0].id.clone(),
        };
        self.select_list(&target).await
    }

    /// Make a list active: tear down the previous push subscription,
    /// fetch the list's items, then subscribe to its change feed.
    ///
    /// A temporary list id gets no fetch and no subscription; both happen
    /// once the id is confirmed.
    pub async fn select_list(&mut self, id: &str) -> ApiResult<()> {
        self.teardown_feed();
        self.active = Some(id.to_string());
        self.items.clear();
        self.persist_active();

        if is_temp_id(id) {
            return Ok(());
        }

        let fetched = self.api.items(id).await;
        let fetched = self.record(fetched)?;
        self.items = fetched.into_iter().map(|i| (i.id.clone(), i)).collect();

        let feed = self.push.subscribe_items(id).await;
        self.feed = Some(self.record(feed)?);
        Ok(())
    }

    // --- list mutations --------------------------------------------------

    /// Create a list optimistically and make it active. On success the
    /// temporary record is replaced by the server row and the feed opens
    /// on the confirmed id; on failure the prior list set and selection
    /// come back.
    pub async fn create_list(&mut self, name: &str) -> ApiResult<ShoppingList> {
        let snapshot = self.full_snapshot();
        let temp = ShoppingList::draft(&self.household_id, name);
        let temp_id = temp.id.clone();

        self.lists.push(temp);
        self.teardown_feed();
        self.active = Some(temp_id.clone());
        self.items.clear();

        let api = Arc::clone(&self.api);
        let household_id = self.household_id.clone();
        let name = name.to_string();
        let created = self
            .commit(snapshot, async move {
                api.create_list(&household_id, &name).await
            })
            .await?;

        match self.lists.iter_mut().find(|l| l.id == temp_id) {
            Some(slot) => *slot = created.clone(),
            None => self.lists.push(created.clone()),
        }
        self.active = Some(created.id.clone());
        self.persist_active();
        self.resubscribe().await;
        Ok(created)
    }

    /// Delete a list optimistically. If it was active, the first
    /// remaining list (or none) becomes active before the remote call.
    pub async fn delete_list(&mut self, id: &str) -> ApiResult<()> {
        if !self.lists.iter().any(|l| l.id == id) {
            return Err(self.fail(ApiError::NotFound(format!("shopping list {}", id))));
        }
        let snapshot = self.full_snapshot();
        self.lists.retain(|l| l.id != id);

        // Item fetch or resubscribe failures while switching surface in
        // the error slot without blocking the delete itself.
        let mut switch_error = None;
        if self.active.as_deref() == Some(id) {
            match self.lists.first().map(|l| l.id.clone()) {
                Some(next) => {
                    if let Err(e) = self.select_list(&next).await {
                        switch_error = Some(e.to_string());
                    }
                }
                None => {
                    self.teardown_feed();
                    self.active = None;
                    self.items.clear();
                    self.persist_active();
                }
            }
        }

        let api = Arc::clone(&self.api);
        let id = id.to_string();
        self.commit(snapshot, async move { api.delete_list(&id).await })
            .await?;
        // A successful delete must not hide the failed item load of the
        // newly activated list.
        if switch_error.is_some() {
            self.last_error = switch_error;
        }
        Ok(())
    }

    // --- item mutations --------------------------------------------------

    /// Add a food item to the active list. If the food item is already on
    /// the list, its quantity grows instead of duplicating the row.
    pub async fn add_item(&mut self, food_item_id: &str, quantity: f64) -> ApiResult<()> {
        let Some(list_id) = self.active.clone() else {
            return Err(self.fail(ApiError::Invalid("no active shopping list".to_string())));
        };

        if let Some(existing) = self.find_by_food(food_item_id) {
            let (id, total) = (existing.id.clone(), existing.quantity + quantity);
            return self.update_quantity(&id, total).await;
        }

        let snapshot = Snapshot::Items(self.items.clone());
        let temp = ShoppingListItem::draft(&list_id, food_item_id, quantity, &self.user_id);
        let temp_id = temp.id.clone();
        self.items.insert(temp_id.clone(), temp);

        let api = Arc::clone(&self.api);
        let new = NewItem {
            list_id,
            food_item_id: food_item_id.to_string(),
            quantity,
            added_by: self.user_id.clone(),
        };
        let created = self
            .commit(snapshot, async move { api.create_item(&new).await })
            .await?;

        self.items.remove(&temp_id);
        self.items.insert(created.id.clone(), created);
        Ok(())
    }

    /// Set an item's quantity. Zero or less removes the item instead.
    pub async fn update_quantity(&mut self, item_id: &str, quantity: f64) -> ApiResult<()> {
        if quantity <= 0.0 {
            return self.remove_item(item_id).await;
        }

        let snapshot = Snapshot::Items(self.items.clone());
        let Some(item) = self.items.get_mut(item_id) else {
            return Err(self.fail(ApiError::NotFound(format!("shopping list item {}", item_id))));
        };
        item.quantity = quantity;
        item.updated_at = Utc::now();

        let api = Arc::clone(&self.api);
        let id = item_id.to_string();
        let patch = ItemPatch::quantity(quantity);
        self.commit(snapshot, async move { api.update_item(&id, &patch).await })
            .await?;
        Ok(())
    }

    /// Remove an item optimistically.
    pub async fn remove_item(&mut self, item_id: &str) -> ApiResult<()> {
        let snapshot = Snapshot::Items(self.items.clone());
        if self.items.remove(item_id).is_none() {
            return Err(self.fail(ApiError::NotFound(format!("shopping list item {}", item_id))));
        }

        let api = Arc::clone(&self.api);
        let id = item_id.to_string();
        self.commit(snapshot, async move { api.delete_item(&id).await })
            .await?;
        Ok(())
    }

    /// Check or uncheck an item. Checking records the acting user in
    /// `checked_by`; unchecking clears it.
    pub async fn toggle_checked(&mut self, item_id: &str, checked: bool) -> ApiResult<()> {
        let snapshot = Snapshot::Items(self.items.clone());
        let Some(item) = self.items.get_mut(item_id) else {
            return Err(self.fail(ApiError::NotFound(format!("shopping list item {}", item_id))));
        };
        item.checked = checked;
        item.checked_by = if checked {
            Some(self.user_id.clone())
        } else {
            None
        };
        item.updated_at = Utc::now();
        let checked_by = item.checked_by.clone();

        let api = Arc::clone(&self.api);
        let id = item_id.to_string();
        let patch = ItemPatch::checked(checked, checked_by);
        self.commit(snapshot, async move { api.update_item(&id, &patch).await })
            .await?;
        Ok(())
    }

    /// Remove every checked item in one optimistic batch. Returns how
    /// many items were cleared.
    pub async fn clear_completed(&mut self) -> ApiResult<usize> {
        let ids: Vec<String> = self
            .items
            .values()
            .filter(|i| i.checked)
            .map(|i| i.id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let snapshot = Snapshot::Items(self.items.clone());
        self.items.retain(|_, i| !i.checked);

        let api = Arc::clone(&self.api);
        let batch = ids.clone();
        self.commit(snapshot, async move { api.delete_items(&batch).await })
            .await?;
        Ok(ids.len())
    }

    // --- push merging ----------------------------------------------------

    /// Merge one inbound push event into the item map. Events for other
    /// lists are ignored.
    ///
    /// Arrival order wins: a push landing between an optimistic write and
    /// its confirmation is overwritten by whichever arrives later. There
    /// is no version check on either side of this exchange.
    pub fn apply_change(&mut self, change: ItemChange) {
        match change {
            ItemChange::Upsert(item) => {
                if self.active.as_deref() != Some(item.list_id.as_str()) {
                    return;
                }
                self.items.insert(item.id.clone(), item);
            }
            ItemChange::Delete(id) => {
                self.items.remove(&id);
            }
        }
    }

    /// Wait for the next push event, merge it, and return it. `None` when
    /// no feed is open or the feed closed.
    pub async fn next_change(&mut self) -> Option<ItemChange> {
        let feed = self.feed.as_mut()?;
        let change = feed.recv().await?;
        self.apply_change(change.clone());
        Some(change)
    }

    /// Merge every already-queued push event without waiting. Returns the
    /// number applied.
    pub fn drain_changes(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(feed) = self.feed.as_mut() {
            while let Some(change) = feed.try_recv() {
                pending.push(change);
            }
        }
        let applied = pending.len();
        for change in pending {
            self.apply_change(change);
        }
        applied
    }

    // --- internals -------------------------------------------------------

    fn full_snapshot(&self) -> Snapshot {
        Snapshot::Full {
            lists: self.lists.clone(),
            active: self.active.clone(),
            items: self.items.clone(),
        }
    }

    /// Run the remote half of a mutation. On success the error slot
    /// clears; on failure the snapshot is restored and the error recorded.
    async fn commit<T, F>(&mut self, snapshot: Snapshot, remote: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        match remote.await {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(e) => {
                match snapshot {
                    Snapshot::Items(items) => self.items = items,
                    Snapshot::Full {
                        lists,
                        active,
                        items,
                    } => {
                        self.lists = lists;
                        self.items = items;
                        if self.active != active {
                            self.teardown_feed();
                            self.active = active;
                            self.persist_active();
                            self.resubscribe().await;
                        }
                    }
                }
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn record<T>(&mut self, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }

    fn fail(&mut self, e: ApiError) -> ApiError {
        self.last_error = Some(e.to_string());
        e
    }

    fn teardown_feed(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.close();
        }
    }

    /// Reopen the feed for the current active list, if it has a durable id.
    async fn resubscribe(&mut self) {
        self.feed = None;
        let Some(id) = self.active.clone() else {
            return;
        };
        if is_temp_id(&id) {
            return;
        }
        match self.push.subscribe_items(&id).await {
            Ok(feed) => self.feed = Some(feed),
            Err(e) => {
                tracing::warn!("failed to reopen item feed for {}: {}", id, e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Remember the active list for this household on this device.
    /// Temporary ids are never durable and never remembered.
    fn persist_active(&mut self) {
        let key = active_key(&self.household_id);
        match &self.active {
            Some(id) if !is_temp_id(id) => self.kv.set(&key, id),
            Some(_) => {}
            None => self.kv.remove(&key),
        }
    }
}
