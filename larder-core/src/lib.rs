//! Larder Core Library
//!
//! Shared types and synchronization logic for Larder applications.

pub mod api;
pub mod assistant;
pub mod error;
pub mod ids;
pub mod kv;
pub mod models;
pub mod realtime;
pub mod session;
pub mod sync;

pub use api::{DataApi, ItemPatch, NewItem, NewReceipt, NewReceiptItem, RestApi};
pub use assistant::{Assistant, HttpAssistant, ParsedLine, ParsedReceipt};
pub use error::{ApiError, ApiResult};
pub use ids::{is_temp_id, temp_id};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use models::{
    FoodItem, FoodKind, Household, Receipt, ReceiptItem, ShoppingList, ShoppingListItem,
    UserProfile,
};
pub use realtime::{ItemChange, ItemFeed, PushChannel, WsChannel};
pub use session::Session;
pub use sync::{FoodFilter, FoodSort, Inventory, Receipts, ShoppingSync, DEFAULT_LIST_NAME};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
