mod food_item;
mod household;
mod receipt;
mod shopping;

pub use food_item::{FoodItem, FoodKind};
pub use household::{Household, UserProfile};
pub use receipt::{Receipt, ReceiptItem};
pub use shopping::{ShoppingList, ShoppingListItem};
