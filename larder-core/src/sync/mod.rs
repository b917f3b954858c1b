//! Collection hooks: cached entity state plus mutation callbacks.
//!
//! Each hook owns one entity collection, exposes CRUD that mutates local
//! state optimistically before the remote call, and records failures in
//! an error slot after rolling the affected state back.

mod inventory;
mod receipts;
mod shopping;

#[cfg(test)]
pub(crate) mod testutil;

pub use inventory::{FoodFilter, FoodSort, Inventory};
pub use receipts::Receipts;
pub use shopping::{ShoppingSync, DEFAULT_LIST_NAME};
