use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scanned purchase with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub id: String,
    pub household_id: String,
    pub user_id: String,
    pub store_name: String,
    pub purchased_at: Option<DateTime<Utc>>,
    pub total: Option<f64>,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
    pub created_at: DateTime<Utc>,
}

/// One line on a receipt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptItem {
    pub id: String,
    pub receipt_id: String,
    pub name: String,
    pub quantity: f64,
    pub price: Option<f64>,
    /// Inventory item this line was matched to, if any.
    pub food_item_id: Option<String>,
}

impl Receipt {
    /// Sum of line prices, falling back to the stored total.
    pub fn line_total(&self) -> Option<f64> {
        let priced: Vec<f64> = self.items.iter().filter_map(|i| i.price).collect();
        if priced.is_empty() {
            self.total
        } else {
            Some(priced.iter().sum())
        }
    }
}
