//! Receipt collection hook.
//!
//! Caches the household's scanned purchases and imports new ones: raw
//! receipt text goes to the assistant for extraction, the parsed rows are
//! persisted through the api, and the confirmed receipt lands at the
//! front of the cache. Nothing is inserted locally until the remote
//! create succeeds, so a failed import leaves no residue.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::{DataApi, NewReceipt, NewReceiptItem};
use crate::assistant::{Assistant, ParsedReceipt};
use crate::error::{ApiError, ApiResult};
use crate::models::Receipt;

/// Cached receipts with AI-assisted import.
///
/// The assistant is optional; browsing works without one and `import`
/// reports the missing configuration.
pub struct Receipts {
    api: Arc<dyn DataApi>,
    assistant: Option<Arc<dyn Assistant>>,
    user_id: String,
    household_id: String,
    receipts: Vec<Receipt>,
    last_error: Option<String>,
}

impl Receipts {
    pub fn new(
        api: Arc<dyn DataApi>,
        assistant: Option<Arc<dyn Assistant>>,
        user_id: impl Into<String>,
        household_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            assistant,
            user_id: user_id.into(),
            household_id: household_id.into(),
            receipts: Vec::new(),
            last_error: None,
        }
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn receipt(&self, id: &str) -> Option<&Receipt> {
        self.receipts.iter().find(|r| r.id == id)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch the household's receipts, newest first.
    pub async fn load(&mut self) -> ApiResult<()> {
        match self.api.receipts(&self.household_id).await {
            Ok(receipts) => {
                self.receipts = receipts;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Parse raw receipt text and persist the result.
    pub async fn import(&mut self, text: &str) -> ApiResult<Receipt> {
        let Some(assistant) = self.assistant.clone() else {
            return Err(self.fail(ApiError::Assistant(
                "no assistant configured".to_string(),
            )));
        };
        let parsed = match assistant.parse_receipt(text).await {
            Ok(parsed) => parsed,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };
        self.store_parsed(parsed).await
    }

    /// Persist an already-parsed receipt.
    pub async fn store_parsed(&mut self, parsed: ParsedReceipt) -> ApiResult<Receipt> {
        if parsed.items.is_empty() {
            return Err(self.fail(ApiError::Invalid(
                "receipt contained no recognizable line items".to_string(),
            )));
        }
        let new = NewReceipt {
            household_id: self.household_id.clone(),
            user_id: self.user_id.clone(),
            store_name: parsed.store_name,
            purchased_at: parsed.purchased_at.as_deref().and_then(parse_date),
            total: parsed.total,
            items: parsed
                .items
                .into_iter()
                .map(|line| NewReceiptItem {
                    name: line.name,
                    quantity: line.quantity,
                    price: line.price,
                    food_item_id: None,
                })
                .collect(),
        };

        match self.api.create_receipt(&new).await {
            Ok(receipt) => {
                self.last_error = None;
                self.receipts.insert(0, receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
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

/// Accepts an ISO date or datetime string from the assistant.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = s.parse::<DateTime<Utc>>() {
        return Some(dt);
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
