//! Frame types for the push channel.
//!
//! The hosted platform delivers row-level change notifications over a
//! websocket. Frames are tagged JSON; field names use camelCase to match
//! the platform's wire format.

use serde::{Deserialize, Serialize};

use crate::models::ShoppingListItem;

/// Messages exchanged on the push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Frame {
    /// Client requests row-change delivery for one topic.
    #[serde(rename = "subscribe")]
    Subscribe {
        topic: String,
        table: String,
        /// Server-side row filter, e.g. `list_id=eq.<id>`.
        filter: String,
    },
    /// Client stops delivery for a topic.
    #[serde(rename = "unsubscribe")]
    Unsubscribe { topic: String },
    /// Server confirms a subscription.
    #[serde(rename = "confirmed")]
    Confirmed { topic: String },
    /// Server delivers one row change.
    #[serde(rename = "change")]
    Change {
        topic: String,
        event: ChangeEvent,
        #[serde(skip_serializing_if = "Option::is_none")]
        record: Option<ShoppingListItem>,
        /// Id of the deleted row; only present on deletes.
        #[serde(rename = "oldId", skip_serializing_if = "Option::is_none")]
        old_id: Option<String>,
    },
    /// Server-side error.
    #[serde(rename = "error")]
    Error { message: String },
    /// Keepalive, ignored by the client.
    #[serde(rename = "heartbeat")]
    Heartbeat,
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeEvent {
    Insert,
    Update,
    Delete,
}

impl Frame {
    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from a JSON text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Topic name for the item feed of one list.
pub fn items_topic(list_id: &str) -> String {
    format!("items:{}", list_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShoppingListItem;

    #[test]
    fn test_subscribe_roundtrip() {
        let frame = Frame::Subscribe {
            topic: items_topic("l1"),
            table: "shopping_list_items".to_string(),
            filter: "list_id=eq.l1".to_string(),
        };
        let text = frame.encode().unwrap();
        assert!(text.contains("\"type\":\"subscribe\""));
        assert!(text.contains("items:l1"));
        match Frame::decode(&text).unwrap() {
            Frame::Subscribe { topic, .. } => assert_eq!(topic, "items:l1"),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_change_delete_roundtrip() {
        let frame = Frame::Change {
            topic: items_topic("l1"),
            event: ChangeEvent::Delete,
            record: None,
            old_id: Some("a1".to_string()),
        };
        let text = frame.encode().unwrap();
        assert!(text.contains("\"oldId\":\"a1\""));
        match Frame::decode(&text).unwrap() {
            Frame::Change { event, old_id, .. } => {
                assert_eq!(event, ChangeEvent::Delete);
                assert_eq!(old_id.as_deref(), Some("a1"));
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_change_insert_carries_record() {
        let item = ShoppingListItem::draft("l1", "f1", 1.0, "u1");
        let frame = Frame::Change {
            topic: items_topic("l1"),
            event: ChangeEvent::Insert,
            record: Some(item.clone()),
            old_id: None,
        };
        let text = frame.encode().unwrap();
        match Frame::decode(&text).unwrap() {
            Frame::Change { record, .. } => assert_eq!(record.unwrap().id, item.id),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_rejected_gracefully() {
        assert!(Frame::decode("{\"type\":\"nonsense\"}").is_err());
    }
}
