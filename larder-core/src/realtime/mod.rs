//! Realtime push channel for shopping list items.
//!
//! One subscription exists per active list id; the server filters row
//! changes by list id and pushes insert/update/delete notifications.
//! [`PushChannel`] is the seam the shopping hook subscribes through, and
//! [`WsChannel`] is the websocket implementation.

pub mod protocol;

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{ApiError, ApiResult};
use crate::models::ShoppingListItem;

use protocol::{items_topic, ChangeEvent, Frame};

/// How long to wait for the server to confirm a subscription.
const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// One row-level change delivered by the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemChange {
    /// Insert or update of a row; merged into local state by id.
    Upsert(ShoppingListItem),
    /// Deletion of the row with this id.
    Delete(String),
}

/// A live subscription to one list's item changes.
///
/// Closing (or dropping) the feed tears the subscription down; the
/// shopping hook closes the previous feed before opening the next one
/// when the active list changes.
pub struct ItemFeed {
    rx: mpsc::Receiver<ItemChange>,
    task: Option<JoinHandle<()>>,
    closer: Option<Box<dyn FnOnce() + Send>>,
}

impl ItemFeed {
    pub fn new(rx: mpsc::Receiver<ItemChange>) -> Self {
        Self {
            rx,
            task: None,
            closer: None,
        }
    }

    /// Attach the reader task so teardown can stop it.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }

    /// Attach a callback run synchronously on teardown.
    pub fn with_closer(mut self, closer: Box<dyn FnOnce() + Send>) -> Self {
        self.closer = Some(closer);
        self
    }

    /// Wait for the next change. Returns `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<ItemChange> {
        self.rx.recv().await
    }

    /// Take a change if one is already queued.
    pub fn try_recv(&mut self) -> Option<ItemChange> {
        self.rx.try_recv().ok()
    }

    /// Tear the subscription down. Idempotent.
    pub fn close(&mut self) {
        if let Some(closer) = self.closer.take() {
            closer();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl Drop for ItemFeed {
    fn drop(&mut self) {
        self.close();
    }
}

/// Push channel port; tests inject an in-memory fake.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Open a subscription for the items of one list.
    ///
    /// The list id must be a durable server id; temporary ids are never
    /// valid subscription targets.
    async fn subscribe_items(&self, list_id: &str) -> ApiResult<ItemFeed>;
}

/// Websocket implementation of the push channel.
#[derive(Debug, Clone)]
pub struct WsChannel {
    server_url: String,
    api_key: String,
}

impl WsChannel {
    pub fn new(server_url: &str, api_key: &str) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Websocket endpoint, mapping http(s) schemes to ws(s).
    pub fn build_ws_url(&self) -> String {
        let base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://") {
            self.server_url.clone()
        } else {
            format!("ws://{}", self.server_url)
        };
        format!("{}/realtime/v1?apikey={}", base, self.api_key)
    }
}

#[async_trait]
impl PushChannel for WsChannel {
    async fn subscribe_items(&self, list_id: &str) -> ApiResult<ItemFeed> {
        let topic = items_topic(list_id);
        let url = self.build_ws_url();

        let (ws, _) = connect_async(&url)
            .await
            .map_err(|e| ApiError::Channel(e.to_string()))?;
        let (mut sink, mut stream) = ws.split();

        let join = Frame::Subscribe {
            topic: topic.clone(),
            table: "shopping_list_items".to_string(),
            filter: format!("list_id=eq.{}", list_id),
        };
        sink.send(Message::Text(
            join.encode()
                .map_err(|e| ApiError::Channel(e.to_string()))?
                .into(),
        ))
        .await
        .map_err(|e| ApiError::Channel(e.to_string()))?;

        // Wait for confirmation before handing the feed out.
        loop {
            let msg = timeout(SUBSCRIBE_TIMEOUT, stream.next())
                .await
                .map_err(|_| ApiError::Channel("subscribe timed out".to_string()))?
                .ok_or_else(|| ApiError::Channel("connection closed".to_string()))?
                .map_err(|e| ApiError::Channel(e.to_string()))?;
            match msg {
                Message::Text(text) => match Frame::decode(&text) {
                    Ok(Frame::Confirmed { topic: t }) if t == topic => break,
                    Ok(Frame::Error { message }) => return Err(ApiError::Channel(message)),
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("unparseable frame during subscribe: {}", e);
                        continue;
                    }
                },
                Message::Close(_) => {
                    return Err(ApiError::Channel("connection closed".to_string()))
                }
                _ => continue,
            }
        }

        let (tx, rx) = mpsc::channel(64);
        let (close_tx, mut close_rx) = mpsc::unbounded_channel::<()>();
        let reader_topic = topic.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = close_rx.recv() => {
                        let leave = Frame::Unsubscribe { topic: reader_topic.clone() };
                        if let Ok(text) = leave.encode() {
                            let _ = sink.send(Message::Text(text.into())).await;
                        }
                        break;
                    }
                    msg = stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            match Frame::decode(&text) {
                                Ok(Frame::Change { topic, event, record, old_id }) => {
                                    if topic != reader_topic {
                                        continue;
                                    }
                                    let change = match (event, record, old_id) {
                                        (ChangeEvent::Delete, _, Some(id)) => ItemChange::Delete(id),
                                        (_, Some(item), _) => ItemChange::Upsert(item),
                                        _ => continue,
                                    };
                                    if tx.send(change).await.is_err() {
                                        break;
                                    }
                                }
                                Ok(Frame::Heartbeat) => {}
                                Ok(Frame::Error { message }) => {
                                    tracing::warn!("push channel error: {}", message);
                                }
                                Ok(_) => {}
                                Err(e) => {
                                    tracing::warn!("unparseable push frame: {}", e);
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!("push channel read failed: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        Ok(ItemFeed::new(rx)
            .with_task(task)
            .with_closer(Box::new(move || {
                let _ = close_tx.send(());
            })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_ws_url_with_https() {
        let channel = WsChannel::new("https://db.example.com", "anon");
        assert_eq!(
            channel.build_ws_url(),
            "wss://db.example.com/realtime/v1?apikey=anon"
        );
    }

    #[test]
    fn test_build_ws_url_with_http() {
        let channel = WsChannel::new("http://localhost:54321/", "anon");
        assert_eq!(
            channel.build_ws_url(),
            "ws://localhost:54321/realtime/v1?apikey=anon"
        );
    }

    #[test]
    fn test_build_ws_url_bare_host() {
        let channel = WsChannel::new("localhost:54321", "anon");
        assert_eq!(
            channel.build_ws_url(),
            "ws://localhost:54321/realtime/v1?apikey=anon"
        );
    }

    #[tokio::test]
    async fn test_feed_close_runs_closer_once() {
        let (_tx, rx) = mpsc::channel(1);
        let (flag_tx, mut flag_rx) = mpsc::unbounded_channel::<()>();
        let mut feed = ItemFeed::new(rx).with_closer(Box::new(move || {
            let _ = flag_tx.send(());
        }));

        feed.close();
        feed.close();
        assert!(flag_rx.try_recv().is_ok());
        assert!(flag_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_feed_delivers_changes_in_order() {
        let (tx, rx) = mpsc::channel(4);
        let mut feed = ItemFeed::new(rx);

        tx.send(ItemChange::Delete("a".to_string())).await.unwrap();
        tx.send(ItemChange::Delete("b".to_string())).await.unwrap();
        drop(tx);

        assert_eq!(feed.recv().await, Some(ItemChange::Delete("a".to_string())));
        assert_eq!(feed.recv().await, Some(ItemChange::Delete("b".to_string())));
        assert_eq!(feed.recv().await, None);
    }
}
