//! The remote tree store contract.
//!
//! A store holds one JSON tree addressed by `/`-separated paths. Clients
//! read and write values, watch paths through `Subscription`s, and
//! schedule writes that the store applies on their behalf when their
//! connection drops.
//!
//! Notifications are delivered over channels, so a consumer drains them
//! when it is ready instead of registering callbacks.

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};

pub const SERVER_TIMESTAMP_KEY: &str = ".sv";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Not connected to the store")]
    Disconnected,

    #[error("Write rejected at {0}")]
    WriteRejected(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Malformed document: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A change pushed by the store.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    /// Current value at a watched path. `None` when nothing is stored.
    Value(Option<Value>),
    /// A new child appeared under a watched log path.
    ChildAdded { key: String, value: Value },
    /// Liveness of this client's own store connection.
    Connection(bool),
}

/// Receiving end of a watch.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: UnboundedReceiver<StoreEvent>,
}

impl Subscription {
    #[must_use]
    pub fn new(id: SubscriptionId, receiver: UnboundedReceiver<StoreEvent>) -> Self {
        Self { id, receiver }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn try_next(&mut self) -> Option<StoreEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Every event queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<StoreEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Most recent `Value` event, if any arrived.
    pub fn latest_value(&mut self) -> Option<Option<Value>> {
        self.drain().into_iter().rev().find_map(|event| match event {
            StoreEvent::Value(value) => Some(value),
            _ => None,
        })
    }

    /// Wait for the next event.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        self.receiver.recv().await
    }
}

/// Remote mutable tree store, seen from one client connection.
///
/// Writing `Value::Null` anywhere removes that path. Objects left empty by
/// a removal disappear.
pub trait RemoteStore {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Shallow merge. Keys may themselves be multi-segment paths.
    fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Watch a path. The current value is pushed immediately.
    fn subscribe(&self, path: &str) -> Subscription;

    /// Watch a log path for children added after this call.
    fn on_child_added(&self, path: &str) -> Subscription;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Fresh key under `path`. Keys sort in generation order.
    fn push_unique_key(&self, path: &str) -> String;

    /// Write `value` at `path` if this client's connection drops.
    fn register_on_disconnect_write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    fn cancel_on_disconnect_write(&self, path: &str);

    /// Sentinel replaced by the store clock when written.
    fn server_timestamp(&self) -> Value {
        let mut sentinel = Map::new();
        sentinel.insert(SERVER_TIMESTAMP_KEY.to_string(), Value::from("timestamp"));
        Value::Object(sentinel)
    }

    /// Watch this client's connection. The current state is pushed
    /// immediately.
    fn connection_state(&self) -> Subscription;

    fn is_connected(&self) -> bool;

    /// Atomic read-modify-write of one path. Returning `None` from `f`
    /// aborts without writing. Returns the committed value.
    fn transaction(
        &self,
        path: &str,
        f: &mut dyn FnMut(Option<Value>) -> Option<Value>,
    ) -> Result<Option<Value>, StoreError>;
}

/// Join path segments, skipping empty ones.
#[must_use]
pub fn join_path(base: &str, child: &str) -> String {
    let base = base.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{child}"),
    }
}

/// Split a path into segments, rejecting keys the store cannot hold.
pub fn split_path(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let invalid = segments
        .iter()
        .any(|s| s.contains(|c: char| matches!(c, '.' | '#' | '$' | '[' | ']')));
    if invalid {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// Whether `value` is the server timestamp sentinel.
#[must_use]
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.len() == 1 && o.contains_key(SERVER_TIMESTAMP_KEY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("arcade/matches", "m1"), "arcade/matches/m1");
        assert_eq!(join_path("arcade/", "/m1"), "arcade/m1");
        assert_eq!(join_path("", "m1"), "m1");
    }

    #[test]
    fn test_split_path_rejects_reserved() {
        assert_eq!(split_path("/a//b/").unwrap(), vec!["a", "b"]);
        assert!(split_path("a/b.c").is_err());
        assert!(split_path("").unwrap().is_empty());
    }

    #[test]
    fn test_sentinel_detection() {
        let sentinel = serde_json::json!({ ".sv": "timestamp" });
        assert!(is_server_timestamp(&sentinel));
        assert!(!is_server_timestamp(&serde_json::json!({ ".sv": 1, "x": 2 })));
    }
}
