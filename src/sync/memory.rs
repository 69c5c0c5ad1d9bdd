//! Single-process `RemoteStore`.
//!
//! `InMemoryStore` owns the tree; each `connect` call returns a
//! `StoreHandle` acting as one client connection. Tests drop and restore
//! connections to exercise on-disconnect writes and liveness events, and
//! advance the logical server clock by hand.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use super::store::{
    is_server_timestamp, join_path, split_path, RemoteStore, StoreError, StoreEvent, Subscription, SubscriptionId,
};

/// Clock value a fresh store starts from, in milliseconds.
pub const EPOCH_MS: u64 = 1_700_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

#[derive(Default)]
struct Connection {
    online: bool,
    on_disconnect: Vec<(String, Value)>,
}

enum WatchKind {
    Value { segments: Vec<String>, last: Option<Value> },
    Children { segments: Vec<String>, known: FxHashSet<String> },
    Connection,
}

struct Watch {
    id: SubscriptionId,
    conn: u64,
    kind: WatchKind,
    tx: UnboundedSender<StoreEvent>,
}

struct Inner {
    root: Value,
    clock_ms: u64,
    key_counter: u64,
    next_watch: u64,
    next_conn: u64,
    connections: FxHashMap<u64, Connection>,
    watches: Vec<Watch>,
}

impl Inner {
    fn online(&self, conn: u64) -> bool {
        self.connections.get(&conn).is_some_and(|c| c.online)
    }

    fn require_online(&self, conn: u64) -> Result<(), StoreError> {
        if self.online(conn) {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }

    fn write(&mut self, segments: &[String], value: Value) {
        let value = strip_nulls(resolve_timestamps(value, self.clock_ms));
        write_at(&mut self.root, segments, value);
    }

    /// Push changes to every online watcher, dropping closed channels.
    fn notify(&mut self) {
        let root = &self.root;
        let connections = &self.connections;
        self.watches.retain_mut(|watch| {
            if !connections.get(&watch.conn).is_some_and(|c| c.online) {
                return !watch.tx.is_closed();
            }
            match &mut watch.kind {
                WatchKind::Value { segments, last } => {
                    let current = read_at(root, segments);
                    if current != *last {
                        *last = current.clone();
                        return watch.tx.send(StoreEvent::Value(current)).is_ok();
                    }
                }
                WatchKind::Children { segments, known } => {
                    if let Some(Value::Object(children)) = read_at(root, segments) {
                        for (key, value) in children {
                            if known.insert(key.clone()) && watch.tx.send(StoreEvent::ChildAdded { key, value }).is_err() {
                                return false;
                            }
                        }
                    }
                }
                WatchKind::Connection => {}
            }
            !watch.tx.is_closed()
        });
    }

    fn set_online(&mut self, conn: u64, online: bool) {
        for watch in &self.watches {
            if watch.conn == conn && matches!(watch.kind, WatchKind::Connection) {
                let _ = watch.tx.send(StoreEvent::Connection(online));
            }
        }
    }
}

/// The shared tree. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                root: Value::Object(Map::new()),
                clock_ms: EPOCH_MS,
                key_counter: 0,
                next_watch: 1,
                next_conn: 1,
                connections: FxHashMap::default(),
                watches: Vec::new(),
            })),
        }
    }

    /// Open a new client connection.
    #[must_use]
    pub fn connect(&self) -> StoreHandle {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_conn;
        inner.next_conn += 1;
        inner.connections.insert(
            id,
            Connection {
                online: true,
                on_disconnect: Vec::new(),
            },
        );
        StoreHandle {
            conn: id,
            inner: Rc::clone(&self.inner),
        }
    }

    /// Sever a connection: fire its on-disconnect writes and tell its
    /// connection watchers.
    pub fn drop_connection(&self, handle: &StoreHandle) {
        let mut inner = self.inner.borrow_mut();
        let Some(conn) = inner.connections.get_mut(&handle.conn) else {
            return;
        };
        if !conn.online {
            return;
        }
        conn.online = false;
        let writes = std::mem::take(&mut conn.on_disconnect);
        tracing::debug!(connection = handle.conn, writes = writes.len(), "store connection dropped");

        for (path, value) in writes {
            if let Ok(segments) = owned_segments(&path) {
                inner.write(&segments, value);
            }
        }
        inner.set_online(handle.conn, false);
        inner.notify();
    }

    /// Restore a dropped connection. Its watchers catch up on what changed.
    pub fn reconnect(&self, handle: &StoreHandle) {
        let mut inner = self.inner.borrow_mut();
        if let Some(conn) = inner.connections.get_mut(&handle.conn) {
            conn.online = true;
        }
        inner.set_online(handle.conn, true);
        inner.notify();
    }

    pub fn advance_clock(&self, ms: u64) {
        self.inner.borrow_mut().clock_ms += ms;
    }

    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().clock_ms
    }

    /// Read regardless of connection state.
    #[must_use]
    pub fn peek(&self, path: &str) -> Option<Value> {
        let segments = owned_segments(path).ok()?;
        read_at(&self.inner.borrow().root, &segments)
    }
}

/// One client's connection to an `InMemoryStore`.
#[derive(Clone)]
pub struct StoreHandle {
    conn: u64,
    inner: Rc<RefCell<Inner>>,
}

impl StoreHandle {
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        ConnectionId(self.conn)
    }

    fn watch(&self, kind: WatchKind, initial: Option<StoreEvent>) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_watch);
        inner.next_watch += 1;
        let (tx, rx) = unbounded_channel();
        if let Some(event) = initial {
            let _ = tx.send(event);
        }
        inner.watches.push(Watch {
            id,
            conn: self.conn,
            kind,
            tx,
        });
        Subscription::new(id, rx)
    }
}

impl RemoteStore for StoreHandle {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = owned_segments(path)?;
        let inner = self.inner.borrow();
        inner.require_online(self.conn)?;
        Ok(read_at(&inner.root, &segments))
    }

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = owned_segments(path)?;
        let mut inner = self.inner.borrow_mut();
        inner.require_online(self.conn)?;
        inner.write(&segments, value);
        inner.notify();
        Ok(())
    }

    fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut targets = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            targets.push((owned_segments(&join_path(path, &key))?, value));
        }
        let mut inner = self.inner.borrow_mut();
        inner.require_online(self.conn)?;
        for (segments, value) in targets {
            inner.write(&segments, value);
        }
        inner.notify();
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.set(path, Value::Null)
    }

    fn subscribe(&self, path: &str) -> Subscription {
        let segments = owned_segments(path).unwrap_or_default();
        let current = read_at(&self.inner.borrow().root, &segments);
        self.watch(
            WatchKind::Value {
                segments,
                last: current.clone(),
            },
            Some(StoreEvent::Value(current)),
        )
    }

    fn on_child_added(&self, path: &str) -> Subscription {
        let segments = owned_segments(path).unwrap_or_default();
        let known = match read_at(&self.inner.borrow().root, &segments) {
            Some(Value::Object(children)) => children.keys().cloned().collect(),
            _ => FxHashSet::default(),
        };
        self.watch(WatchKind::Children { segments, known }, None)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.borrow_mut().watches.retain(|w| w.id != id);
    }

    fn push_unique_key(&self, _path: &str) -> String {
        let mut inner = self.inner.borrow_mut();
        inner.key_counter += 1;
        format!("k{:013}{:06}", inner.clock_ms, inner.key_counter)
    }

    fn register_on_disconnect_write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        owned_segments(path)?;
        let mut inner = self.inner.borrow_mut();
        inner.require_online(self.conn)?;
        let conn = inner.connections.entry(self.conn).or_default();
        conn.on_disconnect.retain(|(p, _)| p != path);
        conn.on_disconnect.push((path.to_string(), value));
        Ok(())
    }

    fn cancel_on_disconnect_write(&self, path: &str) {
        if let Some(conn) = self.inner.borrow_mut().connections.get_mut(&self.conn) {
            conn.on_disconnect.retain(|(p, _)| p != path);
        }
    }

    fn connection_state(&self) -> Subscription {
        let online = self.inner.borrow().online(self.conn);
        self.watch(WatchKind::Connection, Some(StoreEvent::Connection(online)))
    }

    fn is_connected(&self) -> bool {
        self.inner.borrow().online(self.conn)
    }

    fn transaction(
        &self,
        path: &str,
        f: &mut dyn FnMut(Option<Value>) -> Option<Value>,
    ) -> Result<Option<Value>, StoreError> {
        let segments = owned_segments(path)?;
        let current = {
            let inner = self.inner.borrow();
            inner.require_online(self.conn)?;
            read_at(&inner.root, &segments)
        };
        let Some(next) = f(current.clone()) else {
            return Ok(current);
        };

        let mut inner = self.inner.borrow_mut();
        inner.write(&segments, next);
        inner.notify();
        Ok(read_at(&inner.root, &segments))
    }
}

fn owned_segments(path: &str) -> Result<Vec<String>, StoreError> {
    Ok(split_path(path)?.into_iter().map(str::to_string).collect())
}

fn read_at(root: &Value, segments: &[String]) -> Option<Value> {
    let mut node = root;
    for segment in segments {
        node = node.as_object()?.get(segment)?;
    }
    match node {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.clone()),
    }
}

fn write_at(root: &mut Value, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = if value.is_object() { value } else { Value::Object(Map::new()) };
        return;
    };
    if value.is_null() {
        remove_at(root, segments);
        return;
    }
    let mut node = root;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = &mut node[segment.as_str()];
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node[last.as_str()] = value;
}

fn remove_at(node: &mut Value, segments: &[String]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let Value::Object(map) = node else {
        return;
    };
    if rest.is_empty() {
        map.remove(first);
        return;
    }
    if let Some(child) = map.get_mut(first) {
        remove_at(child, rest);
        if child.as_object().is_some_and(Map::is_empty) {
            map.remove(first);
        }
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let stripped: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, strip_nulls(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if stripped.is_empty() {
                Value::Null
            } else {
                Value::Object(stripped)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

fn resolve_timestamps(value: Value, now_ms: u64) -> Value {
    if is_server_timestamp(&value) {
        return Value::from(now_ms);
    }
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, resolve_timestamps(v, now_ms))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| resolve_timestamps(v, now_ms)).collect()),
        other => other,
    }
}
