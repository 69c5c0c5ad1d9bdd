//! Read-only viewers of a match.

use serde_json::{Map, Value};

use super::coordinator::{fetch_record, SyncError};
use super::record::{MatchRecord, MatchStatus, Namespace};
use super::store::{join_path, RemoteStore, Subscription};
use crate::rules::GameEngine;

/// Mirrors a match's published state and never writes game data.
pub struct Spectator<S: RemoteStore> {
    store: S,
    match_id: String,
    entry_path: String,
    count_path: String,
    match_sub: Subscription,
    status: MatchStatus,
    active: bool,
}

impl<S: RemoteStore> Spectator<S> {
    pub fn join(store: S, ns: &Namespace, match_id: &str, user_id: &str, display_name: &str) -> Result<Self, SyncError> {
        let record = fetch_record(&store, ns, match_id)?;
        if !record.allow_spectators {
            return Err(SyncError::SpectatingDisabled);
        }
        if record.status.is_terminal() {
            return Err(SyncError::MatchOver);
        }

        let entry_path = ns.spectator(match_id, user_id);
        let mut entry = Map::new();
        entry.insert("display_name".into(), Value::from(display_name));
        entry.insert("joined_at".into(), store.server_timestamp());
        store.set(&entry_path, Value::Object(entry))?;
        store.register_on_disconnect_write(&entry_path, Value::Null)?;

        let match_path = ns.match_path(match_id);
        let count_path = join_path(&match_path, "spectator_count");
        store.transaction(&count_path, &mut |count: Option<Value>| {
            let count = count.as_ref().and_then(Value::as_u64).unwrap_or(0);
            Some(Value::from(count + 1))
        })?;

        let match_sub = store.subscribe(&match_path);
        tracing::info!(match_id, user = user_id, "spectating");

        Ok(Self {
            store,
            match_id: match_id.to_string(),
            entry_path,
            count_path,
            match_sub,
            status: record.status,
            active: true,
        })
    }

    #[must_use]
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    /// Last status seen on the match document.
    #[must_use]
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Load the latest published state. Returns whether it changed.
    pub fn poll(&mut self, engine: &mut GameEngine) -> bool {
        let Some(Some(value)) = self.match_sub.latest_value() else {
            return false;
        };
        let record: MatchRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(match_id = %self.match_id, error = %err, "unreadable match document");
                return false;
            }
        };
        self.status = record.status;
        match record.game_state {
            Some(state) if *engine.state() != state => {
                engine.load_state(state);
                true
            }
            _ => false,
        }
    }

    /// Leave: remove the entry and release the count.
    pub fn stop(&mut self) -> Result<(), SyncError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.store.unsubscribe(self.match_sub.id());
        self.store.cancel_on_disconnect_write(&self.entry_path);
        self.store.remove(&self.entry_path)?;
        self.store.transaction(&self.count_path, &mut |count: Option<Value>| {
            let count = count.as_ref().and_then(Value::as_u64).unwrap_or(0);
            Some(Value::from(count.saturating_sub(1)))
        })?;
        tracing::debug!(match_id = %self.match_id, "stopped spectating");
        Ok(())
    }
}

impl<S: RemoteStore> Drop for Spectator<S> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(match_id = %self.match_id, error = %err, "spectator cleanup failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchmaking::create_match;
    use crate::sync::{InMemoryStore, MatchMode, PlayerSlot};

    #[test]
    fn test_count_follows_joins() {
        let store = InMemoryStore::new();
        let ns = Namespace::default();
        let host = store.connect();
        let id = create_match(&host, &ns, MatchMode::Casual, PlayerSlot::new("a", "A"), PlayerSlot::new("b", "B"), true).unwrap();
        let count = format!("arcade/matches/riutiz/{id}/spectator_count");

        let mut first = Spectator::join(store.connect(), &ns, &id, "s1", "Sal").unwrap();
        let second = Spectator::join(store.connect(), &ns, &id, "s2", "Sam").unwrap();
        assert_eq!(store.peek(&count), Some(Value::from(2)));
        assert!(store.peek(&ns.spectator(&id, "s1")).is_some());

        first.stop().unwrap();
        drop(second);
        assert_eq!(store.peek(&count), Some(Value::from(0)));
        assert_eq!(store.peek(&ns.spectators(&id)), None);
    }

    #[test]
    fn test_join_refused_when_disabled() {
        let store = InMemoryStore::new();
        let ns = Namespace::default();
        let host = store.connect();
        let id = create_match(&host, &ns, MatchMode::Ranked, PlayerSlot::new("a", "A"), PlayerSlot::new("b", "B"), false).unwrap();

        let result = Spectator::join(store.connect(), &ns, &id, "s1", "Sal");
        assert!(matches!(result, Err(SyncError::SpectatingDisabled)));
    }

    #[test]
    fn test_join_refused_after_match_ends() {
        let store = InMemoryStore::new();
        let ns = Namespace::default();
        let host = store.connect();
        let id = create_match(&host, &ns, MatchMode::Casual, PlayerSlot::new("a", "A"), PlayerSlot::new("b", "B"), true).unwrap();
        let count = join_path(&ns.match_path(&id), "spectator_count");

        for status in [MatchStatus::Completed, MatchStatus::Abandoned] {
            host.set(&join_path(&ns.match_path(&id), "status"), serde_json::to_value(status).unwrap())
                .unwrap();
            let result = Spectator::join(store.connect(), &ns, &id, "s1", "Sal");
            assert!(matches!(result, Err(SyncError::MatchOver)));
        }
        assert_eq!(store.peek(&count), Some(Value::from(0)));
        assert_eq!(store.peek(&ns.spectators(&id)), None);
    }
}
