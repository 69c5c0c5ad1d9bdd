//! Match document creation.

use serde_json::Value;

use crate::core::{Phase, PlayerNum};
use crate::sync::{MatchMode, MatchRecord, MatchStatus, Namespace, PlayerSlot, RemoteStore, StoreError};

/// Write a new match for two seats and return its id.
///
/// Seat 1 is marked connected since its creator is online; seat 2 joins
/// through its own coordinator.
pub fn create_match(
    store: &impl RemoteStore,
    ns: &Namespace,
    mode: MatchMode,
    player1: PlayerSlot,
    player2: PlayerSlot,
    allow_spectators: bool,
) -> Result<String, StoreError> {
    let match_id = store.push_unique_key(&ns.matches());
    let mut record = MatchRecord {
        id: match_id.clone(),
        game: ns.game.clone(),
        mode,
        status: MatchStatus::Starting,
        created_at: store.server_timestamp(),
        phase: Phase::Draw,
        allow_spectators,
        ..MatchRecord::default()
    };
    record.players[PlayerNum::One] = PlayerSlot {
        connected: true,
        last_action: store.server_timestamp(),
        ..player1
    };
    record.players[PlayerNum::Two] = PlayerSlot {
        connected: false,
        last_action: Value::Null,
        ..player2
    };

    store.set(&ns.match_path(&match_id), serde_json::to_value(&record)?)?;
    tracing::info!(match_id = %match_id, mode = ?mode, "created match");
    Ok(match_id)
}

/// Matches that have not ended.
pub fn active_matches(store: &impl RemoteStore, ns: &Namespace) -> Result<Vec<MatchRecord>, StoreError> {
    let Some(Value::Object(matches)) = store.get(&ns.matches())? else {
        return Ok(Vec::new());
    };
    let records = matches
        .into_iter()
        .filter_map(|(id, value)| match serde_json::from_value::<MatchRecord>(value) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(match_id = %id, error = %err, "skipping unreadable match");
                None
            }
        })
        .filter(|record| !record.status.is_terminal())
        .collect();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::InMemoryStore;

    #[test]
    fn test_created_match_shape() {
        let store = InMemoryStore::new();
        let handle = store.connect();
        let ns = Namespace::default();

        let id = create_match(
            &handle,
            &ns,
            MatchMode::Ranked,
            PlayerSlot::new("a", "Ann").with_rating(1100),
            PlayerSlot::new("b", "Ben").with_deck(Some("deck-7".into())),
            true,
        )
        .unwrap();

        let value = handle.get(&ns.match_path(&id)).unwrap().unwrap();
        assert_eq!(value["status"], "starting");
        assert_eq!(value["phase"], "draw");
        assert!(value["created_at"].is_u64());

        let record: MatchRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.id, id);
        assert!(record.players[PlayerNum::One].connected);
        assert!(!record.players[PlayerNum::Two].connected);
        assert_eq!(record.players[PlayerNum::One].rating, 1100);
        assert_eq!(record.players[PlayerNum::Two].deck_id.as_deref(), Some("deck-7"));
        assert!(record.game_state.is_none());
    }

    #[test]
    fn test_active_matches_skip_finished() {
        let store = InMemoryStore::new();
        let handle = store.connect();
        let ns = Namespace::default();

        let live = create_match(&handle, &ns, MatchMode::Casual, PlayerSlot::new("a", "A"), PlayerSlot::new("b", "B"), true).unwrap();
        let done = create_match(&handle, &ns, MatchMode::Casual, PlayerSlot::new("c", "C"), PlayerSlot::new("d", "D"), true).unwrap();
        handle
            .set(&format!("{}/status", ns.match_path(&done)), Value::from("completed"))
            .unwrap();

        let active = active_matches(&handle, &ns).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, live);
    }
}
