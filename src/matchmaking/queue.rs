//! Public matchmaking queue.
//!
//! Every queued client scans the queue for the closest-rated entry in its
//! mode. Both sides of a pair see each other, so only one of them may
//! create the match: the one that joined strictly earlier, or on a tie the
//! one with the smaller user id. The creator writes the new match id into
//! the other entry and removes both.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::factory::create_match;
use super::{MatchmakingConfig, MatchmakingError};
use crate::core::PlayerNum;
use crate::rating::RatingCalculator;
use crate::sync::{MatchMode, MatchRecord, PlayerProfile, PlayerSlot, RemoteStore, StoreEvent, Subscription};

/// A queued player, stored at `queue/{user_id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueEntry {
    pub user_id: String,
    pub display_name: String,
    pub mode: MatchMode,
    pub deck_id: Option<String>,
    pub rating: i32,
    pub joined_at: Value,
    /// Written by the creator once a match exists.
    pub match_id: Option<String>,
}

impl QueueEntry {
    /// Resolved join time. Unresolved sentinels sort last.
    #[must_use]
    pub fn joined_at_ms(&self) -> u64 {
        self.joined_at.as_u64().unwrap_or(u64::MAX)
    }

    fn slot(&self) -> PlayerSlot {
        PlayerSlot::new(&self.user_id, &self.display_name)
            .with_deck(self.deck_id.clone())
            .with_rating(self.rating)
    }
}

/// Closest-rated waiting entry in `mode`, other than `me`.
#[must_use]
pub fn select_candidate<'a>(
    me: &str,
    mode: MatchMode,
    my_rating: i32,
    queue: &'a BTreeMap<String, QueueEntry>,
) -> Option<&'a QueueEntry> {
    queue
        .iter()
        .filter(|(id, entry)| id.as_str() != me && entry.mode == mode && entry.match_id.is_none())
        .map(|(_, entry)| entry)
        .min_by_key(|entry| (entry.rating - my_rating).abs())
}

/// Whether `me` creates the match with `other`. Exactly one of a pair
/// returns true.
#[must_use]
pub fn is_match_creator(me: &str, my_joined_ms: u64, other: &str, other_joined_ms: u64) -> bool {
    my_joined_ms < other_joined_ms || (my_joined_ms == other_joined_ms && me < other)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchFound {
    pub match_id: String,
    /// This client wrote the match document.
    pub created: bool,
    /// Advisory, from the rating gap.
    pub quality: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueuePoll {
    Idle,
    Waiting,
    Matched(MatchFound),
}

pub struct MatchmakingQueue<S: RemoteStore> {
    store: S,
    config: MatchmakingConfig,
    profile: PlayerProfile,
    rating: RatingCalculator,
    mode: MatchMode,
    entry_sub: Option<Subscription>,
    last_scan: Option<Instant>,
}

impl<S: RemoteStore> MatchmakingQueue<S> {
    #[must_use]
    pub fn new(store: S, config: MatchmakingConfig, profile: PlayerProfile) -> Self {
        Self {
            store,
            config,
            profile,
            rating: RatingCalculator::default(),
            mode: MatchMode::Casual,
            entry_sub: None,
            last_scan: None,
        }
    }

    #[must_use]
    pub fn with_rating(mut self, rating: RatingCalculator) -> Self {
        self.rating = rating;
        self
    }

    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.entry_sub.is_some()
    }

    fn entry_path(&self) -> String {
        self.config.namespace.queue_entry(&self.profile.user_id)
    }

    pub fn join(&mut self, mode: MatchMode, deck_id: Option<String>) -> Result<(), MatchmakingError> {
        let path = self.entry_path();
        if self.is_queued() || self.store.get(&path)?.is_some() {
            return Err(MatchmakingError::AlreadyQueued);
        }

        let entry = QueueEntry {
            user_id: self.profile.user_id.clone(),
            display_name: self.profile.display_name.clone(),
            mode,
            deck_id,
            rating: self.profile.rating,
            joined_at: self.store.server_timestamp(),
            match_id: None,
        };
        self.store.set(&path, serde_json::to_value(&entry)?)?;
        self.store.register_on_disconnect_write(&path, Value::Null)?;

        self.entry_sub = Some(self.store.subscribe(&path));
        self.mode = mode;
        self.last_scan = None;
        tracing::info!(user = %self.profile.user_id, mode = ?mode, rating = self.profile.rating, "joined queue");
        Ok(())
    }

    pub fn leave(&mut self) -> Result<(), MatchmakingError> {
        if !self.release() {
            return Ok(());
        }
        self.store.remove(&self.entry_path())?;
        tracing::info!(user = %self.profile.user_id, "left queue");
        Ok(())
    }

    /// Check for an assigned match, then scan if the interval allows.
    pub fn poll(&mut self, now: Instant) -> Result<QueuePoll, MatchmakingError> {
        let Some(sub) = self.entry_sub.as_mut() else {
            return Ok(QueuePoll::Idle);
        };

        let assigned = sub.drain().into_iter().find_map(|event| match event {
            StoreEvent::Value(Some(value)) => serde_json::from_value::<QueueEntry>(value).ok()?.match_id,
            _ => None,
        });
        if let Some(match_id) = assigned {
            self.release();
            // The creator normally removes it; make sure.
            self.store.remove(&self.entry_path())?;
            let quality = self.quality_from_record(&match_id);
            tracing::info!(user = %self.profile.user_id, match_id = %match_id, "matched by opponent");
            return Ok(QueuePoll::Matched(MatchFound {
                match_id,
                created: false,
                quality,
            }));
        }

        let interval = Duration::from_millis(self.config.poll_interval_ms);
        if self.last_scan.is_some_and(|last| now.saturating_duration_since(last) < interval) {
            return Ok(QueuePoll::Waiting);
        }
        self.last_scan = Some(now);
        self.scan()
    }

    fn scan(&mut self) -> Result<QueuePoll, MatchmakingError> {
        let ns = &self.config.namespace;
        let queue: BTreeMap<String, QueueEntry> = match self.store.get(&ns.queue())? {
            Some(Value::Object(entries)) => entries
                .into_iter()
                .filter_map(|(id, value)| Some((id, serde_json::from_value(value).ok()?)))
                .collect(),
            _ => BTreeMap::new(),
        };

        let me = &self.profile.user_id;
        let Some(mine) = queue.get(me) else {
            return Ok(QueuePoll::Waiting);
        };
        let Some(other) = select_candidate(me, self.mode, self.profile.rating, &queue) else {
            return Ok(QueuePoll::Waiting);
        };
        if !is_match_creator(me, mine.joined_at_ms(), &other.user_id, other.joined_at_ms()) {
            return Ok(QueuePoll::Waiting);
        }

        let match_id = create_match(&self.store, ns, self.mode, mine.slot(), other.slot(), true)?;
        let mut assignment = Map::new();
        assignment.insert("match_id".into(), Value::from(match_id.as_str()));
        self.store.update(&ns.queue_entry(&other.user_id), assignment)?;
        self.store.remove(&ns.queue_entry(&other.user_id))?;

        let quality = self.rating.match_quality(mine.rating, other.rating);
        tracing::info!(
            creator = %me,
            opponent = %other.user_id,
            match_id = %match_id,
            quality,
            "created match from queue"
        );
        self.release();
        self.store.remove(&self.entry_path())?;
        Ok(QueuePoll::Matched(MatchFound {
            match_id,
            created: true,
            quality: Some(quality),
        }))
    }

    fn quality_from_record(&self, match_id: &str) -> Option<u32> {
        let value = self.store.get(&self.config.namespace.match_path(match_id)).ok()??;
        let record: MatchRecord = serde_json::from_value(value).ok()?;
        let mine = record.seat_of(&self.profile.user_id)?;
        let theirs: PlayerNum = mine.opponent();
        Some(
            self.rating
                .match_quality(record.players[mine].rating, record.players[theirs].rating),
        )
    }

    /// Drop the watch and disconnect write. Returns whether we were queued.
    fn release(&mut self) -> bool {
        let Some(sub) = self.entry_sub.take() else {
            return false;
        };
        self.store.unsubscribe(sub.id());
        self.store.cancel_on_disconnect_write(&self.entry_path());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, mode: MatchMode, rating: i32) -> QueueEntry {
        QueueEntry {
            user_id: id.into(),
            mode,
            rating,
            joined_at: Value::from(10),
            ..QueueEntry::default()
        }
    }

    #[test]
    fn test_select_closest_rating_same_mode() {
        let mut queue = BTreeMap::new();
        for e in [
            entry("me", MatchMode::Ranked, 1200),
            entry("far", MatchMode::Ranked, 1600),
            entry("near", MatchMode::Ranked, 1260),
            entry("casual", MatchMode::Casual, 1200),
        ] {
            queue.insert(e.user_id.clone(), e);
        }

        let pick = select_candidate("me", MatchMode::Ranked, 1200, &queue).unwrap();
        assert_eq!(pick.user_id, "near");

        queue.get_mut("near").unwrap().match_id = Some("m".into());
        let pick = select_candidate("me", MatchMode::Ranked, 1200, &queue).unwrap();
        assert_eq!(pick.user_id, "far");

        assert!(select_candidate("casual", MatchMode::Casual, 1200, &queue).is_none());
    }

    #[test]
    fn test_creator_tie_break_is_symmetric() {
        assert!(is_match_creator("b", 5, "a", 9));
        assert!(!is_match_creator("a", 9, "b", 5));
        assert!(is_match_creator("a", 7, "b", 7));
        assert!(!is_match_creator("b", 7, "a", 7));
    }

    #[test]
    fn test_unresolved_join_time_sorts_last() {
        let pending = QueueEntry {
            joined_at: serde_json::json!({ ".sv": "timestamp" }),
            ..QueueEntry::default()
        };
        assert_eq!(pending.joined_at_ms(), u64::MAX);
    }
}
