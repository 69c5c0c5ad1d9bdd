//! Two-peer match synchronisation over a `RemoteStore`.
//!
//! There is no arbiter. Each client runs its own `GameEngine` and follows
//! one discipline: only the player holding write authority (the active
//! player, or the defender while blockers are declared) appends to the
//! action log and publishes the whole state. The other client replays the
//! logged action and then, while it is not its turn, replaces its state
//! with the published snapshot.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::presence::{PresenceMachine, Transition, TurnTimer};
use super::record::{MatchRecord, MatchStatus, Namespace, PlayerSlot, WinReason};
use super::recorder::{GameResult, PlayerProfile, ResultRecorder};
use super::store::{join_path, RemoteStore, StoreError, StoreEvent, Subscription};
use crate::core::{ActionError, ActionRecord, GameAction, PlayerNum, SnapshotError};
use crate::rating::RatingCalculator;
use crate::rules::{ActionOutcome, Authority, GameEngine};

/// Timing and store layout for synchronised matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub turn_time_limit_ms: u64,
    pub reconnect_grace_ms: u64,
    /// End the local turn when the turn timer fires.
    pub auto_end_turn_on_timeout: bool,
    pub namespace: Namespace,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            turn_time_limit_ms: 60_000,
            reconnect_grace_ms: 120_000,
            auto_end_turn_on_timeout: true,
            namespace: Namespace::default(),
        }
    }
}

impl SyncConfig {
    pub fn with_turn_time_limit_ms(mut self, ms: u64) -> Self {
        self.turn_time_limit_ms = ms;
        self
    }

    pub fn with_reconnect_grace_ms(mut self, ms: u64) -> Self {
        self.reconnect_grace_ms = ms;
        self
    }

    pub fn with_auto_end_turn(mut self, enabled: bool) -> Self {
        self.auto_end_turn_on_timeout = enabled;
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("You are not a player in this match")]
    NotAParticipant,

    #[error("Spectating is disabled for this match")]
    SpectatingDisabled,

    #[error("Match is already over")]
    MatchOver,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Action(#[from] ActionError),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Store(err.into())
    }
}

/// Something the UI should hear about.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncNotification {
    StateLoaded { current_player: PlayerNum },
    ActionReplayed { player: PlayerNum, action: GameAction },
    ReplayRejected { action: GameAction, error: ActionError },
    OpponentDisconnected,
    OpponentReconnected,
    ConnectionLost,
    ConnectionRestored,
    TurnTimedOut { auto_ended: bool },
    MatchEnded {
        winner: Option<PlayerNum>,
        reason: Option<WinReason>,
        status: MatchStatus,
    },
    PublishFailed(StoreError),
}

/// Read and parse a match document.
pub(crate) fn fetch_record(store: &impl RemoteStore, ns: &Namespace, match_id: &str) -> Result<MatchRecord, SyncError> {
    let value = store
        .get(&ns.match_path(match_id))?
        .ok_or_else(|| SyncError::MatchNotFound(match_id.to_string()))?;
    Ok(serde_json::from_value(value)?)
}

/// One client's side of a synchronised match.
pub struct SyncCoordinator<S: RemoteStore, R: ResultRecorder> {
    store: S,
    recorder: R,
    profile: PlayerProfile,
    config: SyncConfig,
    rating: RatingCalculator,
    match_id: String,
    match_path: String,
    local: PlayerNum,
    opponent: PlayerSlot,
    ranked: bool,
    match_sub: Subscription,
    log_sub: Subscription,
    opponent_sub: Subscription,
    link_sub: Subscription,
    presence: PresenceMachine,
    timer: TurnTimer,
    opponent_seen: bool,
    sequence: u64,
    pending: Vec<SyncNotification>,
    finished: bool,
    closed: bool,
}

impl<S: RemoteStore, R: ResultRecorder> SyncCoordinator<S, R> {
    /// Take the local seat in `match_id`.
    pub fn join(
        store: S,
        mut recorder: R,
        profile: PlayerProfile,
        match_id: &str,
        config: SyncConfig,
        now: Instant,
    ) -> Result<Self, SyncError> {
        let ns = &config.namespace;
        let record = fetch_record(&store, ns, match_id)?;
        let local = record.seat_of(&profile.user_id).ok_or(SyncError::NotAParticipant)?;
        if record.status.is_terminal() {
            return Err(SyncError::MatchOver);
        }

        let match_path = ns.match_path(match_id);
        mark_connected(&store, &match_path, local)?;

        let opponent_flag = join_path(&match_path, &format!("players/{}/connected", local.opponent().number()));
        let match_sub = store.subscribe(&match_path);
        let log_sub = store.on_child_added(&join_path(&match_path, "action_log"));
        let opponent_sub = store.subscribe(&opponent_flag);
        let link_sub = store.connection_state();

        recorder.set_current_match(Some(match_id));
        tracing::info!(match_id, player = %local, user = %profile.user_id, "joined match");

        let presence = PresenceMachine::new(Duration::from_millis(config.reconnect_grace_ms));
        let mut timer = TurnTimer::new(Duration::from_millis(config.turn_time_limit_ms));
        timer.observe(record.current_player, now);

        Ok(Self {
            store,
            recorder,
            profile,
            rating: RatingCalculator::default(),
            match_id: match_id.to_string(),
            match_path,
            local,
            opponent: record.players[local.opponent()].clone(),
            ranked: record.is_ranked(),
            match_sub,
            log_sub,
            opponent_sub,
            link_sub,
            presence,
            timer,
            opponent_seen: false,
            sequence: 0,
            pending: Vec::new(),
            finished: false,
            closed: false,
            config,
        })
    }

    #[must_use]
    pub fn with_rating(mut self, rating: RatingCalculator) -> Self {
        self.rating = rating;
        self
    }

    #[must_use]
    pub fn local_player(&self) -> PlayerNum {
        self.local
    }

    #[must_use]
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn presence(&self) -> &PresenceMachine {
        &self.presence
    }

    #[must_use]
    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn remaining_turn_time(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }

    /// Publish or load the opening state, then mark the match active.
    pub fn initialize_game(&mut self, engine: &mut GameEngine, now: Instant) -> Result<(), SyncError> {
        let record = fetch_record(&self.store, &self.config.namespace, &self.match_id)?;
        match record.game_state {
            None if self.local == PlayerNum::One => self.publish_state(engine)?,
            Some(state) => {
                if *engine.state() != state {
                    engine.load_state(state);
                }
            }
            None => {}
        }

        let mut fields = Map::new();
        fields.insert("status".into(), serde_json::to_value(MatchStatus::Active)?);
        if record.started_at.is_null() {
            fields.insert("started_at".into(), self.store.server_timestamp());
        }
        self.store.update(&self.match_path, fields)?;
        self.timer.observe(engine.state().current_player, now);
        tracing::info!(match_id = %self.match_id, player = %self.local, "match initialised");
        Ok(())
    }

    /// Apply a local action and share it.
    ///
    /// Store faults after the action has been applied do not fail the
    /// call; they come back from the next `poll` as `PublishFailed`.
    pub fn perform(&mut self, engine: &mut GameEngine, action: &GameAction, now: Instant) -> Result<ActionOutcome, SyncError> {
        if self.finished {
            return Err(SyncError::MatchOver);
        }
        match engine.authority(self.local) {
            Authority::Full => {}
            Authority::BlockersOnly if action.is_blocking_action() => {}
            Authority::BlockersOnly | Authority::ReadOnly => return Err(ActionError::NotYourTurn.into()),
        }

        let turn = engine.state().turn;
        let outcome = engine.apply(self.local, action)?;
        self.sequence += 1;
        tracing::debug!(player = %self.local, action = action.name(), sequence = self.sequence, "local action");

        let record = ActionRecord::new(self.local, turn, self.sequence, action.clone())
            .with_timestamp(self.store.server_timestamp());
        if let Err(err) = self.append_log(&record).and_then(|()| self.publish_state(engine)) {
            self.publish_failed(err);
        }

        if let Some(winner) = engine.state().winner.filter(|_| engine.state().game_over) {
            self.end_match(winner, WinReason::Points, MatchStatus::Completed, None);
        }
        self.timer.observe(engine.state().current_player, now);
        Ok(outcome)
    }

    /// Process everything the store has pushed, then the timers.
    pub fn poll(&mut self, engine: &mut GameEngine, now: Instant) -> Vec<SyncNotification> {
        let mut out = std::mem::take(&mut self.pending);

        for event in self.link_sub.drain() {
            if let StoreEvent::Connection(up) = event {
                self.on_link(up, now, &mut out);
            }
        }

        for event in self.log_sub.drain() {
            if let StoreEvent::ChildAdded { key, value } = event {
                self.replay(engine, &key, value, &mut out);
            }
        }

        if let Some(Some(value)) = self.match_sub.latest_value() {
            self.on_snapshot(engine, value, &mut out);
        }

        for event in self.opponent_sub.drain() {
            if let StoreEvent::Value(value) = event {
                let connected = value.as_ref().and_then(Value::as_bool).unwrap_or(false);
                self.on_opponent_flag(connected, now, &mut out);
            }
        }

        if !self.finished && self.presence.tick(now) == Some(Transition::GraceExpired) {
            tracing::info!(match_id = %self.match_id, "opponent did not return; awarding match");
            self.end_match(self.local, WinReason::OpponentTimeout, MatchStatus::Completed, None);
        }

        self.timer.observe(engine.state().current_player, now);
        if !self.finished && self.timer.check(self.local, now) {
            let auto_ended = self.config.auto_end_turn_on_timeout
                && self.perform(engine, &GameAction::EndTurn, now).is_ok();
            tracing::info!(player = %self.local, auto_ended, "turn timed out");
            out.push(SyncNotification::TurnTimedOut { auto_ended });
        }

        out.append(&mut self.pending);
        out
    }

    /// Concede. The opponent is written as winner.
    pub fn forfeit(&mut self) -> Result<(), SyncError> {
        if self.finished {
            return Err(SyncError::MatchOver);
        }
        let winner = self.local.opponent();
        self.write_terminal(winner, WinReason::Forfeit, MatchStatus::Abandoned, Some(self.local))?;
        self.finish(Some(winner), Some(WinReason::Forfeit), MatchStatus::Abandoned);
        Ok(())
    }

    /// Stop listening, cancel timers and the on-disconnect write, and mark
    /// the local seat disconnected.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for id in [self.match_sub.id(), self.log_sub.id(), self.opponent_sub.id(), self.link_sub.id()] {
            self.store.unsubscribe(id);
        }
        self.presence.cancel();
        self.timer.cancel();

        let flag = self.connected_path(self.local);
        self.store.cancel_on_disconnect_write(&flag);
        if let Err(err) = self.store.set(&flag, Value::Bool(false)) {
            tracing::warn!(error = %err, "could not clear connected flag");
        }
        tracing::debug!(match_id = %self.match_id, "sync coordinator shut down");
    }

    // === Inbound ===

    fn on_link(&mut self, up: bool, now: Instant, out: &mut Vec<SyncNotification>) {
        match self.presence.link(up, now) {
            Some(Transition::LinkLost) => {
                tracing::warn!(match_id = %self.match_id, "store connection lost");
                out.push(SyncNotification::ConnectionLost);
            }
            Some(transition @ (Transition::LinkRestored | Transition::OpponentDisconnected)) => {
                // The store fired our disconnect write while we were away.
                if let Err(err) = mark_connected(&self.store, &self.match_path, self.local) {
                    tracing::warn!(error = %err, "could not restore presence");
                }
                out.push(SyncNotification::ConnectionRestored);
                if transition == Transition::OpponentDisconnected && self.opponent_seen {
                    out.push(SyncNotification::OpponentDisconnected);
                }
            }
            _ => {}
        }
    }

    fn replay(&mut self, engine: &mut GameEngine, key: &str, value: Value, out: &mut Vec<SyncNotification>) {
        let record: ActionRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(key, error = %err, "unreadable log entry");
                return;
            }
        };
        if record.player == self.local || self.finished {
            return;
        }
        match engine.apply(record.player, &record.action) {
            Ok(_) => {
                tracing::debug!(player = %record.player, action = record.action.name(), "replayed action");
                out.push(SyncNotification::ActionReplayed {
                    player: record.player,
                    action: record.action,
                });
            }
            Err(error) => {
                tracing::warn!(player = %record.player, action = record.action.name(), %error, "replay rejected");
                out.push(SyncNotification::ReplayRejected {
                    action: record.action,
                    error,
                });
            }
        }
    }

    fn on_snapshot(&mut self, engine: &mut GameEngine, value: Value, out: &mut Vec<SyncNotification>) {
        let record: MatchRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(match_id = %self.match_id, error = %err, "unreadable match document");
                return;
            }
        };
        self.opponent = record.players[self.local.opponent()].clone();

        if let Some(state) = record.game_state {
            if state.current_player != self.local && *engine.state() != state {
                let current_player = state.current_player;
                engine.load_state(state);
                out.push(SyncNotification::StateLoaded { current_player });
            }
        }

        if record.status.is_terminal() && !self.finished {
            self.finish(record.winner, record.win_reason, record.status);
            out.push(SyncNotification::MatchEnded {
                winner: record.winner,
                reason: record.win_reason,
                status: record.status,
            });
        }
    }

    fn on_opponent_flag(&mut self, connected: bool, now: Instant, out: &mut Vec<SyncNotification>) {
        // An opponent who has not joined yet is not "disconnected".
        if connected {
            self.opponent_seen = true;
        }
        if !self.opponent_seen || self.finished {
            return;
        }
        match self.presence.opponent_flag(connected, now) {
            Some(Transition::OpponentDisconnected) => {
                tracing::info!(match_id = %self.match_id, "opponent disconnected");
                out.push(SyncNotification::OpponentDisconnected);
            }
            Some(Transition::OpponentReconnected) => {
                tracing::info!(match_id = %self.match_id, "opponent reconnected");
                out.push(SyncNotification::OpponentReconnected);
            }
            _ => {}
        }
    }

    // === Outbound ===

    fn connected_path(&self, player: PlayerNum) -> String {
        join_path(&self.match_path, &format!("players/{}/connected", player.number()))
    }

    fn append_log(&self, record: &ActionRecord) -> Result<(), SyncError> {
        let log = join_path(&self.match_path, "action_log");
        let key = self.store.push_unique_key(&log);
        self.store.set(&join_path(&log, &key), serde_json::to_value(record)?)?;
        Ok(())
    }

    fn publish_state(&self, engine: &GameEngine) -> Result<(), SyncError> {
        let state = engine.state();
        let mut fields = Map::new();
        fields.insert("game_state".into(), serde_json::to_value(state)?);
        fields.insert("turn".into(), Value::from(state.turn));
        fields.insert("current_player".into(), serde_json::to_value(state.current_player)?);
        fields.insert("phase".into(), serde_json::to_value(state.phase)?);
        for (seat, player) in state.players.iter() {
            fields.insert(format!("players/{}/points", seat.number()), Value::from(player.points));
        }
        fields.insert(
            format!("players/{}/last_action", self.local.number()),
            self.store.server_timestamp(),
        );
        self.store.update(&self.match_path, fields)?;
        Ok(())
    }

    fn publish_failed(&mut self, err: SyncError) {
        tracing::warn!(match_id = %self.match_id, error = %err, "publish failed");
        let err = match err {
            SyncError::Store(err) => err,
            other => StoreError::WriteRejected(other.to_string()),
        };
        self.pending.push(SyncNotification::PublishFailed(err));
    }

    fn write_terminal(
        &self,
        winner: PlayerNum,
        reason: WinReason,
        status: MatchStatus,
        abandoned_by: Option<PlayerNum>,
    ) -> Result<(), SyncError> {
        let mut fields = Map::new();
        fields.insert("status".into(), serde_json::to_value(status)?);
        fields.insert("winner".into(), serde_json::to_value(winner)?);
        fields.insert("win_reason".into(), serde_json::to_value(reason)?);
        fields.insert("ended_at".into(), self.store.server_timestamp());
        if let Some(player) = abandoned_by {
            fields.insert("abandoned_by".into(), serde_json::to_value(player)?);
        }
        self.store.update(&self.match_path, fields)?;
        Ok(())
    }

    fn end_match(&mut self, winner: PlayerNum, reason: WinReason, status: MatchStatus, abandoned_by: Option<PlayerNum>) {
        if let Err(err) = self.write_terminal(winner, reason, status, abandoned_by) {
            self.publish_failed(err);
        }
        self.finish(Some(winner), Some(reason), status);
        self.pending.push(SyncNotification::MatchEnded {
            winner: Some(winner),
            reason: Some(reason),
            status,
        });
    }

    /// Record the local result once.
    fn finish(&mut self, winner: Option<PlayerNum>, reason: Option<WinReason>, status: MatchStatus) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.presence.cancel();
        self.timer.cancel();

        let won = winner == Some(self.local);
        let rating_change = self.ranked.then(|| {
            self.rating
                .calculate(self.profile.rating, self.opponent.rating, won, self.profile.ranked_games)
        });
        let result = GameResult {
            match_id: self.match_id.clone(),
            won,
            opponent: self.opponent.display_name.clone(),
            ranked: self.ranked,
            opponent_rating: self.opponent.rating,
            forfeit: reason == Some(WinReason::Forfeit),
            timeout: reason == Some(WinReason::OpponentTimeout),
            rating_change,
        };
        tracing::info!(match_id = %self.match_id, won, status = ?status, "match finished");
        self.recorder.record_result(&result);
        self.recorder.set_current_match(None);
    }
}

impl<S: RemoteStore, R: ResultRecorder> Drop for SyncCoordinator<S, R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn mark_connected(store: &impl RemoteStore, match_path: &str, seat: PlayerNum) -> Result<(), StoreError> {
    let slot = format!("players/{}", seat.number());
    let mut fields = Map::new();
    fields.insert(format!("{slot}/connected"), Value::Bool(true));
    fields.insert(format!("{slot}/last_action"), store.server_timestamp());
    store.update(match_path, fields)?;
    store.register_on_disconnect_write(&join_path(match_path, &format!("{slot}/connected")), Value::Bool(false))
}
