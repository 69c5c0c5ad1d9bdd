//! Store documents and the paths they live at.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{ActionRecord, MatchState, Phase, PlayerMap, PlayerNum};

/// Prefix for every store path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespace {
    pub root: String,
    pub game: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Self {
            root: "arcade".to_string(),
            game: "riutiz".to_string(),
        }
    }
}

impl Namespace {
    #[must_use]
    pub fn new(root: impl Into<String>, game: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            game: game.into(),
        }
    }

    #[must_use]
    pub fn matches(&self) -> String {
        format!("{}/matches/{}", self.root, self.game)
    }

    #[must_use]
    pub fn match_path(&self, match_id: &str) -> String {
        format!("{}/{match_id}", self.matches())
    }

    #[must_use]
    pub fn queue(&self) -> String {
        format!("{}/matchmaking/{}/queue", self.root, self.game)
    }

    #[must_use]
    pub fn queue_entry(&self, user_id: &str) -> String {
        format!("{}/{user_id}", self.queue())
    }

    #[must_use]
    pub fn lobbies(&self) -> String {
        format!("{}/matchmaking/{}/lobbies", self.root, self.game)
    }

    #[must_use]
    pub fn lobby_path(&self, lobby_id: &str) -> String {
        format!("{}/{lobby_id}", self.lobbies())
    }

    #[must_use]
    pub fn spectators(&self, match_id: &str) -> String {
        format!("{}/spectating/{match_id}/spectators", self.root)
    }

    #[must_use]
    pub fn spectator(&self, match_id: &str, user_id: &str) -> String {
        format!("{}/{user_id}", self.spectators(match_id))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Casual,
    Ranked,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Starting,
    Active,
    Completed,
    Abandoned,
}

impl MatchStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Abandoned)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    Points,
    Forfeit,
    OpponentTimeout,
}

/// One seat of a match document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSlot {
    pub user_id: String,
    pub display_name: String,
    pub deck_id: Option<String>,
    pub rating: i32,
    pub connected: bool,
    pub last_action: Value,
    pub points: u32,
}

impl PlayerSlot {
    #[must_use]
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_deck(mut self, deck_id: Option<String>) -> Self {
        self.deck_id = deck_id;
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }
}

/// The match document at `matches/{game}/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRecord {
    pub id: String,
    pub game: String,
    pub mode: MatchMode,
    pub status: MatchStatus,
    pub created_at: Value,
    pub started_at: Value,
    pub ended_at: Value,
    pub turn: u32,
    pub current_player: PlayerNum,
    pub phase: Phase,
    pub players: PlayerMap<PlayerSlot>,
    pub game_state: Option<MatchState>,
    /// Keyed by push key, so iteration is log order.
    pub action_log: BTreeMap<String, ActionRecord>,
    pub spectator_count: u32,
    pub allow_spectators: bool,
    pub winner: Option<PlayerNum>,
    pub win_reason: Option<WinReason>,
    pub abandoned_by: Option<PlayerNum>,
}

impl Default for MatchRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            game: String::new(),
            mode: MatchMode::Casual,
            status: MatchStatus::Starting,
            created_at: Value::Null,
            started_at: Value::Null,
            ended_at: Value::Null,
            turn: 1,
            current_player: PlayerNum::One,
            phase: Phase::Draw,
            players: PlayerMap::with_default(),
            game_state: None,
            action_log: BTreeMap::new(),
            spectator_count: 0,
            allow_spectators: true,
            winner: None,
            win_reason: None,
            abandoned_by: None,
        }
    }
}

impl MatchRecord {
    /// Seat whose slot belongs to `user_id`.
    #[must_use]
    pub fn seat_of(&self, user_id: &str) -> Option<PlayerNum> {
        self.players
            .iter()
            .find(|(_, slot)| slot.user_id == user_id)
            .map(|(seat, _)| seat)
    }

    #[must_use]
    pub fn is_ranked(&self) -> bool {
        self.mode == MatchMode::Ranked
    }
}
