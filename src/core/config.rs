//! Engine configuration and the aggregate arcade settings.
//!
//! Every component takes its own config struct at construction. Each has a
//! `Default` holding the live game's constants plus `with_*` builders.
//! `ArcadeConfig` bundles them for loading from a single JSON document;
//! missing fields fall back to defaults.
//!
//! ```
//! use riutiz_ccg::core::ArcadeConfig;
//!
//! let config = ArcadeConfig::from_json(r#"{ "engine": { "win_threshold": 10 } }"#).unwrap();
//! assert_eq!(config.engine.win_threshold, 10);
//! assert_eq!(config.engine.starting_hand_size, 7);
//! assert_eq!(config.sync.turn_time_limit_ms, 60_000);
//! ```

use serde::{Deserialize, Serialize};

use crate::ai::AiPacing;
use crate::matchmaking::MatchmakingConfig;
use crate::rating::RatingConfig;
use crate::sync::SyncConfig;

/// Rules constants for a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Points needed to win.
    pub win_threshold: u32,

    /// Cards dealt to each hand at match start.
    pub starting_hand_size: usize,

    /// Size of a deck built at random from the card pool.
    pub random_deck_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            win_threshold: 25,
            starting_hand_size: 7,
            random_deck_size: 40,
        }
    }
}

impl EngineConfig {
    pub fn with_win_threshold(mut self, points: u32) -> Self {
        self.win_threshold = points;
        self
    }

    pub fn with_starting_hand_size(mut self, cards: usize) -> Self {
        self.starting_hand_size = cards;
        self
    }

    pub fn with_random_deck_size(mut self, cards: usize) -> Self {
        self.random_deck_size = cards;
        self
    }
}

/// All component settings in one document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub engine: EngineConfig,
    pub sync: SyncConfig,
    pub matchmaking: MatchmakingConfig,
    pub rating: RatingConfig,
    pub ai: AiPacing,
}

impl ArcadeConfig {
    /// Parse settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
