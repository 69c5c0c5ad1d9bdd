//! Finding opponents and opening matches.
//!
//! ## Key Types
//!
//! - `MatchmakingQueue`: rating-ordered public queue with a symmetric
//!   creator tie-break
//! - `Lobby`: private host/guest rooms joined by code
//! - `create_match`: writes a fresh `MatchRecord` for two seats

pub mod factory;
pub mod lobby;
pub mod queue;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sync::{Namespace, StoreError};

pub use factory::{active_matches, create_match};
pub use lobby::{
    active_lobbies, generate_join_code, Lobby, LobbyEvent, LobbyMember, LobbyRecord, LobbyStatus, JOIN_CODE_ALPHABET,
};
pub use queue::{is_match_creator, select_candidate, MatchFound, MatchmakingQueue, QueueEntry, QueuePoll};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    /// Minimum time between queue scans.
    pub poll_interval_ms: u64,
    pub join_code_length: usize,
    pub max_lobby_players: usize,
    pub namespace: Namespace,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            join_code_length: 6,
            max_lobby_players: 2,
            namespace: Namespace::default(),
        }
    }
}

impl MatchmakingConfig {
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }
}

#[derive(Debug, Error)]
pub enum MatchmakingError {
    #[error("Already in queue")]
    AlreadyQueued,

    #[error("Lobby not found")]
    LobbyNotFound,

    #[error("Lobby is full")]
    LobbyFull,

    #[error("Lobby is no longer accepting players")]
    LobbyClosed,

    #[error("Only the host can do that")]
    NotHost,

    #[error("Cannot kick yourself")]
    CannotKickSelf,

    #[error("Need at least 2 players")]
    NotEnoughPlayers,

    #[error("All players must be ready")]
    NotAllReady,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for MatchmakingError {
    fn from(err: serde_json::Error) -> Self {
        MatchmakingError::Store(err.into())
    }
}
