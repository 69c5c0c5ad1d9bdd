//! # riutiz-ccg
//!
//! Rules engine, AI opponent and peer-to-peer match sync for Riutiz, a
//! two-player collectible card game played between browser clients with
//! no game server.
//!
//! ## Design Principles
//!
//! 1. **Engine owns the rules**: every mutation goes through a
//!    `GameEngine` operation that validates fully before writing, and
//!    returns a typed `ActionError` on rejection.
//!
//! 2. **Whole-state snapshots**: `MatchState` is one serialisable value,
//!    including the instance id allocator and RNG, so a peer can replace
//!    its state wholesale and carry on.
//!
//! 3. **Injected collaborators**: stores, dice, result recorders and
//!    configuration are passed in at construction. Nothing is global.
//!
//! ## Architecture
//!
//! - **Write authority**: only the active player (and the defender while
//!   blockers are declared) writes shared state. The other client replays
//!   the action log and mirrors the published snapshot.
//!
//! - **Persistent Data Structures**: zones are `im` vectors, so snapshots
//!   and AI reads are O(1) clones.
//!
//! - **Deterministic dice**: combat rolls come from the RNG carried in the
//!   state, so a replayed action rolls the same on both peers.
//!
//! ## Modules
//!
//! - `core`: seats, ids, state, actions, events, errors, RNG, configuration
//! - `cards`: card definitions, structured abilities, cost and dice grammars
//! - `zones`: zone movement and the zone exclusivity check
//! - `rules`: `GameEngine`, combat resolution, match setup
//! - `ai`: heuristic AI opponent with personalities
//! - `sync`: remote store contract and the sync coordinator
//! - `matchmaking`: queue, lobbies, match creation
//! - `rating`: ELO ratings and tiers

pub mod ai;
pub mod cards;
pub mod core;
pub mod matchmaking;
pub mod rating;
pub mod rules;
pub mod sync;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{
    ActionError, ActionRecord, ArcadeConfig, DiceSource, EngineConfig, EventQueue, FixedDice, GameAction, GameEvent,
    GameRng, GameRngState, InstanceId, MatchState, Phase, PlayerMap, PlayerNum, PlayerState,
};

pub use crate::cards::{Abilities, CardDefinition, CardInstance, CardRegistry, CardType, Color, Effect, Keyword};

pub use crate::rules::{ActionOutcome, Authority, CombatReport, CombatResolver, GameEngine, MatchBuilder};

pub use crate::ai::{AiOpponent, AiPacing, Personality};

pub use crate::sync::{
    InMemoryStore, MatchRecord, RemoteStore, Spectator, SyncConfig, SyncCoordinator, SyncError, SyncNotification,
};

pub use crate::matchmaking::{Lobby, MatchmakingConfig, MatchmakingError, MatchmakingQueue};

pub use crate::rating::{RatingCalculator, RatingConfig, Tier};
