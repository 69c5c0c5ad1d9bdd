//! Core types: seats, instance ids, state, actions, events, errors, RNG,
//! configuration.
//!
//! ## Key Types
//!
//! - `PlayerNum`: seat 1 or 2
//! - `PlayerMap<T>`: per-seat storage
//! - `InstanceId`: unique card instance id, allocated by `InstanceAllocator`
//! - `MatchState` / `PlayerState`: the mirrored match aggregate
//! - `GameAction` / `ActionRecord`: actions and their log form
//! - `GameEvent` / `EventQueue`: outbound domain events
//! - `ActionError`: player-facing rejection reasons
//! - `GameRng` / `DiceSource`: deterministic randomness

pub mod action;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod player;
pub mod rng;
pub mod state;

pub use action::{ActionRecord, GameAction};
pub use config::{ArcadeConfig, EngineConfig};
pub use entity::{InstanceAllocator, InstanceId};
pub use error::{ActionError, SnapshotError};
pub use event::{EventQueue, GameEvent};
pub use player::{PlayerMap, PlayerNum};
pub use rng::{DiceSource, FixedDice, GameRng, GameRngState};
pub use state::{BlockAssignment, CombatStep, MatchState, Phase, PlayerState, ResourceToken};
