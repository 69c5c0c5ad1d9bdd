//! AI opponent.
//!
//! The AI is just another player: it reads the engine state and calls the
//! same operations a human client does. Decisions are small weighted
//! heuristics, never a search.
//!
//! ## Key Types
//!
//! - `AiOpponent`: drives one seat with async pacing
//! - `Personality` / `PersonalityParams`: named weightings
//! - `card_value`: the shared card heuristic
//! - `AiPacing`: thinking and action delays

pub mod evaluate;
pub mod opponent;
pub mod personality;

pub use evaluate::{card_value, expected_damage};
pub use opponent::{AiOpponent, AiPacing, BlockPlan, TurnSummary};
pub use personality::{Personality, PersonalityParams};
