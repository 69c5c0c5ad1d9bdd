//! Rules: the match state machine and everything it leans on.
//!
//! ## Key Types
//!
//! - `GameEngine`: validated player operations over one `MatchState`
//! - `authority`: the single write-authority gate shared with sync
//! - `CombatResolver` / `CombatReport`: dice, damage, deaths and points
//! - `can_afford` / `pay_cost`: resource accounting
//! - `MatchBuilder`: decks, shuffles and opening hands

pub mod authority;
pub mod combat;
pub mod engine;
pub mod payment;
pub mod setup;

pub use authority::{authority, Authority};
pub use combat::{CombatLogEntry, CombatReport, CombatResolver};
pub use engine::{token_definition, ActionOutcome, ActionResult, GameEngine, TOKEN_CARD_ID};
pub use payment::{can_afford, pay_cost};
pub use setup::{MatchBuilder, SetupError};
