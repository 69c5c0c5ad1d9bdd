//! Ranked play: ELO updates, tiers and pairing quality.
//!
//! All pure functions; nothing here touches a store.
//!
//! ## Key Types
//!
//! - `RatingCalculator`: expected score, K-factor, rating changes
//! - `RatingConfig`: the ELO constants
//! - `Tier` / `TierProgress`: display bands

pub mod elo;
pub mod tier;

pub use elo::{MatchRatingResult, RatedPlayer, RatingCalculator, RatingChange, RatingConfig, RatingRange};
pub use tier::{Tier, TierProgress};
