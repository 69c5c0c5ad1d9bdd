//! Zone system for card locations.
//!
//! Each player owns five zones: deck, hand, field, discard and resources.
//! An instance lives in exactly one of them at a time.
//!
//! ## Key Types
//!
//! - `Zone`: zone identifier
//! - `locate`: find the owner and zone of an instance
//! - `find_duplicate_instance`: zone exclusivity check

pub mod manager;

pub use manager::{find_duplicate_instance, locate, Zone};
