//! Card instance identification.
//!
//! Every card object in a match (deck cards, hand cards, tokens created
//! mid-combat) carries an `InstanceId` that is unique for the lifetime of
//! the match and never reused.
//!
//! ## Allocation
//!
//! Ids come from an `InstanceAllocator` that lives inside `MatchState`, so
//! the counter is part of every snapshot. A peer that loads a snapshot keeps
//! allocating from where the publisher stopped.
//!
//! ```
//! use riutiz_ccg::core::InstanceAllocator;
//!
//! let mut ids = InstanceAllocator::default();
//! let first = ids.next_id();
//! let second = ids.next_id();
//!
//! assert_ne!(first, second);
//! assert_eq!(first.raw() + 1, second.raw());
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a card instance within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl InstanceId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic instance id counter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceAllocator {
    next: u32,
}

impl Default for InstanceAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl InstanceAllocator {
    /// Allocate a fresh id.
    pub fn next_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next);
        self.next += 1;
        id
    }

    /// The id the next allocation will return.
    #[must_use]
    pub const fn peek(&self) -> InstanceId {
        InstanceId(self.next)
    }
}
