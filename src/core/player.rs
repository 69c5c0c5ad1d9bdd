//! Player seats and per-player data storage.
//!
//! ## PlayerNum
//!
//! A match always has exactly two seats, numbered 1 and 2 the way the
//! store documents and the UI number them. Player 1 takes the first turn.
//!
//! ## PlayerMap
//!
//! Fixed two-slot storage indexed by `PlayerNum`. Serializes as an object
//! keyed `"1"` / `"2"` so match snapshots read naturally in the store.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two seats in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlayerNum {
    One,
    Two,
}

impl PlayerNum {
    /// Both seats in turn order.
    pub const BOTH: [PlayerNum; 2] = [PlayerNum::One, PlayerNum::Two];

    /// The seat number as shown to players (1 or 2).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            PlayerNum::One => 1,
            PlayerNum::Two => 2,
        }
    }

    /// 0-based index for array storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            PlayerNum::One => 0,
            PlayerNum::Two => 1,
        }
    }

    /// The other seat.
    ///
    /// ```
    /// use riutiz_ccg::core::PlayerNum;
    ///
    /// assert_eq!(PlayerNum::One.opponent(), PlayerNum::Two);
    /// assert_eq!(PlayerNum::Two.opponent(), PlayerNum::One);
    /// ```
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            PlayerNum::One => PlayerNum::Two,
            PlayerNum::Two => PlayerNum::One,
        }
    }

    /// Parse a seat number, `None` for anything but 1 or 2.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(PlayerNum::One),
            2 => Some(PlayerNum::Two),
            _ => None,
        }
    }
}

impl From<PlayerNum> for u8 {
    fn from(player: PlayerNum) -> Self {
        player.number()
    }
}

impl TryFrom<u8> for PlayerNum {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PlayerNum::from_number(value).ok_or_else(|| format!("invalid player number {value}"))
    }
}

impl std::fmt::Display for PlayerNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Per-seat storage for a two-player match.
///
/// ## Example
///
/// ```
/// use riutiz_ccg::core::{PlayerMap, PlayerNum};
///
/// let mut points: PlayerMap<u32> = PlayerMap::with_value(0);
/// points[PlayerNum::Two] += 4;
///
/// assert_eq!(points[PlayerNum::One], 0);
/// assert_eq!(points[PlayerNum::Two], 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    #[serde(rename = "1")]
    one: T,
    #[serde(rename = "2")]
    two: T,
}

impl<T> PlayerMap<T> {
    /// Create a map with values from a factory function.
    pub fn new(factory: impl Fn(PlayerNum) -> T) -> Self {
        Self {
            one: factory(PlayerNum::One),
            two: factory(PlayerNum::Two),
        }
    }

    /// Create a map with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            one: value.clone(),
            two: value,
        }
    }

    /// Create a map with default values.
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new(|_| T::default())
    }

    #[must_use]
    pub fn get(&self, player: PlayerNum) -> &T {
        match player {
            PlayerNum::One => &self.one,
            PlayerNum::Two => &self.two,
        }
    }

    pub fn get_mut(&mut self, player: PlayerNum) -> &mut T {
        match player {
            PlayerNum::One => &mut self.one,
            PlayerNum::Two => &mut self.two,
        }
    }

    /// Mutable access to both entries at once, active seat first.
    pub fn split_mut(&mut self, first: PlayerNum) -> (&mut T, &mut T) {
        match first {
            PlayerNum::One => (&mut self.one, &mut self.two),
            PlayerNum::Two => (&mut self.two, &mut self.one),
        }
    }

    /// Iterate over (PlayerNum, &T) pairs in seat order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerNum, &T)> {
        [(PlayerNum::One, &self.one), (PlayerNum::Two, &self.two)].into_iter()
    }

    /// Iterate over (PlayerNum, &mut T) pairs in seat order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerNum, &mut T)> {
        [(PlayerNum::One, &mut self.one), (PlayerNum::Two, &mut self.two)].into_iter()
    }
}

impl<T> Index<PlayerNum> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerNum) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerNum> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerNum) -> &mut Self::Output {
        self.get_mut(player)
    }
}
