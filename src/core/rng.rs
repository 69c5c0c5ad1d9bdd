//! Deterministic random number generation and dice sources.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Serializable**: O(1) state capture and restore, so the RNG travels
//!   inside match snapshots and both peers roll the same dice on replay
//! - **Context streams**: Independent sequences for deck shuffles and AI
//!
//! ## Dice
//!
//! Combat rolls go through the `DiceSource` trait. `GameRng` is the live
//! source; `FixedDice` returns a scripted sequence for tests.
//!
//! ```
//! use riutiz_ccg::core::{DiceSource, FixedDice, GameRng};
//!
//! let mut rng = GameRng::new(7);
//! let roll = rng.roll_die(6);
//! assert!((1..=6).contains(&roll));
//!
//! let mut fixed = FixedDice::new([6, 3]);
//! assert_eq!(fixed.roll_die(20), 6);
//! assert_eq!(fixed.roll_die(20), 3);
//! assert_eq!(fixed.roll_die(20), 6);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Deterministic RNG used for shuffles, dice and AI choices.
///
/// Uses ChaCha8 for speed while maintaining high quality randomness.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an independent stream for a specific context.
    ///
    /// The same context always produces the same stream from the same seed.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;

        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a random integer in the given range.
    pub fn gen_range(&mut self, range: std::ops::Range<i32>) -> i32 {
        self.inner.gen_range(range)
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Generate a random boolean with given probability of true.
    ///
    /// Probabilities outside `0.0..=1.0` are clamped.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos() as u64,
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(u128::from(state.word_pos));
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Serializable RNG state for snapshots.
///
/// Uses the ChaCha8 word position so the state stays small however many
/// numbers have been drawn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position
    pub word_pos: u64,
}

/// Source of individual die results.
pub trait DiceSource {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl DiceSource for GameRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.inner.gen_range(1..=sides)
    }
}

/// Scripted dice that cycle through a fixed list of results.
///
/// Results are returned as-is, regardless of the die size requested.
#[derive(Clone, Debug)]
pub struct FixedDice {
    values: Vec<u32>,
    cursor: usize,
}

impl FixedDice {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            cursor: 0,
        }
    }

    /// How many dice have been rolled so far.
    #[must_use]
    pub fn rolls(&self) -> usize {
        self.cursor
    }
}

impl DiceSource for FixedDice {
    fn roll_die(&mut self, _sides: u32) -> u32 {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range(0..1000), rng2.gen_range(0..1000));
        }
    }

    #[test]
    fn test_context_streams_differ() {
        let rng = GameRng::new(42);
        let mut deck1 = rng.for_context("deck-1");
        let mut deck2 = rng.for_context("deck-2");

        let seq1: Vec<_> = (0..10).map(|_| deck1.gen_range(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| deck2.gen_range(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_roll_die_in_range() {
        let mut rng = GameRng::new(3);
        for _ in 0..200 {
            let roll = rng.roll_die(4);
            assert!((1..=4).contains(&roll));
        }
        assert_eq!(rng.roll_die(0), 0);
    }

    #[test]
    fn test_state_serialization() {
        let mut rng = GameRng::new(42);
        for _ in 0..100 {
            rng.roll_die(6);
        }

        let state = rng.state();
        let expected: Vec<_> = (0..10).map(|_| rng.roll_die(6)).collect();

        let mut restored = GameRng::from_state(&state);
        let actual: Vec<_> = (0..10).map(|_| restored.roll_die(6)).collect();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_state_serde() {
        let state = GameRngState {
            seed: 42,
            word_pos: 12345,
        };

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: GameRngState = serde_json::from_str(&json).unwrap();

        assert_eq!(state, deserialized);
    }

    #[test]
    fn test_fixed_dice_cycles() {
        let mut dice = FixedDice::new([1, 2]);
        let rolls: Vec<_> = (0..5).map(|_| dice.roll_die(6)).collect();
        assert_eq!(rolls, vec![1, 2, 1, 2, 1]);
        assert_eq!(dice.rolls(), 5);

        let mut empty = FixedDice::new(Vec::new());
        assert_eq!(empty.roll_die(6), 0);
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = GameRng::new(42);
        let mut data: Vec<u32> = (1..=10).collect();
        rng.shuffle(&mut data);

        assert_ne!(data, (1..=10).collect::<Vec<_>>());
        data.sort_unstable();
        assert_eq!(data, (1..=10).collect::<Vec<_>>());
    }
}
