//! ELO rating changes, match quality and matchmaking range.

use serde::{Deserialize, Serialize};

use crate::core::PlayerNum;

/// ELO constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub default_rating: i32,

    /// K-factor while a player is provisional.
    pub k_provisional: f64,
    pub k_standard: f64,
    /// K-factor at or above `high_rating_threshold`.
    pub k_high: f64,

    /// Ranked games before a rating stops being provisional.
    pub provisional_games: u32,
    pub high_rating_threshold: i32,

    /// Ratings never drop below this.
    pub rating_floor: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            default_rating: 1000,
            k_provisional: 40.0,
            k_standard: 24.0,
            k_high: 16.0,
            provisional_games: 10,
            high_rating_threshold: 2000,
            rating_floor: 100,
        }
    }
}

impl RatingConfig {
    pub fn with_k_factors(mut self, provisional: f64, standard: f64, high: f64) -> Self {
        self.k_provisional = provisional;
        self.k_standard = standard;
        self.k_high = high;
        self
    }

    pub fn with_rating_floor(mut self, floor: i32) -> Self {
        self.rating_floor = floor;
        self
    }
}

/// A player's standing going into a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedPlayer {
    pub rating: i32,
    pub games_played: u32,
}

impl RatedPlayer {
    #[must_use]
    pub const fn new(rating: i32, games_played: u32) -> Self {
        Self { rating, games_played }
    }
}

/// One player's rating update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub old_rating: i32,
    pub new_rating: i32,
    pub change: i32,
    pub expected_score: f64,
    pub k_factor: f64,
}

/// Rating updates for both seats of a finished match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRatingResult {
    pub player1: RatingChange,
    pub player2: RatingChange,
}

impl MatchRatingResult {
    #[must_use]
    pub fn for_player(&self, player: PlayerNum) -> &RatingChange {
        match player {
            PlayerNum::One => &self.player1,
            PlayerNum::Two => &self.player2,
        }
    }
}

/// Ratings a queued player may be matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min_rating: i32,
    pub max_rating: i32,
    pub range: i32,
}

impl RatingRange {
    #[must_use]
    pub fn contains(&self, rating: i32) -> bool {
        (self.min_rating..=self.max_rating).contains(&rating)
    }
}

/// Round half up, matching how the live leaderboard rounds.
pub(crate) fn round_half_up(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

/// Pure ELO calculator.
///
/// ```
/// use riutiz_ccg::rating::RatingCalculator;
///
/// let calc = RatingCalculator::default();
/// let result = calc.calculate(1000, 1000, true, 0);
/// assert_eq!(result.change, 20);
/// assert_eq!(result.new_rating, 1020);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RatingCalculator {
    config: RatingConfig,
}

impl RatingCalculator {
    #[must_use]
    pub fn new(config: RatingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Probability that `rating` beats `opponent`.
    #[must_use]
    pub fn expected_score(&self, rating: i32, opponent: i32) -> f64 {
        1.0 / (1.0 + 10f64.powf(f64::from(opponent - rating) / 400.0))
    }

    #[must_use]
    pub fn k_factor(&self, rating: i32, games_played: u32) -> f64 {
        if games_played < self.config.provisional_games {
            self.config.k_provisional
        } else if rating >= self.config.high_rating_threshold {
            self.config.k_high
        } else {
            self.config.k_standard
        }
    }

    /// New rating for one player after a decisive game.
    #[must_use]
    pub fn calculate(&self, rating: i32, opponent: i32, won: bool, games_played: u32) -> RatingChange {
        let expected = self.expected_score(rating, opponent);
        let actual = if won { 1.0 } else { 0.0 };
        let k = self.k_factor(rating, games_played);
        let change = round_half_up(k * (actual - expected));

        RatingChange {
            old_rating: rating,
            new_rating: (rating + change).max(self.config.rating_floor),
            change,
            expected_score: expected,
            k_factor: k,
        }
    }

    /// Both players' updates once `winner` is known.
    #[must_use]
    pub fn match_result(&self, player1: RatedPlayer, player2: RatedPlayer, winner: PlayerNum) -> MatchRatingResult {
        MatchRatingResult {
            player1: self.calculate(
                player1.rating,
                player2.rating,
                winner == PlayerNum::One,
                player1.games_played,
            ),
            player2: self.calculate(
                player2.rating,
                player1.rating,
                winner == PlayerNum::Two,
                player2.games_played,
            ),
        }
    }

    /// Advisory 0-100 pairing quality, falling with rating difference.
    #[must_use]
    pub fn match_quality(&self, a: i32, b: i32) -> u32 {
        match (a - b).unsigned_abs() {
            0..=50 => 100,
            51..=100 => 90,
            101..=200 => 75,
            201..=300 => 50,
            301..=500 => 25,
            _ => 10,
        }
    }

    /// Range widens by 50 every 10 seconds in queue, up to +500.
    #[must_use]
    pub fn matchmaking_range(&self, rating: i32, wait_secs: u64) -> RatingRange {
        const BASE: i32 = 100;
        const STEP: i32 = 50;
        const MAX_EXPANSION: i32 = 500;

        let steps = i32::try_from(wait_secs / 10).unwrap_or(i32::MAX);
        let expansion = steps.saturating_mul(STEP).min(MAX_EXPANSION);
        let range = BASE + expansion;

        RatingRange {
            min_rating: (rating - range).max(self.config.rating_floor),
            max_rating: rating + range,
            range,
        }
    }
}
