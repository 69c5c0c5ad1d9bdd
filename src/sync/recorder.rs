//! Collaborators outside the match: who the local player is and where
//! finished results go.

use serde::{Deserialize, Serialize};

use crate::rating::RatingChange;

/// The authenticated local player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub user_id: String,
    pub display_name: String,
    pub rating: i32,
    /// Ranked games finished so far, for the provisional K-factor.
    pub ranked_games: u32,
}

impl PlayerProfile {
    #[must_use]
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            rating: 1000,
            ranked_games: 0,
        }
    }

    #[must_use]
    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }

    #[must_use]
    pub fn with_ranked_games(mut self, games: u32) -> Self {
        self.ranked_games = games;
        self
    }
}

/// One finished match, from the local player's side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub match_id: String,
    pub won: bool,
    pub opponent: String,
    pub ranked: bool,
    pub opponent_rating: i32,
    pub forfeit: bool,
    pub timeout: bool,
    pub rating_change: Option<RatingChange>,
}

/// Persistence for results and the profile's current-match pointer.
pub trait ResultRecorder {
    fn record_result(&mut self, result: &GameResult);

    fn set_current_match(&mut self, match_id: Option<&str>);
}

impl<T: ResultRecorder + ?Sized> ResultRecorder for &mut T {
    fn record_result(&mut self, result: &GameResult) {
        (**self).record_result(result);
    }

    fn set_current_match(&mut self, match_id: Option<&str>) {
        (**self).set_current_match(match_id);
    }
}

/// Keeps everything in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordedResults {
    pub results: Vec<GameResult>,
    pub current_match: Option<String>,
}

impl ResultRecorder for RecordedResults {
    fn record_result(&mut self, result: &GameResult) {
        self.results.push(result.clone());
    }

    fn set_current_match(&mut self, match_id: Option<&str>) {
        self.current_match = match_id.map(str::to_string);
    }
}
