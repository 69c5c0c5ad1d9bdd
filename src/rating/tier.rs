//! Rating tiers.
//!
//! Tiers are contiguous bands. The last one is open-ended.

use serde::{Deserialize, Serialize};

use super::elo::round_half_up;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Beginner,
    Apprentice,
    Student,
    Scholar,
    Expert,
    Master,
    Grandmaster,
    Legend,
}

impl Tier {
    pub const ALL: [Tier; 8] = [
        Tier::Beginner,
        Tier::Apprentice,
        Tier::Student,
        Tier::Scholar,
        Tier::Expert,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Legend,
    ];

    /// Tier holding `rating`. Anything below the first band is Beginner.
    #[must_use]
    pub fn for_rating(rating: i32) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|tier| rating >= tier.min_rating())
            .unwrap_or(Tier::Beginner)
    }

    #[must_use]
    pub const fn min_rating(self) -> i32 {
        match self {
            Tier::Beginner => 0,
            Tier::Apprentice => 800,
            Tier::Student => 1000,
            Tier::Scholar => 1200,
            Tier::Expert => 1400,
            Tier::Master => 1600,
            Tier::Grandmaster => 1800,
            Tier::Legend => 2000,
        }
    }

    /// Inclusive upper bound, `None` for the top tier.
    #[must_use]
    pub fn max_rating(self) -> Option<i32> {
        self.next().map(|next| next.min_rating() - 1)
    }

    #[must_use]
    pub fn next(self) -> Option<Tier> {
        let index = Self::ALL.iter().position(|t| *t == self)?;
        Self::ALL.get(index + 1).copied()
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Beginner => "Beginner",
            Tier::Apprentice => "Apprentice",
            Tier::Student => "Student",
            Tier::Scholar => "Scholar",
            Tier::Expert => "Expert",
            Tier::Master => "Master",
            Tier::Grandmaster => "Grandmaster",
            Tier::Legend => "Legend",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a rating sits inside its tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgress {
    pub current: Tier,
    pub next: Option<Tier>,
    /// Percent through the current band, 100 at the top tier.
    pub progress: u32,
    pub points_needed: i32,
}

impl TierProgress {
    #[must_use]
    pub fn for_rating(rating: i32) -> Self {
        let current = Tier::for_rating(rating);
        match current.next() {
            None => Self {
                current,
                next: None,
                progress: 100,
                points_needed: 0,
            },
            Some(next) => {
                let band = next.min_rating() - current.min_rating();
                let into_band = (rating - current.min_rating()).max(0);
                let percent = round_half_up(f64::from(into_band) / f64::from(band) * 100.0);
                Self {
                    current,
                    next: Some(next),
                    progress: percent.clamp(0, 100) as u32,
                    points_needed: next.min_rating() - rating,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::for_rating(799), Tier::Beginner);
        assert_eq!(Tier::for_rating(800), Tier::Apprentice);
        assert_eq!(Tier::for_rating(1999), Tier::Grandmaster);
        assert_eq!(Tier::for_rating(2000), Tier::Legend);
        assert_eq!(Tier::for_rating(-50), Tier::Beginner);
        assert_eq!(Tier::Legend.max_rating(), None);
        assert_eq!(Tier::Student.max_rating(), Some(1199));
    }

    #[test]
    fn test_progress() {
        let progress = TierProgress::for_rating(1100);
        assert_eq!(progress.current, Tier::Student);
        assert_eq!(progress.next, Some(Tier::Scholar));
        assert_eq!(progress.progress, 50);
        assert_eq!(progress.points_needed, 100);

        let top = TierProgress::for_rating(2400);
        assert_eq!(top.progress, 100);
        assert_eq!(top.points_needed, 0);
    }
}
