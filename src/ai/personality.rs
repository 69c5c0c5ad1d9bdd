//! Named AI personalities.

use serde::{Deserialize, Serialize};

/// Heuristic weights for one personality.
///
/// `None` in a tri-state field means "decide randomly each time".
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonalityParams {
    /// Higher means pickier about sending attackers into blockers.
    pub attack_threshold: f64,
    /// Higher means less willing to trade blockers.
    pub block_threshold: f64,
    pub risk_tolerance: f64,
    pub prefer_creatures: Option<bool>,
    pub hold_resources: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Balanced,
    Aggressive,
    Defensive,
    Control,
    Chaotic,
}

impl Personality {
    pub const ALL: [Personality; 5] = [
        Personality::Balanced,
        Personality::Aggressive,
        Personality::Defensive,
        Personality::Control,
        Personality::Chaotic,
    ];

    #[must_use]
    pub const fn params(self) -> PersonalityParams {
        let (attack_threshold, block_threshold, risk_tolerance, prefer_creatures, hold_resources) = match self {
            Personality::Balanced => (0.5, 0.5, 0.5, Some(true), Some(false)),
            Personality::Aggressive => (0.3, 0.8, 0.8, Some(true), Some(false)),
            Personality::Defensive => (0.8, 0.2, 0.2, Some(true), Some(true)),
            Personality::Control => (0.7, 0.4, 0.3, Some(false), Some(true)),
            Personality::Chaotic => (0.5, 0.5, 1.0, None, None),
        };
        PersonalityParams {
            attack_threshold,
            block_threshold,
            risk_tolerance,
            prefer_creatures,
            hold_resources,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Personality::Balanced => "The Tutor",
            Personality::Aggressive => "The Hothead",
            Personality::Defensive => "The Librarian",
            Personality::Control => "The Professor",
            Personality::Chaotic => "The Class Clown",
        }
    }

    /// Flavor lines for the UI.
    #[must_use]
    pub const fn quotes(self) -> &'static [&'static str] {
        match self {
            Personality::Balanced => &["Let's see what you've learned.", "A steady pace wins the term."],
            Personality::Aggressive => &["No time for homework!", "Charge!", "Hit them before the bell rings."],
            Personality::Defensive => &["Quiet in the stacks, please.", "Patience is its own reward."],
            Personality::Control => &["Every move is in the syllabus.", "I have planned for this."],
            Personality::Chaotic => &["Was that supposed to happen?", "Pop quiz!", "I forgot what I was doing."],
        }
    }

    /// Holds Interruptions for later instead of playing them in the main phase.
    #[must_use]
    pub const fn holds_interruptions(self) -> bool {
        !matches!(self, Personality::Control)
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_in_range() {
        for personality in Personality::ALL {
            let p = personality.params();
            for value in [p.attack_threshold, p.block_threshold, p.risk_tolerance] {
                assert!((0.0..=1.0).contains(&value), "{personality:?}");
            }
            assert!(!personality.quotes().is_empty());
        }
    }

    #[test]
    fn test_chaotic_is_undecided() {
        let p = Personality::Chaotic.params();
        assert_eq!(p.prefer_creatures, None);
        assert_eq!(p.hold_resources, None);
        assert_eq!(p.risk_tolerance, 1.0);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Personality::Aggressive).unwrap();
        assert_eq!(json, "\"aggressive\"");
    }
}
