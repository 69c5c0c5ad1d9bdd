//! Dice expressions such as `1d6`, `2d4` or `1d8 adv`.
//!
//! A card's dice string is `<count>d<sides>` with an optional `adv` marker.
//! With advantage, or whenever more than one die is thrown, the roll is the
//! highest single die. A lone die yields its face. Missing or unreadable
//! expressions roll 0.

use serde::{Deserialize, Serialize};

use crate::core::DiceSource;

/// Parsed dice expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub advantage: bool,
}

impl DiceExpr {
    #[must_use]
    pub const fn new(count: u32, sides: u32) -> Self {
        Self {
            count,
            sides,
            advantage: false,
        }
    }

    #[must_use]
    pub const fn with_advantage(mut self) -> Self {
        self.advantage = true;
        self
    }

    /// Parse the first `NdM` group in `text`. The count defaults to 1.
    ///
    /// ```
    /// use riutiz_ccg::cards::DiceExpr;
    ///
    /// assert_eq!(DiceExpr::parse("2d4"), Some(DiceExpr::new(2, 4)));
    /// assert_eq!(DiceExpr::parse("d6"), Some(DiceExpr::new(1, 6)));
    /// assert!(DiceExpr::parse("1d8 adv").unwrap().advantage);
    /// assert_eq!(DiceExpr::parse("none"), None);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        for (pos, &b) in bytes.iter().enumerate() {
            if b != b'd' && b != b'D' {
                continue;
            }
            let sides_digits: String = text[pos + 1..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if sides_digits.is_empty() {
                continue;
            }
            let count_start = text[..pos]
                .char_indices()
                .rev()
                .take_while(|(_, c)| c.is_ascii_digit())
                .last()
                .map_or(pos, |(i, _)| i);
            let count_digits = &text[count_start..pos];

            let count = if count_digits.is_empty() {
                1
            } else {
                count_digits.parse().ok()?
            };
            let sides = sides_digits.parse().ok()?;
            let advantage = text.to_ascii_lowercase().contains("adv");
            return Some(Self {
                count,
                sides,
                advantage,
            });
        }
        None
    }

    /// Roll the expression.
    pub fn roll(&self, dice: &mut dyn DiceSource) -> u32 {
        if self.count == 0 || self.sides == 0 {
            return 0;
        }
        let rolls = (0..self.count).map(|_| dice.roll_die(self.sides));
        if self.advantage || self.count > 1 {
            rolls.max().unwrap_or(0)
        } else {
            rolls.sum()
        }
    }

    /// Expected damage used by AI estimates: `count * (sides + 1) / 2`.
    #[must_use]
    pub fn expected(&self) -> f64 {
        f64::from(self.count) * (f64::from(self.sides) + 1.0) / 2.0
    }
}

/// Roll an optional dice string, treating missing or bad input as 0.
pub fn roll_dice(text: Option<&str>, dice: &mut dyn DiceSource) -> u32 {
    text.and_then(DiceExpr::parse)
        .map_or(0, |expr| expr.roll(dice))
}

/// Expected value of an optional dice string, 0 when absent.
#[must_use]
pub fn expected_roll(text: Option<&str>) -> f64 {
    text.and_then(DiceExpr::parse)
        .map_or(0.0, |expr| expr.expected())
}
