//! Cost strings and resource colors.
//!
//! A cost is a run of parenthesized tokens such as `(1)(O)(O)`: digit tokens
//! add to the generic requirement, color codes add one colored requirement
//! each. Colored requirements keep the order in which their colors first
//! appear, which is the order payment draws them in.
//!
//! ```
//! use riutiz_ccg::cards::{parse_cost, primary_color, Color};
//!
//! let cost = parse_cost("(2)(G)(Bk)(G)");
//! assert_eq!(cost.generic, 2);
//! assert_eq!(cost.colored_count(Color::Green), 2);
//! assert_eq!(cost.total(), 5);
//! assert_eq!(primary_color("(2)(G)(Bk)(G)"), Color::Green);
//! assert_eq!(primary_color("(3)"), Color::Colorless);
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Resource color codes used in cost strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "O")]
    Orange,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "P")]
    Purple,
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "Bk")]
    Black,
    #[serde(rename = "C")]
    Colorless,
}

impl Color {
    /// Every color, in display order.
    pub const ALL: [Color; 6] = [
        Color::Orange,
        Color::Green,
        Color::Purple,
        Color::Blue,
        Color::Black,
        Color::Colorless,
    ];

    /// Parse a cost-token color code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "O" => Some(Color::Orange),
            "G" => Some(Color::Green),
            "P" => Some(Color::Purple),
            "B" => Some(Color::Blue),
            "Bk" => Some(Color::Black),
            "C" => Some(Color::Colorless),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Color::Orange => "O",
            Color::Green => "G",
            Color::Purple => "P",
            Color::Blue => "B",
            Color::Black => "Bk",
            Color::Colorless => "C",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A parsed cost.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRequirement {
    /// Payable with resources of any color.
    pub generic: u32,
    /// Colored requirements in first-appearance order.
    pub colored: SmallVec<[(Color, u32); 4]>,
}

impl CostRequirement {
    /// Number of resources of `color` the cost demands.
    #[must_use]
    pub fn colored_count(&self, color: Color) -> u32 {
        self.colored
            .iter()
            .find(|(c, _)| *c == color)
            .map_or(0, |(_, n)| *n)
    }

    /// Total resources the cost consumes.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.colored
            .iter()
            .fold(self.generic, |total, (_, n)| total.saturating_add(*n))
    }

    fn add_colored(&mut self, color: Color) {
        match self.colored.iter_mut().find(|(c, _)| *c == color) {
            Some((_, n)) => *n = n.saturating_add(1),
            None => self.colored.push((color, 1)),
        }
    }
}

/// Parse a cost string. Unknown tokens count toward the generic cost.
#[must_use]
pub fn parse_cost(cost: &str) -> CostRequirement {
    let mut requirement = CostRequirement::default();
    for token in cost_tokens(cost) {
        if let Ok(amount) = token.parse::<u32>() {
            requirement.generic = requirement.generic.saturating_add(amount);
        } else if let Some(color) = Color::from_code(token) {
            requirement.add_colored(color);
        } else {
            tracing::warn!(token, cost, "unknown cost token counted as generic");
            requirement.generic = requirement.generic.saturating_add(1);
        }
    }
    requirement
}

/// The first color token of a cost, `(C)` included. `Colorless` when the
/// cost has no color tokens at all.
#[must_use]
pub fn primary_color(cost: &str) -> Color {
    cost_tokens(cost)
        .find_map(Color::from_code)
        .unwrap_or(Color::Colorless)
}

fn cost_tokens(cost: &str) -> impl Iterator<Item = &str> {
    cost.split('(')
        .filter_map(|chunk| chunk.split_once(')').map(|(token, _)| token.trim()))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generic_only() {
        let cost = parse_cost("(3)");
        assert_eq!(cost.generic, 3);
        assert!(cost.colored.is_empty());
        assert_eq!(cost.total(), 3);
    }

    #[test]
    fn test_parse_keeps_color_order() {
        let cost = parse_cost("(1)(P)(O)(P)");
        let colors: Vec<_> = cost.colored.iter().map(|(c, _)| *c).collect();
        assert_eq!(colors, vec![Color::Purple, Color::Orange]);
        assert_eq!(cost.colored_count(Color::Purple), 2);
        assert_eq!(cost.total(), 4);
    }

    #[test]
    fn test_parse_empty_and_garbage() {
        assert_eq!(parse_cost("").total(), 0);
        assert_eq!(parse_cost("free").total(), 0);
        assert_eq!(parse_cost("(X)").generic, 1);
    }

    #[test]
    fn test_primary_color_is_first_token() {
        assert_eq!(primary_color("(C)(B)"), Color::Colorless);
        assert_eq!(primary_color("(B)(C)"), Color::Blue);
        assert_eq!(primary_color("(1)(Bk)"), Color::Black);
        assert_eq!(primary_color(""), Color::Colorless);
    }

    #[test]
    fn test_parse_huge_generic_saturates() {
        let cost = parse_cost("(4294967295)(1)(X)");
        assert_eq!(cost.generic, u32::MAX);
        let colored = parse_cost("(4294967295)(O)");
        assert_eq!(colored.generic, u32::MAX);
        assert_eq!(colored.total(), u32::MAX);
    }

    #[test]
    fn test_color_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Color::Black).unwrap(), "\"Bk\"");
        let parsed: Color = serde_json::from_str("\"O\"").unwrap();
        assert_eq!(parsed, Color::Orange);
    }
}
