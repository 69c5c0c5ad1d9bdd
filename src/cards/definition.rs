//! Card definitions - static card data.
//!
//! `CardDefinition` mirrors one entry of the card data file (id, name,
//! type line, cost, dice, attack, endurance, ability text, rarity) plus the
//! structured `Abilities` computed from the text at registration.
//!
//! Instance-specific data (current endurance, spent, getting bearings) is
//! stored separately in `CardInstance`.

use serde::{Deserialize, Serialize};

use super::ability::{Abilities, Keyword};
use super::cost::{parse_cost, primary_color, Color, CostRequirement};

/// Identifier of a card definition in the card data (e.g. `"RTZ-014"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rules category of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Pupil,
    Interruption,
    Tool,
    Location,
}

impl CardType {
    /// Classify a type line. Any line naming a Pupil ("Basic Pupil",
    /// "Elite Pupil") is a Pupil; unknown lines are treated as Tools.
    #[must_use]
    pub fn from_type_line(line: &str) -> Self {
        let lower = line.to_lowercase();
        if lower.contains("pupil") {
            CardType::Pupil
        } else if lower.contains("interruption") {
            CardType::Interruption
        } else if lower.contains("location") {
            CardType::Location
        } else {
            CardType::Tool
        }
    }
}

/// Printed rarity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Mythic,
    Other(String),
}

impl From<String> for Rarity {
    fn from(code: String) -> Self {
        match code.as_str() {
            "C" => Rarity::Common,
            "U" => Rarity::Uncommon,
            "R" => Rarity::Rare,
            "M" => Rarity::Mythic,
            _ => Rarity::Other(code),
        }
    }
}

impl From<Rarity> for String {
    fn from(rarity: Rarity) -> Self {
        match rarity {
            Rarity::Common => "C".to_string(),
            Rarity::Uncommon => "U".to_string(),
            Rarity::Rare => "R".to_string(),
            Rarity::Mythic => "M".to_string(),
            Rarity::Other(code) => code,
        }
    }
}

/// Static card definition.
///
/// ## Example
///
/// ```
/// use riutiz_ccg::cards::{CardDefinition, CardType, Keyword};
///
/// let runner = CardDefinition::new("RTZ-001", "Hall Runner", CardType::Pupil)
///     .with_cost("(1)(O)")
///     .with_dice("1d6")
///     .with_stats(2, 1)
///     .with_ability("Impulsive");
///
/// assert!(runner.has(Keyword::Impulsive));
/// assert_eq!(runner.cost_requirement().total(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,

    pub name: String,

    #[serde(rename = "type")]
    pub card_type: CardType,

    #[serde(rename = "subTypes", default)]
    pub sub_types: Option<String>,

    #[serde(default)]
    pub cost: String,

    #[serde(default)]
    pub dice: Option<String>,

    /// Printed attack value.
    #[serde(rename = "ad", default)]
    pub attack: Option<i32>,

    #[serde(default)]
    pub endurance: Option<i32>,

    #[serde(default)]
    pub ability: Option<String>,

    #[serde(default)]
    pub rarity: Rarity,

    /// Structured form of `ability`, filled in at registration.
    #[serde(default)]
    pub abilities: Abilities,
}

impl CardDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, card_type: CardType) -> Self {
        Self {
            id: CardId::new(id),
            name: name.into(),
            card_type,
            sub_types: None,
            cost: String::new(),
            dice: None,
            attack: None,
            endurance: None,
            ability: None,
            rarity: Rarity::Common,
            abilities: Abilities::default(),
        }
    }

    pub fn with_cost(mut self, cost: impl Into<String>) -> Self {
        self.cost = cost.into();
        self
    }

    pub fn with_dice(mut self, dice: impl Into<String>) -> Self {
        self.dice = Some(dice.into());
        self
    }

    /// Set attack and endurance.
    pub fn with_stats(mut self, attack: i32, endurance: i32) -> Self {
        self.attack = Some(attack);
        self.endurance = Some(endurance);
        self
    }

    /// Set ability text and re-derive the structured abilities.
    pub fn with_ability(mut self, text: impl Into<String>) -> Self {
        self.ability = Some(text.into());
        self.refresh_abilities();
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    /// Recompute `abilities` from `ability`.
    pub fn refresh_abilities(&mut self) {
        self.abilities = Abilities::parse(self.ability.as_deref());
    }

    #[must_use]
    pub fn is_pupil(&self) -> bool {
        self.card_type == CardType::Pupil
    }

    #[must_use]
    pub fn has(&self, keyword: Keyword) -> bool {
        self.abilities.has(keyword)
    }

    #[must_use]
    pub fn cost_requirement(&self) -> CostRequirement {
        parse_cost(&self.cost)
    }

    #[must_use]
    pub fn primary_color(&self) -> Color {
        primary_color(&self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_line_classification() {
        assert_eq!(CardType::from_type_line("Basic Pupil"), CardType::Pupil);
        assert_eq!(CardType::from_type_line("Interruption"), CardType::Interruption);
        assert_eq!(CardType::from_type_line("Location"), CardType::Location);
        assert_eq!(CardType::from_type_line("Tool"), CardType::Tool);
        assert_eq!(CardType::from_type_line("Relic"), CardType::Tool);
    }

    #[test]
    fn test_definition_json_round_trip() {
        let card = CardDefinition::new("RTZ-010", "Quiet Scholar", CardType::Pupil)
            .with_cost("(1)(B)")
            .with_dice("1d4")
            .with_stats(1, 3)
            .with_ability("Stubborn")
            .with_rarity(Rarity::Uncommon);

        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains(r#""type":"Pupil""#));
        assert!(json.contains(r#""ad":1"#));

        let back: CardDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
        assert_eq!(back.primary_color(), Color::Blue);
    }

    #[test]
    fn test_definition_bincode_round_trip() {
        let card = CardDefinition::new("RTZ-011", "Hall Monitor", CardType::Pupil)
            .with_dice("2d4 adv")
            .with_stats(2, 2)
            .with_ability("Lethal");

        let bytes = bincode::serialize(&card).unwrap();
        let back: CardDefinition = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, card);
        assert!(back.has(Keyword::Lethal));
    }

    #[test]
    fn test_builder_refreshes_abilities() {
        let card = CardDefinition::new("A", "Brute", CardType::Pupil).with_ability("Overwhelm");
        assert!(card.has(Keyword::Overwhelm));
    }

    #[test]
    fn test_rarity_codes_round_trip() {
        let json = serde_json::to_string(&Rarity::Other("S".into())).unwrap();
        assert_eq!(json, "\"S\"");
        let back: Rarity = serde_json::from_str("\"M\"").unwrap();
        assert_eq!(back, Rarity::Mythic);
    }
}
