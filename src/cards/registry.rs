//! Card registry for definition lookup.
//!
//! The `CardRegistry` stores every card definition known to the client,
//! loaded from the card data file. Registration is where ability text is
//! parsed into structured `Abilities`.
//!
//! Card data entries are lenient: numbers may be strings, the type is a
//! free type line ("Basic Pupil"), and most fields may be missing.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer};

use super::definition::{CardDefinition, CardId, CardType, Rarity};

/// Registry of card definitions.
///
/// ## Example
///
/// ```
/// use riutiz_ccg::cards::{CardRegistry, CardDefinition, CardType};
///
/// let mut registry = CardRegistry::new();
/// registry.register(CardDefinition::new("RTZ-001", "Hall Runner", CardType::Pupil).with_ability("Impulsive"));
///
/// let found = registry.get("RTZ-001").unwrap();
/// assert_eq!(found.name, "Hall Runner");
/// assert!(found.abilities.keywords.contains(riutiz_ccg::cards::Keyword::Impulsive));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    cards: FxHashMap<CardId, CardDefinition>,
    order: Vec<CardId>,
}

impl CardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load definitions from a card data JSON array.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<CardEntry> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for entry in entries {
            registry.register(entry.into());
        }
        tracing::info!(cards = registry.len(), "loaded card data");
        Ok(registry)
    }

    /// Register a definition, replacing any earlier one with the same id.
    pub fn register(&mut self, mut card: CardDefinition) {
        card.refresh_abilities();
        if self.cards.insert(card.id.clone(), card.clone()).is_none() {
            self.order.push(card.id);
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CardDefinition> {
        self.cards.get(&CardId::new(id))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.cards.contains_key(&CardId::new(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.order.iter().filter_map(|id| self.cards.get(id))
    }

    /// Cards eligible for random decks (everything but Locations).
    pub fn deck_pool(&self) -> impl Iterator<Item = &CardDefinition> {
        self.iter().filter(|c| c.card_type != CardType::Location)
    }
}

#[derive(Deserialize)]
struct CardEntry {
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    type_line: String,
    #[serde(rename = "subTypes", default)]
    sub_types: Option<String>,
    #[serde(default)]
    cost: Option<String>,
    #[serde(default)]
    dice: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    ad: Option<i32>,
    #[serde(default, deserialize_with = "lenient_int")]
    endurance: Option<i32>,
    #[serde(default)]
    ability: Option<String>,
    #[serde(default)]
    rarity: Option<String>,
}

impl From<CardEntry> for CardDefinition {
    fn from(entry: CardEntry) -> Self {
        let mut card = CardDefinition::new(entry.id, entry.name, CardType::from_type_line(&entry.type_line));
        card.sub_types = entry.sub_types;
        card.cost = entry.cost.unwrap_or_default();
        card.dice = entry.dice.filter(|d| !d.trim().is_empty());
        card.attack = entry.ad;
        card.endurance = entry.endurance;
        card.ability = entry.ability.filter(|a| !a.trim().is_empty());
        card.rarity = entry.rarity.map_or(Rarity::Common, Rarity::from);
        card
    }
}

// Numbers show up as JSON numbers, numeric strings, or placeholders like "*".
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Int(n)) => i32::try_from(n).ok(),
        Some(Raw::Float(f)) => Some(f as i32),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}
