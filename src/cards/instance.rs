//! Card instances - runtime card state.
//!
//! `CardInstance` is one physical card in a match: the definition it was
//! created from plus its mutable combat state. Instances move between zones
//! by value, so an instance is only ever owned by one zone.

use serde::{Deserialize, Serialize};

use super::ability::Keyword;
use super::definition::{CardDefinition, CardType};
use crate::core::entity::InstanceId;

/// A card instance in a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    pub instance_id: InstanceId,

    pub card: CardDefinition,

    /// Remaining endurance, `None` for cards without endurance.
    pub current_endurance: Option<i32>,

    /// Entered the field this turn and may not attack or activate yet.
    pub has_getting_bearings: bool,

    /// Attacked or activated since its controller's last ready step.
    pub is_spent: bool,
}

impl CardInstance {
    /// Create a fresh instance of `card`, at full endurance and ready.
    #[must_use]
    pub fn new(instance_id: InstanceId, card: CardDefinition) -> Self {
        Self {
            instance_id,
            current_endurance: card.endurance,
            card,
            has_getting_bearings: false,
            is_spent: false,
        }
    }

    #[must_use]
    pub fn is_pupil(&self) -> bool {
        self.card.card_type == CardType::Pupil
    }

    #[must_use]
    pub fn card_type(&self) -> CardType {
        self.card.card_type
    }

    #[must_use]
    pub fn has(&self, keyword: Keyword) -> bool {
        self.card.has(keyword)
    }

    /// Endurance has dropped to zero or below.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current_endurance.is_some_and(|e| e <= 0)
    }

    /// An untapped Pupil, able to block.
    #[must_use]
    pub fn can_block(&self) -> bool {
        self.is_pupil() && !self.is_spent
    }

    /// Could be declared as an attacker right now.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.is_pupil()
            && !self.has_getting_bearings
            && !self.has(Keyword::Grounded)
            && (!self.is_spent || self.has(Keyword::Relentless))
    }

    /// Clear spent and getting bearings at the ready step.
    pub fn ready(&mut self) {
        self.is_spent = false;
        self.has_getting_bearings = false;
    }

    /// Apply combat damage.
    pub fn take_damage(&mut self, amount: i32) {
        if let Some(endurance) = self.current_endurance.as_mut() {
            *endurance -= amount;
        }
    }

    /// Restore endurance, never above the printed value.
    pub fn recover(&mut self, amount: i32) {
        if let (Some(current), Some(max)) = (self.current_endurance.as_mut(), self.card.endurance) {
            *current = (*current + amount).min(max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pupil(ability: &str) -> CardInstance {
        let card = CardDefinition::new("P", "Pupil", CardType::Pupil)
            .with_dice("1d6")
            .with_stats(1, 3)
            .with_ability(ability);
        CardInstance::new(InstanceId::new(1), card)
    }

    #[test]
    fn test_new_instance_at_full_endurance() {
        let card = pupil("");
        assert_eq!(card.current_endurance, Some(3));
        assert!(!card.is_spent);
        assert!(!card.has_getting_bearings);
    }

    #[test]
    fn test_damage_and_death() {
        let mut card = pupil("");
        card.take_damage(2);
        assert!(!card.is_dead());
        card.take_damage(5);
        assert_eq!(card.current_endurance, Some(-4));
        assert!(card.is_dead());
    }

    #[test]
    fn test_recover_caps_at_printed() {
        let mut card = pupil("");
        card.take_damage(2);
        card.recover(5);
        assert_eq!(card.current_endurance, Some(3));
    }

    #[test]
    fn test_cards_without_endurance_never_die() {
        let tool = CardInstance::new(InstanceId::new(2), CardDefinition::new("T", "Bell", CardType::Tool));
        let mut tool_copy = tool.clone();
        tool_copy.take_damage(10);
        assert!(!tool_copy.is_dead());
        assert_eq!(tool_copy, tool);
    }

    #[test]
    fn test_attack_eligibility() {
        let mut card = pupil("");
        assert!(card.can_attack());

        card.is_spent = true;
        assert!(!card.can_attack());

        let mut relentless = pupil("Relentless");
        relentless.is_spent = true;
        assert!(relentless.can_attack());
        relentless.has_getting_bearings = true;
        assert!(!relentless.can_attack());

        assert!(!pupil("Grounded").can_attack());
    }
}
