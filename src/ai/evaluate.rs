//! Card value heuristic shared by attack, block and play decisions.
//!
//! A monotonic proxy: cost plus half the stats plus keyword bonuses. No
//! look-ahead.

use crate::cards::{expected_roll, CardInstance, Keyword};

/// Heuristic worth of a card in its current state.
#[must_use]
pub fn card_value(card: &CardInstance) -> f64 {
    let abilities = &card.card.abilities;
    let mut value = f64::from(card.card.cost_requirement().total());

    if card.is_pupil() {
        let endurance = card.current_endurance.or(card.card.endurance).unwrap_or(0);
        value += f64::from(endurance) / 2.0;
        value += f64::from(card.card.attack.unwrap_or(0)) / 2.0;
    }

    if abilities.keywords.contains(Keyword::Relentless) {
        value += 1.0;
    }
    if abilities.keywords.contains(Keyword::Overwhelm) {
        value += 1.0;
    }
    if abilities.keywords.contains(Keyword::Impulsive) {
        value += 0.5;
    }
    if abilities.draws {
        value += 1.0;
    }
    if abilities.enters_trigger {
        value += 0.5;
    }
    value
}

/// Expected combat roll of a card's dice.
#[must_use]
pub fn expected_damage(card: &CardInstance) -> f64 {
    expected_roll(card.card.dice.as_deref())
}
