//! Zone movement for card instances.
//!
//! Cards move between a player's zones by value: removing an instance from
//! one zone hands back the owned `CardInstance`, which is then pushed into
//! exactly one other zone. These helpers are the only place that moves
//! cards, which keeps every instance in a single zone.
//!
//! ## Usage
//!
//! ```
//! use riutiz_ccg::cards::{CardDefinition, CardInstance, CardType};
//! use riutiz_ccg::core::{InstanceId, PlayerState};
//! use riutiz_ccg::zones::Zone;
//!
//! let card = CardDefinition::new("P", "Pupil", CardType::Pupil);
//! let mut player = PlayerState::with_deck((1..=3).map(|i| CardInstance::new(InstanceId::new(i), card.clone())));
//!
//! assert_eq!(player.draw(2), 2);
//! assert_eq!(player.zone_of(InstanceId::new(1)), Some(Zone::Hand));
//! assert_eq!(player.zone_of(InstanceId::new(3)), Some(Zone::Deck));
//! ```

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::cards::CardInstance;
use crate::core::{InstanceId, MatchState, PlayerNum, PlayerState};

/// A player-owned card zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Deck,
    Hand,
    Field,
    Discard,
    Resources,
}

impl Zone {
    pub const ALL: [Zone; 5] = [Zone::Deck, Zone::Hand, Zone::Field, Zone::Discard, Zone::Resources];
}

impl PlayerState {
    /// Instance ids held in `zone`, in zone order.
    #[must_use]
    pub fn ids_in(&self, zone: Zone) -> Vec<InstanceId> {
        match zone {
            Zone::Deck => self.deck.iter().map(|c| c.instance_id).collect(),
            Zone::Hand => self.hand.iter().map(|c| c.instance_id).collect(),
            Zone::Field => self.field.iter().map(|c| c.instance_id).collect(),
            Zone::Discard => self.discard.iter().map(|c| c.instance_id).collect(),
            Zone::Resources => self.resources.iter().map(|r| r.card.instance_id).collect(),
        }
    }

    /// Which of this player's zones holds `id`.
    #[must_use]
    pub fn zone_of(&self, id: InstanceId) -> Option<Zone> {
        Zone::ALL.into_iter().find(|zone| self.ids_in(*zone).contains(&id))
    }

    /// Move up to `count` cards from the front of the deck into hand.
    /// Returns how many were drawn.
    pub fn draw(&mut self, count: usize) -> usize {
        let mut drawn = 0;
        while drawn < count {
            match self.deck.pop_front() {
                Some(card) => {
                    self.hand.push_back(card);
                    drawn += 1;
                }
                None => break,
            }
        }
        drawn
    }

    /// Remove a card from hand.
    pub fn take_from_hand(&mut self, id: InstanceId) -> Option<CardInstance> {
        let index = self.hand.iter().position(|c| c.instance_id == id)?;
        Some(self.hand.remove(index))
    }

    /// Remove a card from the field.
    pub fn take_from_field(&mut self, id: InstanceId) -> Option<CardInstance> {
        let index = self.field.iter().position(|c| c.instance_id == id)?;
        Some(self.field.remove(index))
    }

    /// Move every dead field card to discard, returning their ids.
    pub fn bury_dead(&mut self) -> Vec<InstanceId> {
        let dead: Vec<InstanceId> = self
            .field
            .iter()
            .filter(|c| c.is_dead())
            .map(|c| c.instance_id)
            .collect();
        for id in &dead {
            if let Some(card) = self.take_from_field(*id) {
                self.discard.push_back(card);
            }
        }
        dead
    }

    /// Ready step: clear spent and getting bearings on field and resources.
    pub fn ready_all(&mut self) {
        for card in self.field.iter_mut() {
            card.ready();
        }
        for resource in self.resources.iter_mut() {
            resource.is_spent = false;
        }
    }

    /// Total cards across every zone.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.deck.len() + self.hand.len() + self.field.len() + self.discard.len() + self.resources.len()
    }
}

/// Owner and zone of an instance anywhere in the match.
#[must_use]
pub fn locate(state: &MatchState, id: InstanceId) -> Option<(PlayerNum, Zone)> {
    state
        .players
        .iter()
        .find_map(|(player, ps)| ps.zone_of(id).map(|zone| (player, zone)))
}

/// First instance id found in more than one zone, if any.
#[must_use]
pub fn find_duplicate_instance(state: &MatchState) -> Option<InstanceId> {
    let mut seen = FxHashSet::default();
    for (_, player) in state.players.iter() {
        for zone in Zone::ALL {
            for id in player.ids_in(zone) {
                if !seen.insert(id) {
                    return Some(id);
                }
            }
        }
    }
    None
}
