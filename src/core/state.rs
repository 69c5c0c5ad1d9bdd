//! Match state: the root aggregate mirrored between peers.
//!
//! ## MatchState
//!
//! - Turn counter (a round shared by both players), active player, phase
//! - Combat sub-step with the declared attackers and blocker assignments
//! - Both players' zones, points and per-turn flags
//! - Game over flag and winner
//! - Instance id allocator and RNG state, so a loaded snapshot continues
//!   exactly where the publisher left off
//!
//! Uses `im` persistent vectors for zones so whole-state snapshots are
//! cheap to clone.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::entity::{InstanceAllocator, InstanceId};
use super::player::{PlayerMap, PlayerNum};
use super::rng::{GameRng, GameRngState};
use crate::cards::{CardInstance, Color};

/// Turn phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Draw,
    Ready,
    Main,
    Combat,
    End,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Draw => "draw",
            Phase::Ready => "ready",
            Phase::Main => "main",
            Phase::Combat => "combat",
            Phase::End => "end",
        };
        f.write_str(name)
    }
}

/// Steps of the combat sub-machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombatStep {
    DeclareAttackers,
    DeclareBlockers,
    Resolve,
}

/// One blocker guarding one attacker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockAssignment {
    pub attacker: InstanceId,
    pub blocker: InstanceId,
}

/// A card committed as a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceToken {
    pub color: Color,
    pub is_spent: bool,
    /// The card played face-down, kept for preview only.
    pub card: CardInstance,
}

/// One player's zones and counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Front is the next draw.
    pub deck: Vector<CardInstance>,
    pub hand: Vector<CardInstance>,
    pub field: Vector<CardInstance>,
    pub discard: Vector<CardInstance>,
    pub resources: Vector<ResourceToken>,
    pub points: u32,
    pub interruption_played: bool,
}

impl PlayerState {
    /// Create a player with `deck`, front first.
    pub fn with_deck(deck: impl IntoIterator<Item = CardInstance>) -> Self {
        Self {
            deck: deck.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hand_card(&self, id: InstanceId) -> Option<&CardInstance> {
        self.hand.iter().find(|c| c.instance_id == id)
    }

    #[must_use]
    pub fn field_card(&self, id: InstanceId) -> Option<&CardInstance> {
        self.field.iter().find(|c| c.instance_id == id)
    }

    pub fn field_card_mut(&mut self, id: InstanceId) -> Option<&mut CardInstance> {
        self.field.iter_mut().find(|c| c.instance_id == id)
    }

    /// Unspent resources.
    pub fn untapped_resources(&self) -> impl Iterator<Item = &ResourceToken> {
        self.resources.iter().filter(|r| !r.is_spent)
    }

    /// Unspent Pupils on the field.
    pub fn available_blockers(&self) -> impl Iterator<Item = &CardInstance> {
        self.field.iter().filter(|c| c.can_block())
    }
}

/// Complete match state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    /// Round number, advanced when player 2 ends a turn.
    pub turn: u32,

    pub current_player: PlayerNum,

    pub phase: Phase,

    pub combat_step: Option<CombatStep>,

    /// Declared attackers in declaration order.
    pub attackers: Vector<InstanceId>,

    /// At most one entry per attacker.
    pub blockers: Vector<BlockAssignment>,

    pub players: PlayerMap<PlayerState>,

    pub game_over: bool,

    pub winner: Option<PlayerNum>,

    pub instance_ids: InstanceAllocator,

    pub rng: GameRngState,
}

impl MatchState {
    /// Fresh state at turn 1, player 1 in their main phase.
    #[must_use]
    pub fn new(players: PlayerMap<PlayerState>, seed: u64) -> Self {
        Self {
            turn: 1,
            current_player: PlayerNum::One,
            phase: Phase::Main,
            combat_step: None,
            attackers: Vector::new(),
            blockers: Vector::new(),
            players,
            game_over: false,
            winner: None,
            instance_ids: InstanceAllocator::default(),
            rng: GameRng::new(seed).state(),
        }
    }

    #[must_use]
    pub fn player(&self, player: PlayerNum) -> &PlayerState {
        &self.players[player]
    }

    pub fn player_mut(&mut self, player: PlayerNum) -> &mut PlayerState {
        &mut self.players[player]
    }

    #[must_use]
    pub fn is_player_turn(&self, player: PlayerNum) -> bool {
        self.current_player == player
    }

    /// The player not currently taking their turn.
    #[must_use]
    pub fn defending_player(&self) -> PlayerNum {
        self.current_player.opponent()
    }

    /// Blocker assigned to `attacker`, if any.
    #[must_use]
    pub fn blocker_for(&self, attacker: InstanceId) -> Option<InstanceId> {
        self.blockers
            .iter()
            .find(|b| b.attacker == attacker)
            .map(|b| b.blocker)
    }

    #[must_use]
    pub fn is_attacking(&self, id: InstanceId) -> bool {
        self.attackers.contains(&id)
    }

    /// Leave combat: no step, no declarations.
    pub fn clear_combat(&mut self) {
        self.combat_step = None;
        self.attackers.clear();
        self.blockers.clear();
    }

    /// Allocate an id for a card created mid-match.
    pub fn alloc_instance(&mut self) -> InstanceId {
        self.instance_ids.next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardType};

    fn state_with_cards() -> MatchState {
        let mut ids = InstanceAllocator::default();
        let make = |ids: &mut InstanceAllocator| {
            let card = CardDefinition::new("P", "Pupil", CardType::Pupil).with_stats(1, 1);
            CardInstance::new(ids.next_id(), card)
        };
        let one = PlayerState::with_deck((0..3).map(|_| make(&mut ids)));
        let two = PlayerState::with_deck((0..3).map(|_| make(&mut ids)));
        let mut state = MatchState::new(PlayerMap::new(|p| if p == PlayerNum::One { one.clone() } else { two.clone() }), 9);
        state.instance_ids = ids;
        state
    }

    #[test]
    fn test_initial_state() {
        let state = state_with_cards();
        assert_eq!(state.turn, 1);
        assert_eq!(state.current_player, PlayerNum::One);
        assert_eq!(state.phase, Phase::Main);
        assert_eq!(state.combat_step, None);
        assert!(!state.game_over);
        assert_eq!(state.defending_player(), PlayerNum::Two);
    }

    #[test]
    fn test_alloc_continues_after_setup_ids() {
        let mut state = state_with_cards();
        assert_eq!(state.alloc_instance(), InstanceId::new(7));
    }

    #[test]
    fn test_blocker_lookup_and_clear() {
        let mut state = state_with_cards();
        state.combat_step = Some(CombatStep::DeclareBlockers);
        state.attackers.push_back(InstanceId::new(1));
        state.blockers.push_back(BlockAssignment {
            attacker: InstanceId::new(1),
            blocker: InstanceId::new(4),
        });

        assert_eq!(state.blocker_for(InstanceId::new(1)), Some(InstanceId::new(4)));
        assert!(state.is_attacking(InstanceId::new(1)));

        state.clear_combat();
        assert!(state.attackers.is_empty());
        assert!(state.blockers.is_empty());
        assert_eq!(state.combat_step, None);
    }

    #[test]
    fn test_phase_serde_names() {
        assert_eq!(serde_json::to_string(&Phase::Main).unwrap(), "\"main\"");
        assert_eq!(
            serde_json::to_string(&CombatStep::DeclareBlockers).unwrap(),
            "\"declare-blockers\""
        );
    }

    #[test]
    fn test_state_round_trips() {
        let state = state_with_cards();

        let json = serde_json::to_string(&state).unwrap();
        let from_json: MatchState = serde_json::from_str(&json).unwrap();
        assert_eq!(from_json, state);

        let bytes = bincode::serialize(&state).unwrap();
        let from_bytes: MatchState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(from_bytes, state);
    }
}
