//! Domain events emitted by the engine.
//!
//! Every accepted mutation pushes one or more `GameEvent`s onto the
//! engine's `EventQueue`. Consumers (UI, trackers, the sync layer) drain
//! the queue when convenient; there are no registered callbacks to tear
//! down.

use serde::{Deserialize, Serialize};

use super::entity::InstanceId;
use super::player::PlayerNum;
use crate::cards::{CardType, Color, Effect};
use crate::rules::CombatReport;

/// Something that happened in the match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    CardPlayed {
        player: PlayerNum,
        instance_id: InstanceId,
        card_type: CardType,
    },
    CardPlayedAsResource {
        player: PlayerNum,
        instance_id: InstanceId,
        color: Color,
    },
    CardsDrawn {
        player: PlayerNum,
        count: usize,
    },
    AbilityActivated {
        player: PlayerNum,
        instance_id: InstanceId,
        effect: Effect,
        target: Option<InstanceId>,
    },
    TokenCreated {
        player: PlayerNum,
        instance_id: InstanceId,
    },
    CombatStarted {
        player: PlayerNum,
    },
    AttackerToggled {
        player: PlayerNum,
        instance_id: InstanceId,
        attacking: bool,
    },
    AttackersDeclared {
        player: PlayerNum,
        attackers: Vec<InstanceId>,
    },
    CombatSkipped {
        player: PlayerNum,
    },
    BlockerToggled {
        player: PlayerNum,
        blocker_id: InstanceId,
        attacker_id: InstanceId,
        assigned: bool,
    },
    CombatResolved {
        player: PlayerNum,
        report: CombatReport,
    },
    TurnEnded {
        player: PlayerNum,
        next: PlayerNum,
    },
    TurnStarted {
        player: PlayerNum,
        turn: u32,
    },
    GameOver {
        winner: PlayerNum,
        points: u32,
    },
    StateLoaded {
        current_player: PlayerNum,
    },
}

impl GameEvent {
    /// The player the event concerns.
    #[must_use]
    pub fn player(&self) -> PlayerNum {
        match self {
            GameEvent::CardPlayed { player, .. }
            | GameEvent::CardPlayedAsResource { player, .. }
            | GameEvent::CardsDrawn { player, .. }
            | GameEvent::AbilityActivated { player, .. }
            | GameEvent::TokenCreated { player, .. }
            | GameEvent::CombatStarted { player }
            | GameEvent::AttackerToggled { player, .. }
            | GameEvent::AttackersDeclared { player, .. }
            | GameEvent::CombatSkipped { player }
            | GameEvent::BlockerToggled { player, .. }
            | GameEvent::CombatResolved { player, .. }
            | GameEvent::TurnEnded { player, .. }
            | GameEvent::TurnStarted { player, .. } => *player,
            GameEvent::GameOver { winner, .. } => *winner,
            GameEvent::StateLoaded { current_player } => *current_player,
        }
    }
}

/// Outbound event queue.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    pending: Vec<GameEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        tracing::trace!(?event, "game event");
        self.pending.push(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.pending.iter()
    }
}
