//! Player actions and the action log record.
//!
//! `GameAction` names one engine operation with its parameters. The same
//! value is applied locally, appended to the shared action log, and
//! re-applied by the peer, so replay converges by re-execution.
//!
//! ```
//! use riutiz_ccg::core::{GameAction, InstanceId};
//!
//! let play = GameAction::PlayCard { instance_id: InstanceId::new(4), as_resource: true };
//! let json = serde_json::to_string(&play).unwrap();
//! assert_eq!(json, r#"{"type":"play_card","instance_id":4,"as_resource":true}"#);
//! ```

use serde::{Deserialize, Serialize};

use super::entity::InstanceId;
use super::player::PlayerNum;

/// A single player action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameAction {
    PlayCard {
        instance_id: InstanceId,
        as_resource: bool,
    },
    ActivateAbility {
        instance_id: InstanceId,
        #[serde(default)]
        target: Option<InstanceId>,
    },
    StartCombat,
    ToggleAttacker {
        instance_id: InstanceId,
    },
    ConfirmAttackers,
    ToggleBlocker {
        blocker_id: InstanceId,
        attacker_id: InstanceId,
    },
    ConfirmBlockers,
    EndTurn,
}

impl GameAction {
    /// Actions the defending player may take during blocker declaration.
    #[must_use]
    pub const fn is_blocking_action(&self) -> bool {
        matches!(self, GameAction::ToggleBlocker { .. } | GameAction::ConfirmBlockers)
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            GameAction::PlayCard { .. } => "play_card",
            GameAction::ActivateAbility { .. } => "activate_ability",
            GameAction::StartCombat => "start_combat",
            GameAction::ToggleAttacker { .. } => "toggle_attacker",
            GameAction::ConfirmAttackers => "confirm_attackers",
            GameAction::ToggleBlocker { .. } => "toggle_blocker",
            GameAction::ConfirmBlockers => "confirm_blockers",
            GameAction::EndTurn => "end_turn",
        }
    }
}

/// One entry of the shared action log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Who took the action.
    pub player: PlayerNum,

    /// Round in which it was taken.
    pub turn: u32,

    /// Position in the writer's local sequence.
    pub sequence: u64,

    #[serde(flatten)]
    pub action: GameAction,

    /// Store-assigned time; a timestamp sentinel until the store resolves it.
    #[serde(default)]
    pub timestamp: serde_json::Value,
}

impl ActionRecord {
    #[must_use]
    pub fn new(player: PlayerNum, turn: u32, sequence: u64, action: GameAction) -> Self {
        Self {
            player,
            turn,
            sequence,
            action,
            timestamp: serde_json::Value::Null,
        }
    }

    pub fn with_timestamp(mut self, timestamp: serde_json::Value) -> Self {
        self.timestamp = timestamp;
        self
    }
}
