//! Structured errors for rejected actions and snapshot loading.
//!
//! `ActionError` messages are the inline text shown to the player, so they
//! read as sentences rather than diagnostics.

use thiserror::Error;

use super::state::Phase;

/// Why an engine operation was rejected. A rejected operation never
/// changes state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Game is over")]
    GameOver,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Cannot do that during the {0} phase")]
    WrongPhase(Phase),

    #[error("Finish combat first")]
    CombatInProgress,

    #[error("Card not in hand")]
    CardNotInHand,

    #[error("Card not on field")]
    CardNotOnField,

    #[error("Not enough resources")]
    InsufficientResources,

    #[error("Already played an Interruption this turn")]
    InterruptionAlreadyPlayed,

    #[error("Card is already spent")]
    AlreadySpent,

    #[error("Has Getting Bearings - wait a turn")]
    GettingBearings,

    #[error("Card has no Spend ability")]
    NoSpendAbility,

    #[error("This ability needs a target")]
    TargetRequired,

    #[error("Invalid target")]
    InvalidTarget,

    #[error("Not in attacker declaration")]
    NotDeclaringAttackers,

    #[error("Not in blocker declaration")]
    NotDeclaringBlockers,

    #[error("Only pupils can attack")]
    OnlyPupilsAttack,

    #[error("Card is Grounded and cannot attack")]
    Grounded,

    #[error("Only pupils can block")]
    OnlyPupilsBlock,

    #[error("Only the defending player can assign blockers")]
    NotDefender,

    #[error("Blocker not found")]
    BlockerNotFound,

    #[error("Blocker is spent")]
    BlockerSpent,

    #[error("That card is not attacking")]
    AttackerNotDeclared,
}

/// Failure to decode a match snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid JSON snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid binary snapshot: {0}")]
    Binary(#[from] bincode::Error),
}
