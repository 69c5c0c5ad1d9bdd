//! Write authority over the match state.
//!
//! Only the active player may change the match, except while blockers are
//! being declared, when the defending player may assign blockers and
//! confirm them. Every engine operation and the sync layer's publish step
//! go through `authority`.

use crate::core::{CombatStep, MatchState, PlayerNum};

/// What a player may currently write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Authority {
    /// Active player: any operation.
    Full,
    /// Defender during blocker declaration: blocking operations only.
    BlockersOnly,
    /// Nothing.
    ReadOnly,
}

impl Authority {
    /// May write blocker assignments.
    #[must_use]
    pub const fn can_block(self) -> bool {
        matches!(self, Authority::BlockersOnly | Authority::Full)
    }

    #[must_use]
    pub const fn can_write(self) -> bool {
        !matches!(self, Authority::ReadOnly)
    }
}

/// Authority of `player` over `state`.
///
/// ```
/// use riutiz_ccg::core::{MatchState, PlayerMap, PlayerNum, PlayerState, CombatStep};
/// use riutiz_ccg::rules::{authority, Authority};
///
/// let mut state = MatchState::new(PlayerMap::<PlayerState>::with_default(), 1);
/// assert_eq!(authority(&state, PlayerNum::One), Authority::Full);
/// assert_eq!(authority(&state, PlayerNum::Two), Authority::ReadOnly);
///
/// state.combat_step = Some(CombatStep::DeclareBlockers);
/// assert_eq!(authority(&state, PlayerNum::Two), Authority::BlockersOnly);
/// ```
#[must_use]
pub fn authority(state: &MatchState, player: PlayerNum) -> Authority {
    if state.current_player == player {
        Authority::Full
    } else if state.combat_step == Some(CombatStep::DeclareBlockers) {
        Authority::BlockersOnly
    } else {
        Authority::ReadOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlayerMap, PlayerState};

    #[test]
    fn test_authority_follows_turn() {
        let mut state = MatchState::new(PlayerMap::<PlayerState>::with_default(), 1);
        state.current_player = PlayerNum::Two;

        assert_eq!(authority(&state, PlayerNum::Two), Authority::Full);
        assert_eq!(authority(&state, PlayerNum::One), Authority::ReadOnly);
        assert!(!authority(&state, PlayerNum::One).can_write());
    }

    #[test]
    fn test_defender_window_only_during_blockers() {
        let mut state = MatchState::new(PlayerMap::<PlayerState>::with_default(), 1);

        state.combat_step = Some(CombatStep::DeclareAttackers);
        assert_eq!(authority(&state, PlayerNum::Two), Authority::ReadOnly);

        state.combat_step = Some(CombatStep::DeclareBlockers);
        let defender = authority(&state, PlayerNum::Two);
        assert!(defender.can_block());
        assert!(defender.can_write());
        assert_ne!(defender, Authority::Full);
    }
}
