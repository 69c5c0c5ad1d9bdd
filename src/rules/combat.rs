//! Combat resolution.
//!
//! Attackers resolve in declaration order. Each attacker rolls its dice.
//! Unblocked attackers score their roll. A blocked attacker and its
//! blocker deal their rolls to each other, modified by keywords:
//!
//! - **Lethal**: a blocker that takes any damage becomes spent
//! - **Stubborn**: the attacker takes no damage
//! - **Overwhelm**: when the blocker ends at or below 0 endurance, the
//!   amount below 0 is scored
//!
//! Dead cards go to their owner's discard after every attacker has
//! resolved. Points are then awarded and the win threshold checked once.

use serde::{Deserialize, Serialize};

use crate::cards::{roll_dice, Keyword};
use crate::core::{DiceSource, InstanceId, MatchState, PlayerNum};

/// What happened to one attacker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    pub attacker: InstanceId,
    pub attacker_name: String,
    pub attacker_roll: u32,
    pub blocker: Option<InstanceId>,
    pub blocker_roll: Option<u32>,
    pub damage_to_blocker: u32,
    pub damage_to_attacker: u32,
    /// Points this attacker scored, including overwhelm excess.
    pub points: u32,
    pub overwhelm_excess: u32,
    pub blocker_spent_by_lethal: bool,
}

/// Outcome of a whole combat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatReport {
    pub attacking_player: PlayerNum,
    pub entries: Vec<CombatLogEntry>,
    pub points_scored: u32,
    pub overwhelm_points: u32,
    /// Cards moved to discard, attacker's side first.
    pub deaths: Vec<InstanceId>,
    pub winner: Option<PlayerNum>,
}

impl CombatReport {
    /// Human-readable combat log lines.
    #[must_use]
    pub fn log_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| match (e.blocker, e.blocker_roll) {
                (Some(_), Some(block)) if e.overwhelm_excess > 0 => format!(
                    "{} rolled {} against a block of {} and overwhelmed for {}",
                    e.attacker_name, e.attacker_roll, block, e.overwhelm_excess
                ),
                (Some(_), Some(block)) => format!(
                    "{} rolled {} against a block of {}",
                    e.attacker_name, e.attacker_roll, block
                ),
                _ => format!("{} rolled {} unblocked", e.attacker_name, e.attacker_roll),
            })
            .collect()
    }
}

/// Resolves declared combat against a dice source.
pub struct CombatResolver<'a> {
    dice: &'a mut dyn DiceSource,
    win_threshold: u32,
}

impl<'a> CombatResolver<'a> {
    pub fn new(dice: &'a mut dyn DiceSource, win_threshold: u32) -> Self {
        Self { dice, win_threshold }
    }

    /// Apply combat damage, deaths, points and the win check to `state`.
    ///
    /// Combat declarations are left in place; the engine clears them.
    pub fn resolve(&mut self, state: &mut MatchState) -> CombatReport {
        let attacking = state.current_player;
        let attackers = state.attackers.clone();
        let blockers = state.blockers.clone();
        let (offense, defense) = state.players.split_mut(attacking);

        let mut entries = Vec::with_capacity(attackers.len());
        for attacker_id in attackers.iter().copied() {
            let Some(attacker) = offense.field_card_mut(attacker_id) else {
                continue;
            };
            let attacker_roll = roll_dice(attacker.card.dice.as_deref(), self.dice);
            let mut entry = CombatLogEntry {
                attacker: attacker_id,
                attacker_name: attacker.card.name.clone(),
                attacker_roll,
                blocker: None,
                blocker_roll: None,
                damage_to_blocker: 0,
                damage_to_attacker: 0,
                points: 0,
                overwhelm_excess: 0,
                blocker_spent_by_lethal: false,
            };

            let assigned = blockers.iter().find(|b| b.attacker == attacker_id).map(|b| b.blocker);
            match assigned {
                None => entry.points = attacker_roll,
                Some(blocker_id) => {
                    entry.blocker = Some(blocker_id);
                    // A blocker that has since left the field stops the attacker.
                    if let Some(blocker) = defense.field_card_mut(blocker_id) {
                        let blocker_roll = roll_dice(blocker.card.dice.as_deref(), self.dice);
                        entry.blocker_roll = Some(blocker_roll);

                        blocker.take_damage(attacker_roll as i32);
                        entry.damage_to_blocker = attacker_roll;
                        if attacker.has(Keyword::Lethal) && attacker_roll > 0 {
                            blocker.is_spent = true;
                            entry.blocker_spent_by_lethal = true;
                        }

                        if !attacker.has(Keyword::Stubborn) {
                            attacker.take_damage(blocker_roll as i32);
                            entry.damage_to_attacker = blocker_roll;
                        }

                        if attacker.has(Keyword::Overwhelm) {
                            if let Some(remaining) = blocker.current_endurance.filter(|e| *e <= 0) {
                                entry.overwhelm_excess = remaining.unsigned_abs();
                                entry.points = entry.overwhelm_excess;
                            }
                        }
                    }
                }
            }
            tracing::debug!(
                attacker = %attacker_id,
                roll = attacker_roll,
                blocker = ?entry.blocker,
                points = entry.points,
                "attacker resolved"
            );
            entries.push(entry);
        }

        let mut deaths = offense.bury_dead();
        deaths.extend(defense.bury_dead());

        let points_scored: u32 = entries.iter().map(|e| e.points).sum();
        let overwhelm_points = entries.iter().map(|e| e.overwhelm_excess).sum();
        offense.points += points_scored;

        let winner = if offense.points >= self.win_threshold {
            state.game_over = true;
            state.winner = Some(attacking);
            Some(attacking)
        } else {
            None
        };

        CombatReport {
            attacking_player: attacking,
            entries,
            points_scored,
            overwhelm_points,
            deaths,
            winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardInstance, CardType};
    use crate::core::{BlockAssignment, CombatStep, FixedDice, PlayerMap, PlayerState};

    fn pupil(id: u32, dice: &str, endurance: i32, ability: &str) -> CardInstance {
        let card = CardDefinition::new(format!("P{id}"), format!("Pupil {id}"), CardType::Pupil)
            .with_dice(dice)
            .with_stats(1, endurance)
            .with_ability(ability);
        CardInstance::new(InstanceId::new(id), card)
    }

    fn combat(attacker: CardInstance, blocker: Option<CardInstance>) -> MatchState {
        let mut state = MatchState::new(PlayerMap::<PlayerState>::with_default(), 1);
        let attacker_id = attacker.instance_id;
        state.players[PlayerNum::One].field.push_back(attacker);
        state.attackers.push_back(attacker_id);
        if let Some(blocker) = blocker {
            state.blockers.push_back(BlockAssignment {
                attacker: attacker_id,
                blocker: blocker.instance_id,
            });
            state.players[PlayerNum::Two].field.push_back(blocker);
        }
        state.combat_step = Some(CombatStep::DeclareBlockers);
        state
    }

    #[test]
    fn test_unblocked_scores_roll() {
        let mut state = combat(pupil(1, "1d6", 2, ""), None);
        let mut dice = FixedDice::new([5]);
        let report = CombatResolver::new(&mut dice, 25).resolve(&mut state);

        assert_eq!(report.points_scored, 5);
        assert_eq!(state.players[PlayerNum::One].points, 5);
        assert!(report.deaths.is_empty());
        assert_eq!(report.winner, None);
    }

    #[test]
    fn test_lethal_spends_blocker() {
        let mut state = combat(pupil(1, "1d4", 3, "Lethal"), Some(pupil(2, "1d4", 5, "")));
        let mut dice = FixedDice::new([1, 1]);
        let report = CombatResolver::new(&mut dice, 25).resolve(&mut state);

        assert!(report.entries[0].blocker_spent_by_lethal);
        assert!(state.players[PlayerNum::Two].field[0].is_spent);
    }

    #[test]
    fn test_stubborn_takes_no_damage() {
        let mut state = combat(pupil(1, "1d4", 1, "Stubborn"), Some(pupil(2, "1d6", 5, "")));
        let mut dice = FixedDice::new([2, 6]);
        let report = CombatResolver::new(&mut dice, 25).resolve(&mut state);

        assert_eq!(report.entries[0].damage_to_attacker, 0);
        assert_eq!(state.players[PlayerNum::One].field[0].current_endurance, Some(1));
    }

    #[test]
    fn test_missing_blocker_stops_attacker() {
        let mut state = combat(pupil(1, "1d6", 2, ""), Some(pupil(2, "1d4", 2, "")));
        state.players[PlayerNum::Two].field.clear();
        let mut dice = FixedDice::new([6]);
        let report = CombatResolver::new(&mut dice, 25).resolve(&mut state);

        assert_eq!(report.points_scored, 0);
        assert_eq!(report.entries[0].blocker_roll, None);
    }

    #[test]
    fn test_win_threshold() {
        let mut state = combat(pupil(1, "1d6", 2, ""), None);
        state.players[PlayerNum::One].points = 22;
        let mut dice = FixedDice::new([3]);
        let report = CombatResolver::new(&mut dice, 25).resolve(&mut state);

        assert_eq!(report.winner, Some(PlayerNum::One));
        assert!(state.game_over);
        assert_eq!(state.winner, Some(PlayerNum::One));
    }

    #[test]
    fn test_log_lines() {
        let mut state = combat(pupil(1, "1d6", 2, "Overwhelm"), Some(pupil(2, "1d4", 2, "")));
        let mut dice = FixedDice::new([6, 3]);
        let report = CombatResolver::new(&mut dice, 25).resolve(&mut state);

        assert_eq!(
            report.log_lines(),
            vec!["Pupil 1 rolled 6 against a block of 3 and overwhelmed for 4".to_string()]
        );
    }
}
