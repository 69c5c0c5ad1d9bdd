//! Combat resolution integration tests.
//!
//! Combat is resolved against scripted dice so every outcome is exact:
//! damage, deaths, points and overwhelm excess.

use riutiz_ccg::cards::{CardDefinition, CardInstance, CardType};
use riutiz_ccg::core::{
    BlockAssignment, CombatStep, FixedDice, GameRng, InstanceId, MatchState, Phase, PlayerMap, PlayerNum, PlayerState,
};
use riutiz_ccg::rules::{CombatReport, CombatResolver};

const ATTACKER: InstanceId = InstanceId::new(1);
const BLOCKER: InstanceId = InstanceId::new(2);

fn creature(id: InstanceId, dice: &str, endurance: i32, ability: &str) -> CardInstance {
    let card = CardDefinition::new(format!("C{}", id.raw()), format!("Creature {}", id.raw()), CardType::Pupil)
        .with_dice(dice)
        .with_stats(1, endurance)
        .with_ability(ability);
    CardInstance::new(id, card)
}

/// Player 1 attacks with `attacker`; player 2 blocks with `blocker` if given.
fn declared(attacker: CardInstance, blocker: Option<CardInstance>) -> MatchState {
    let mut state = MatchState::new(PlayerMap::<PlayerState>::with_default(), 1);
    state.phase = Phase::Combat;
    state.combat_step = Some(CombatStep::Resolve);
    state.attackers.push_back(attacker.instance_id);
    if let Some(blocker) = blocker {
        state.blockers.push_back(BlockAssignment {
            attacker: attacker.instance_id,
            blocker: blocker.instance_id,
        });
        state.players[PlayerNum::Two].field.push_back(blocker);
    }
    state.players[PlayerNum::One].field.push_back(attacker);
    state
}

fn resolve(state: &mut MatchState, rolls: &[u32]) -> CombatReport {
    let mut dice = FixedDice::new(rolls.to_vec());
    CombatResolver::new(&mut dice, 25).resolve(state)
}

/// Test a blocked attacker trading with a 2-endurance blocker.
#[test]
fn test_blocked_trade_without_overwhelm() {
    let mut state = declared(creature(ATTACKER, "1d6", 1, ""), Some(creature(BLOCKER, "1d4", 2, "")));

    let report = resolve(&mut state, &[6, 3]);

    let entry = &report.entries[0];
    assert_eq!(entry.attacker_roll, 6);
    assert_eq!(entry.blocker_roll, Some(3));
    assert_eq!(entry.damage_to_blocker, 6);
    assert_eq!(entry.damage_to_attacker, 3);
    assert_eq!(report.points_scored, 0);
    assert_eq!(report.overwhelm_points, 0);

    // Blocker ends at 2 - 6 = -4, attacker at 1 - 3 = -2: both buried.
    assert_eq!(report.deaths, vec![ATTACKER, BLOCKER]);
    let discard = &state.players[PlayerNum::Two].discard;
    assert_eq!(discard[0].current_endurance, Some(-4));
    assert_eq!(state.players[PlayerNum::One].discard[0].current_endurance, Some(-2));
    assert_eq!(state.players[PlayerNum::One].points, 0);
}

/// Test that overwhelm scores the amount the blocker went below zero.
#[test]
fn test_overwhelm_scores_excess() {
    let mut state = declared(
        creature(ATTACKER, "1d6", 1, "Overwhelm"),
        Some(creature(BLOCKER, "1d4", 2, "")),
    );

    let report = resolve(&mut state, &[6, 3]);

    assert_eq!(report.entries[0].overwhelm_excess, 4);
    assert_eq!(report.points_scored, 4);
    assert_eq!(report.overwhelm_points, 4);
    assert_eq!(state.players[PlayerNum::One].points, 4);
}

/// Test that an unblocked attacker scores its roll.
#[test]
fn test_unblocked_scores_roll() {
    let mut state = declared(creature(ATTACKER, "2d6", 1, ""), None);
    let report = resolve(&mut state, &[4, 5]);

    assert_eq!(report.entries[0].attacker_roll, 9);
    assert_eq!(report.points_scored, 9);
    assert!(report.deaths.is_empty());
    assert_eq!(report.winner, None);
}

/// Test the stubborn and lethal keywords together.
#[test]
fn test_stubborn_lethal_attacker() {
    let mut state = declared(
        creature(ATTACKER, "1d6", 1, "Stubborn, Lethal"),
        Some(creature(BLOCKER, "1d6", 5, "")),
    );

    let report = resolve(&mut state, &[1, 6]);

    let entry = &report.entries[0];
    assert_eq!(entry.damage_to_attacker, 0);
    assert!(entry.blocker_spent_by_lethal);
    let blocker = state.players[PlayerNum::Two].field_card(BLOCKER).unwrap();
    assert!(blocker.is_spent);
    assert_eq!(blocker.current_endurance, Some(4));
    assert!(state.players[PlayerNum::One].field_card(ATTACKER).is_some());
}

/// Test that a blocker gone from the field stops its attacker cold.
#[test]
fn test_missing_blocker_stops_attacker() {
    let mut state = declared(creature(ATTACKER, "1d6", 1, ""), Some(creature(BLOCKER, "1d4", 2, "")));
    let gone = state.players[PlayerNum::Two].take_from_field(BLOCKER).unwrap();
    state.players[PlayerNum::Two].discard.push_back(gone);

    let report = resolve(&mut state, &[6]);

    assert_eq!(report.entries[0].blocker, Some(BLOCKER));
    assert_eq!(report.entries[0].blocker_roll, None);
    assert_eq!(report.points_scored, 0);
}

/// Test that reaching the threshold ends the match.
#[test]
fn test_threshold_ends_match() {
    let mut state = declared(creature(ATTACKER, "1d6", 1, ""), None);
    state.players[PlayerNum::One].points = 22;

    let report = resolve(&mut state, &[3]);

    assert_eq!(report.winner, Some(PlayerNum::One));
    assert!(state.game_over);
    assert_eq!(state.winner, Some(PlayerNum::One));
}

/// Test that identical states and dice always resolve identically.
#[test]
fn test_resolution_is_reproducible() {
    let build = || {
        declared(
            creature(ATTACKER, "2d6", 3, "Overwhelm"),
            Some(creature(BLOCKER, "1d8", 2, "")),
        )
    };

    let mut first = build();
    let mut second = build();
    assert_eq!(resolve(&mut first, &[5, 2, 7]), resolve(&mut second, &[5, 2, 7]));
    assert_eq!(first, second);

    // The state-carried RNG gives the same guarantee.
    let mut a = build();
    let mut b = build();
    let mut rng_a = GameRng::from_state(&a.rng);
    let mut rng_b = GameRng::from_state(&b.rng);
    let report_a = CombatResolver::new(&mut rng_a, 25).resolve(&mut a);
    let report_b = CombatResolver::new(&mut rng_b, 25).resolve(&mut b);
    assert_eq!(report_a, report_b);
    assert_eq!(rng_a.state(), rng_b.state());
}
