//! The match state machine.
//!
//! `GameEngine` owns one `MatchState` and exposes the player operations.
//! Every operation validates completely before its first write, so a
//! rejected call leaves the state untouched, and every accepted call pushes
//! domain events onto the engine's queue.
//!
//! ## Turn cycle
//!
//! `draw → ready → main → combat → end`, back to `draw` for the other player
//! through `end_turn`. Combat runs its own steps:
//! `declare-attackers → declare-blockers → resolve`.
//!
//! ## Dice
//!
//! By default combat rolls come from the RNG stored in the state, so peers
//! replaying the same actions roll the same numbers. Tests inject a
//! `DiceSource` with `with_dice`.

use serde::{Deserialize, Serialize};

use super::authority::{authority, Authority};
use super::combat::{CombatReport, CombatResolver};
use super::payment::{can_afford, pay_cost};
use crate::cards::{CardDefinition, CardInstance, CardType, Color, Effect, Keyword};
use crate::core::{
    ActionError, BlockAssignment, CombatStep, DiceSource, EngineConfig, EventQueue, GameAction, GameEvent, GameRng,
    InstanceId, MatchState, Phase, PlayerNum, SnapshotError,
};

/// Card data id of the token created by `Effect::CreateToken`.
pub const TOKEN_CARD_ID: &str = "TOKEN-AVERAGE-JOE";

/// What an accepted operation did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionOutcome {
    ResourcePlayed {
        instance_id: InstanceId,
        color: Color,
    },
    CardPlayed {
        instance_id: InstanceId,
        card_type: CardType,
        cards_drawn: usize,
    },
    AbilityActivated {
        instance_id: InstanceId,
        effect: Effect,
        created: Option<InstanceId>,
    },
    CombatStarted,
    AttackerToggled {
        instance_id: InstanceId,
        attacking: bool,
    },
    /// Zero attackers means combat was skipped.
    AttackersConfirmed {
        attackers: usize,
    },
    BlockerToggled {
        blocker_id: InstanceId,
        attacker_id: InstanceId,
        assigned: bool,
    },
    CombatResolved(CombatReport),
    TurnEnded {
        next: PlayerNum,
        turn: u32,
    },
}

pub type ActionResult = Result<ActionOutcome, ActionError>;

/// Authoritative rules engine for one client's view of a match.
pub struct GameEngine {
    config: EngineConfig,
    state: MatchState,
    events: EventQueue,
    dice: Option<Box<dyn DiceSource>>,
}

impl GameEngine {
    #[must_use]
    pub fn new(config: EngineConfig, state: MatchState) -> Self {
        Self {
            config,
            state,
            events: EventQueue::new(),
            dice: None,
        }
    }

    /// Roll combat dice from `dice` instead of the state's RNG.
    #[must_use]
    pub fn with_dice(mut self, dice: Box<dyn DiceSource>) -> Self {
        self.dice = Some(dice);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Direct state access for setup and tests. Skips all validation.
    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    // === Queries ===

    #[must_use]
    pub fn is_player_turn(&self, player: PlayerNum) -> bool {
        self.state.is_player_turn(player)
    }

    #[must_use]
    pub fn opponent(&self, player: PlayerNum) -> PlayerNum {
        player.opponent()
    }

    #[must_use]
    pub fn authority(&self, player: PlayerNum) -> Authority {
        authority(&self.state, player)
    }

    /// Whether `player` could pay for `card` with their unspent resources.
    #[must_use]
    pub fn can_afford(&self, card: &CardDefinition, player: PlayerNum) -> bool {
        can_afford(&card.cost_requirement(), self.state.player(player))
    }

    /// Hand cards `player` could play (not as a resource) right now.
    #[must_use]
    pub fn playable_cards(&self, player: PlayerNum) -> Vec<InstanceId> {
        if self.require_turn(player).is_err() || self.require_main().is_err() {
            return Vec::new();
        }
        let ps = self.state.player(player);
        ps.hand
            .iter()
            .filter(|c| !(c.card_type() == CardType::Interruption && ps.interruption_played))
            .filter(|c| can_afford(&c.card.cost_requirement(), ps))
            .map(|c| c.instance_id)
            .collect()
    }

    /// Field cards that could be declared as attackers.
    #[must_use]
    pub fn eligible_attackers(&self, player: PlayerNum) -> Vec<InstanceId> {
        self.state
            .player(player)
            .field
            .iter()
            .filter(|c| c.can_attack())
            .map(|c| c.instance_id)
            .collect()
    }

    // === Events ===

    /// Take all pending domain events.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    // === Guards ===

    fn ensure_live(&self) -> Result<(), ActionError> {
        if self.state.game_over {
            Err(ActionError::GameOver)
        } else {
            Ok(())
        }
    }

    fn require_turn(&self, player: PlayerNum) -> Result<(), ActionError> {
        self.ensure_live()?;
        match authority(&self.state, player) {
            Authority::Full => Ok(()),
            Authority::BlockersOnly | Authority::ReadOnly => Err(ActionError::NotYourTurn),
        }
    }

    fn require_main(&self) -> Result<(), ActionError> {
        if self.state.combat_step.is_some() {
            return Err(ActionError::CombatInProgress);
        }
        if self.state.phase != Phase::Main {
            return Err(ActionError::WrongPhase(self.state.phase));
        }
        Ok(())
    }

    fn require_step(&self, step: CombatStep, error: ActionError) -> Result<(), ActionError> {
        if self.state.combat_step == Some(step) {
            Ok(())
        } else {
            Err(error)
        }
    }

    // === Operations ===

    /// Dispatch a logged action.
    pub fn apply(&mut self, player: PlayerNum, action: &GameAction) -> ActionResult {
        match *action {
            GameAction::PlayCard {
                instance_id,
                as_resource,
            } => self.play_card(player, instance_id, as_resource),
            GameAction::ActivateAbility { instance_id, target } => self.activate_ability(player, instance_id, target),
            GameAction::StartCombat => self.start_combat(player),
            GameAction::ToggleAttacker { instance_id } => self.toggle_attacker(player, instance_id),
            GameAction::ConfirmAttackers => self.confirm_attackers(player),
            GameAction::ToggleBlocker {
                blocker_id,
                attacker_id,
            } => self.toggle_blocker(player, blocker_id, attacker_id),
            GameAction::ConfirmBlockers => self.confirm_blockers(player),
            GameAction::EndTurn => self.end_turn(player),
        }
    }

    /// Play a hand card, either face-down as a resource or for its effect.
    pub fn play_card(&mut self, player: PlayerNum, instance_id: InstanceId, as_resource: bool) -> ActionResult {
        self.require_turn(player)?;
        self.require_main()?;

        let ps = self.state.player(player);
        let card = ps.hand_card(instance_id).ok_or(ActionError::CardNotInHand)?;

        if as_resource {
            let color = card.card.primary_color();
            let ps = self.state.player_mut(player);
            let card = ps.take_from_hand(instance_id).ok_or(ActionError::CardNotInHand)?;
            ps.resources.push_back(crate::core::ResourceToken {
                color,
                is_spent: false,
                card,
            });
            tracing::debug!(player = %player, instance = %instance_id, %color, "resource played");
            self.events.push(GameEvent::CardPlayedAsResource {
                player,
                instance_id,
                color,
            });
            return Ok(ActionOutcome::ResourcePlayed { instance_id, color });
        }

        let cost = card.card.cost_requirement();
        if !can_afford(&cost, ps) {
            return Err(ActionError::InsufficientResources);
        }
        let card_type = card.card_type();
        if card_type == CardType::Interruption && ps.interruption_played {
            return Err(ActionError::InterruptionAlreadyPlayed);
        }

        let ps = self.state.player_mut(player);
        let mut card = ps.take_from_hand(instance_id).ok_or(ActionError::CardNotInHand)?;
        pay_cost(&cost, ps);

        let mut cards_drawn = 0;
        match card_type {
            CardType::Pupil => {
                card.has_getting_bearings = !card.has(Keyword::Impulsive);
                card.is_spent = false;
                ps.field.push_back(card);
            }
            CardType::Interruption => {
                let on_play = card.card.abilities.on_play;
                ps.interruption_played = true;
                ps.discard.push_back(card);
                if let Some(Effect::DrawCards(n)) = on_play {
                    cards_drawn = ps.draw(n as usize);
                }
            }
            CardType::Tool | CardType::Location => {
                card.has_getting_bearings = false;
                card.is_spent = false;
                ps.field.push_back(card);
            }
        }

        tracing::debug!(player = %player, instance = %instance_id, ?card_type, "card played");
        self.events.push(GameEvent::CardPlayed {
            player,
            instance_id,
            card_type,
        });
        if cards_drawn > 0 {
            self.events.push(GameEvent::CardsDrawn {
                player,
                count: cards_drawn,
            });
        }
        Ok(ActionOutcome::CardPlayed {
            instance_id,
            card_type,
            cards_drawn,
        })
    }

    /// Spend a field card for its `Spend:` ability.
    pub fn activate_ability(
        &mut self,
        player: PlayerNum,
        instance_id: InstanceId,
        target: Option<InstanceId>,
    ) -> ActionResult {
        self.require_turn(player)?;
        self.require_main()?;

        let card = self
            .state
            .player(player)
            .field_card(instance_id)
            .ok_or(ActionError::CardNotOnField)?;
        if card.is_spent {
            return Err(ActionError::AlreadySpent);
        }
        if card.is_pupil() && card.has_getting_bearings {
            return Err(ActionError::GettingBearings);
        }
        let effect = card.card.abilities.on_spend.ok_or(ActionError::NoSpendAbility)?;
        if effect.needs_target() {
            let target = target.ok_or(ActionError::TargetRequired)?;
            let valid = self
                .field_card_anywhere(target)
                .is_some_and(CardInstance::is_pupil);
            if !valid {
                return Err(ActionError::InvalidTarget);
            }
        }

        let created = self.resolve_spend_effect(player, effect, target);
        if let Some(card) = self.state.player_mut(player).field_card_mut(instance_id) {
            card.is_spent = true;
        }

        tracing::debug!(player = %player, instance = %instance_id, ?effect, "ability activated");
        self.events.push(GameEvent::AbilityActivated {
            player,
            instance_id,
            effect,
            target,
        });
        Ok(ActionOutcome::AbilityActivated {
            instance_id,
            effect,
            created,
        })
    }

    fn field_card_anywhere(&self, id: InstanceId) -> Option<&CardInstance> {
        PlayerNum::BOTH
            .into_iter()
            .find_map(|p| self.state.player(p).field_card(id))
    }

    fn field_card_anywhere_mut(&mut self, id: InstanceId) -> Option<&mut CardInstance> {
        let owner = PlayerNum::BOTH
            .into_iter()
            .find(|p| self.state.player(*p).field_card(id).is_some())?;
        self.state.player_mut(owner).field_card_mut(id)
    }

    fn resolve_spend_effect(&mut self, player: PlayerNum, effect: Effect, target: Option<InstanceId>) -> Option<InstanceId> {
        match effect {
            Effect::DrawCards(n) => {
                let count = self.state.player_mut(player).draw(n as usize);
                if count > 0 {
                    self.events.push(GameEvent::CardsDrawn { player, count });
                }
                None
            }
            Effect::RecoverEndurance(amount) => {
                if let Some(card) = target.and_then(|t| self.field_card_anywhere_mut(t)) {
                    card.recover(amount);
                }
                None
            }
            Effect::ToggleSpent => {
                if let Some(card) = target.and_then(|t| self.field_card_anywhere_mut(t)) {
                    card.is_spent = !card.is_spent;
                }
                None
            }
            Effect::CreateToken => {
                let id = self.state.alloc_instance();
                let mut token = CardInstance::new(id, token_definition());
                token.has_getting_bearings = true;
                self.state.player_mut(player).field.push_back(token);
                self.events.push(GameEvent::TokenCreated {
                    player,
                    instance_id: id,
                });
                Some(id)
            }
            Effect::Inert => None,
        }
    }

    /// Enter combat at the attacker declaration step.
    pub fn start_combat(&mut self, player: PlayerNum) -> ActionResult {
        self.require_turn(player)?;
        self.require_main()?;

        self.state.phase = Phase::Combat;
        self.state.clear_combat();
        self.state.combat_step = Some(CombatStep::DeclareAttackers);
        tracing::debug!(player = %player, "combat started");
        self.events.push(GameEvent::CombatStarted { player });
        Ok(ActionOutcome::CombatStarted)
    }

    /// Add a Pupil to or remove it from the attacker list.
    pub fn toggle_attacker(&mut self, player: PlayerNum, instance_id: InstanceId) -> ActionResult {
        self.require_turn(player)?;
        self.require_step(CombatStep::DeclareAttackers, ActionError::NotDeclaringAttackers)?;

        let card = self
            .state
            .player(player)
            .field_card(instance_id)
            .ok_or(ActionError::CardNotOnField)?;
        if !card.is_pupil() {
            return Err(ActionError::OnlyPupilsAttack);
        }
        if card.has_getting_bearings {
            return Err(ActionError::GettingBearings);
        }
        if card.has(Keyword::Grounded) {
            return Err(ActionError::Grounded);
        }
        if card.is_spent && !card.has(Keyword::Relentless) {
            return Err(ActionError::AlreadySpent);
        }

        let attacking = match self.state.attackers.index_of(&instance_id) {
            Some(index) => {
                self.state.attackers.remove(index);
                false
            }
            None => {
                self.state.attackers.push_back(instance_id);
                true
            }
        };
        self.events.push(GameEvent::AttackerToggled {
            player,
            instance_id,
            attacking,
        });
        Ok(ActionOutcome::AttackerToggled { instance_id, attacking })
    }

    /// Lock in attackers. With none declared, combat ends immediately.
    pub fn confirm_attackers(&mut self, player: PlayerNum) -> ActionResult {
        self.require_turn(player)?;
        self.require_step(CombatStep::DeclareAttackers, ActionError::NotDeclaringAttackers)?;

        if self.state.attackers.is_empty() {
            self.state.clear_combat();
            self.state.phase = Phase::End;
            self.events.push(GameEvent::CombatSkipped { player });
            return Ok(ActionOutcome::AttackersConfirmed { attackers: 0 });
        }

        let attackers: Vec<InstanceId> = self.state.attackers.iter().copied().collect();
        let ps = self.state.player_mut(player);
        for id in &attackers {
            if let Some(card) = ps.field_card_mut(*id) {
                if !card.has(Keyword::Relentless) {
                    card.is_spent = true;
                }
            }
        }
        self.state.combat_step = Some(CombatStep::DeclareBlockers);

        tracing::debug!(player = %player, attackers = attackers.len(), "attackers declared");
        let count = attackers.len();
        self.events.push(GameEvent::AttackersDeclared { player, attackers });
        Ok(ActionOutcome::AttackersConfirmed { attackers: count })
    }

    /// Assign `blocker_id` to guard `attacker_id`, or remove the blocker's
    /// current assignment if it already has one.
    pub fn toggle_blocker(
        &mut self,
        defender: PlayerNum,
        blocker_id: InstanceId,
        attacker_id: InstanceId,
    ) -> ActionResult {
        self.ensure_live()?;
        self.require_step(CombatStep::DeclareBlockers, ActionError::NotDeclaringBlockers)?;
        if authority(&self.state, defender) != Authority::BlockersOnly {
            return Err(ActionError::NotDefender);
        }

        let blocker = self
            .state
            .player(defender)
            .field_card(blocker_id)
            .ok_or(ActionError::BlockerNotFound)?;
        if !blocker.is_pupil() {
            return Err(ActionError::OnlyPupilsBlock);
        }
        if blocker.is_spent {
            return Err(ActionError::BlockerSpent);
        }
        if !self.state.is_attacking(attacker_id) {
            return Err(ActionError::AttackerNotDeclared);
        }

        let existing = self.state.blockers.iter().position(|b| b.blocker == blocker_id);
        let assigned = match existing {
            Some(index) => {
                self.state.blockers.remove(index);
                false
            }
            None => {
                self.state.blockers.retain(|b| b.attacker != attacker_id);
                self.state.blockers.push_back(BlockAssignment {
                    attacker: attacker_id,
                    blocker: blocker_id,
                });
                true
            }
        };

        self.events.push(GameEvent::BlockerToggled {
            player: defender,
            blocker_id,
            attacker_id,
            assigned,
        });
        Ok(ActionOutcome::BlockerToggled {
            blocker_id,
            attacker_id,
            assigned,
        })
    }

    /// Lock in blockers and resolve combat. Either player may confirm.
    pub fn confirm_blockers(&mut self, player: PlayerNum) -> ActionResult {
        self.ensure_live()?;
        self.require_step(CombatStep::DeclareBlockers, ActionError::NotDeclaringBlockers)?;
        if !authority(&self.state, player).can_block() {
            return Err(ActionError::NotYourTurn);
        }

        self.state.combat_step = Some(CombatStep::Resolve);
        let threshold = self.config.win_threshold;
        let report = match self.dice.as_mut() {
            Some(dice) => CombatResolver::new(dice.as_mut(), threshold).resolve(&mut self.state),
            None => {
                let mut rng = GameRng::from_state(&self.state.rng);
                let report = CombatResolver::new(&mut rng, threshold).resolve(&mut self.state);
                self.state.rng = rng.state();
                report
            }
        };

        self.state.clear_combat();
        self.state.phase = Phase::End;

        let attacking = report.attacking_player;
        tracing::debug!(
            player = %attacking,
            points = report.points_scored,
            deaths = report.deaths.len(),
            "combat resolved"
        );
        self.events.push(GameEvent::CombatResolved {
            player: attacking,
            report: report.clone(),
        });
        if let Some(winner) = report.winner {
            let points = self.state.player(winner).points;
            tracing::info!(winner = %winner, points, "game over");
            self.events.push(GameEvent::GameOver { winner, points });
        }
        Ok(ActionOutcome::CombatResolved(report))
    }

    /// End the active player's turn and begin the opponent's.
    pub fn end_turn(&mut self, player: PlayerNum) -> ActionResult {
        self.require_turn(player)?;

        let next = player.opponent();
        if player == PlayerNum::Two {
            self.state.turn += 1;
        }
        self.state.current_player = next;
        self.state.phase = Phase::Draw;
        self.state.clear_combat();

        tracing::debug!(player = %player, next = %next, turn = self.state.turn, "turn ended");
        self.events.push(GameEvent::TurnEnded { player, next });
        self.begin_turn(next);

        Ok(ActionOutcome::TurnEnded {
            next,
            turn: self.state.turn,
        })
    }

    fn begin_turn(&mut self, player: PlayerNum) {
        let ps = self.state.player_mut(player);
        let drawn = ps.draw(1);

        self.state.phase = Phase::Ready;
        let ps = self.state.player_mut(player);
        ps.ready_all();
        ps.interruption_played = false;
        self.state.phase = Phase::Main;

        if drawn > 0 {
            self.events.push(GameEvent::CardsDrawn { player, count: drawn });
        }
        self.events.push(GameEvent::TurnStarted {
            player,
            turn: self.state.turn,
        });
    }

    // === Snapshots ===

    /// A full copy of the state for publishing or persistence.
    #[must_use]
    pub fn serializable_state(&self) -> MatchState {
        self.state.clone()
    }

    /// Replace the whole state.
    pub fn load_state(&mut self, state: MatchState) {
        let current_player = state.current_player;
        self.state = state;
        self.events.push(GameEvent::StateLoaded { current_player });
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&self.state)?)
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let state: MatchState = serde_json::from_str(json)?;
        self.load_state(state);
        Ok(())
    }

    /// Compact binary snapshot.
    pub fn encode_snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(&self.state)?)
    }

    pub fn decode_snapshot(bytes: &[u8]) -> Result<MatchState, SnapshotError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// The 1/1 token Pupil created by spend abilities.
#[must_use]
pub fn token_definition() -> CardDefinition {
    CardDefinition::new(TOKEN_CARD_ID, "Average Joe", CardType::Pupil)
        .with_cost("(0)")
        .with_dice("1d4")
        .with_stats(1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FixedDice, PlayerMap, PlayerState, ResourceToken};

    fn pupil(id: u32, ability: &str) -> CardInstance {
        let card = CardDefinition::new(format!("P{id}"), format!("Pupil {id}"), CardType::Pupil)
            .with_cost("(1)")
            .with_dice("1d6")
            .with_stats(1, 2)
            .with_ability(ability);
        CardInstance::new(InstanceId::new(id), card)
    }

    fn engine() -> GameEngine {
        let mut state = MatchState::new(PlayerMap::<PlayerState>::with_default(), 5);
        state.instance_ids = crate::core::InstanceAllocator::default();
        for _ in 0..20 {
            state.alloc_instance();
        }
        GameEngine::new(EngineConfig::default(), state).with_dice(Box::new(FixedDice::new([3])))
    }

    fn give_resource(engine: &mut GameEngine, player: PlayerNum, color: Color, id: u32) {
        engine.state_mut().player_mut(player).resources.push_back(ResourceToken {
            color,
            is_spent: false,
            card: pupil(id, ""),
        });
    }

    #[test]
    fn test_play_pupil_gets_bearings() {
        let mut engine = engine();
        engine.state_mut().player_mut(PlayerNum::One).hand.push_back(pupil(1, ""));
        give_resource(&mut engine, PlayerNum::One, Color::Orange, 50);

        let outcome = engine.play_card(PlayerNum::One, InstanceId::new(1), false).unwrap();
        assert!(matches!(outcome, ActionOutcome::CardPlayed { card_type: CardType::Pupil, .. }));

        let card = engine.state().player(PlayerNum::One).field_card(InstanceId::new(1)).unwrap();
        assert!(card.has_getting_bearings);
        assert_eq!(engine.state().player(PlayerNum::One).untapped_resources().count(), 0);
    }

    #[test]
    fn test_play_impulsive_is_ready() {
        let mut engine = engine();
        engine.state_mut().player_mut(PlayerNum::One).hand.push_back(pupil(1, "Impulsive"));
        give_resource(&mut engine, PlayerNum::One, Color::Orange, 50);

        engine.play_card(PlayerNum::One, InstanceId::new(1), false).unwrap();
        let card = engine.state().player(PlayerNum::One).field_card(InstanceId::new(1)).unwrap();
        assert!(!card.has_getting_bearings);
    }

    #[test]
    fn test_wrong_phase_rejected() {
        let mut engine = engine();
        engine.state_mut().player_mut(PlayerNum::One).hand.push_back(pupil(1, ""));
        engine.start_combat(PlayerNum::One).unwrap();

        let err = engine.play_card(PlayerNum::One, InstanceId::new(1), true).unwrap_err();
        assert_eq!(err, ActionError::CombatInProgress);
    }

    #[test]
    fn test_create_token_allocates_fresh_id() {
        let mut engine = engine();
        let mut maker = pupil(1, "Spend: Create a 1/1 Average Joe.");
        maker.has_getting_bearings = false;
        engine.state_mut().player_mut(PlayerNum::One).field.push_back(maker);

        let outcome = engine.activate_ability(PlayerNum::One, InstanceId::new(1), None).unwrap();
        let ActionOutcome::AbilityActivated { created: Some(token), .. } = outcome else {
            panic!("expected a token");
        };
        assert_eq!(token, InstanceId::new(21));

        let field = &engine.state().player(PlayerNum::One).field;
        assert_eq!(field.len(), 2);
        assert!(field[0].is_spent);
        assert_eq!(field[1].card.name, "Average Joe");
    }

    #[test]
    fn test_recover_needs_target() {
        let mut engine = engine();
        let medic = pupil(1, "Spend: Target Pupil recovers 2 endurance.");
        let mut hurt = pupil(2, "");
        hurt.take_damage(1);
        engine.state_mut().player_mut(PlayerNum::One).field.push_back(medic);
        engine.state_mut().player_mut(PlayerNum::One).field.push_back(hurt);

        assert_eq!(
            engine.activate_ability(PlayerNum::One, InstanceId::new(1), None).unwrap_err(),
            ActionError::TargetRequired
        );
        assert_eq!(
            engine
                .activate_ability(PlayerNum::One, InstanceId::new(1), Some(InstanceId::new(99)))
                .unwrap_err(),
            ActionError::InvalidTarget
        );

        engine
            .activate_ability(PlayerNum::One, InstanceId::new(1), Some(InstanceId::new(2)))
            .unwrap();
        let hurt = engine.state().player(PlayerNum::One).field_card(InstanceId::new(2)).unwrap();
        assert_eq!(hurt.current_endurance, Some(2));
    }

    #[test]
    fn test_toggle_attacker_twice_removes() {
        let mut engine = engine();
        engine.state_mut().player_mut(PlayerNum::One).field.push_back(pupil(1, ""));
        engine.start_combat(PlayerNum::One).unwrap();

        engine.toggle_attacker(PlayerNum::One, InstanceId::new(1)).unwrap();
        assert_eq!(engine.state().attackers.len(), 1);
        engine.toggle_attacker(PlayerNum::One, InstanceId::new(1)).unwrap();
        assert!(engine.state().attackers.is_empty());
    }

    #[test]
    fn test_confirm_no_attackers_skips_to_end() {
        let mut engine = engine();
        engine.start_combat(PlayerNum::One).unwrap();
        let outcome = engine.confirm_attackers(PlayerNum::One).unwrap();

        assert_eq!(outcome, ActionOutcome::AttackersConfirmed { attackers: 0 });
        assert_eq!(engine.state().phase, Phase::End);
        assert_eq!(engine.state().combat_step, None);
    }

    #[test]
    fn test_blocker_reassignment_removes() {
        let mut engine = engine();
        engine.state_mut().player_mut(PlayerNum::One).field.push_back(pupil(1, ""));
        engine.state_mut().player_mut(PlayerNum::One).field.push_back(pupil(2, ""));
        engine.state_mut().player_mut(PlayerNum::Two).field.push_back(pupil(3, ""));
        engine.start_combat(PlayerNum::One).unwrap();
        engine.toggle_attacker(PlayerNum::One, InstanceId::new(1)).unwrap();
        engine.toggle_attacker(PlayerNum::One, InstanceId::new(2)).unwrap();
        engine.confirm_attackers(PlayerNum::One).unwrap();

        let first = engine
            .toggle_blocker(PlayerNum::Two, InstanceId::new(3), InstanceId::new(1))
            .unwrap();
        assert!(matches!(first, ActionOutcome::BlockerToggled { assigned: true, .. }));

        // Re-toggling the same blocker clears its assignment.
        let second = engine
            .toggle_blocker(PlayerNum::Two, InstanceId::new(3), InstanceId::new(2))
            .unwrap();
        assert!(matches!(second, ActionOutcome::BlockerToggled { assigned: false, .. }));
        assert!(engine.state().blockers.is_empty());
    }

    #[test]
    fn test_active_player_cannot_toggle_blocker() {
        let mut engine = engine();
        engine.state_mut().player_mut(PlayerNum::One).field.push_back(pupil(1, ""));
        engine.state_mut().player_mut(PlayerNum::One).field.push_back(pupil(2, ""));
        engine.start_combat(PlayerNum::One).unwrap();
        engine.toggle_attacker(PlayerNum::One, InstanceId::new(1)).unwrap();
        engine.confirm_attackers(PlayerNum::One).unwrap();

        assert_eq!(
            engine
                .toggle_blocker(PlayerNum::One, InstanceId::new(2), InstanceId::new(1))
                .unwrap_err(),
            ActionError::NotDefender
        );
    }

    #[test]
    fn test_events_emitted() {
        let mut engine = engine();
        engine.end_turn(PlayerNum::One).unwrap();
        let events = engine.drain_events();

        assert!(matches!(events[0], GameEvent::TurnEnded { player: PlayerNum::One, next: PlayerNum::Two }));
        assert!(matches!(events.last(), Some(GameEvent::TurnStarted { player: PlayerNum::Two, turn: 1 })));
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_combat_rolls_advance_state_rng() {
        let mut state = MatchState::new(PlayerMap::<PlayerState>::with_default(), 11);
        state.players[PlayerNum::One].field.push_back(pupil(1, ""));
        let before = state.rng.clone();
        let mut engine = GameEngine::new(EngineConfig::default(), state);

        engine.start_combat(PlayerNum::One).unwrap();
        engine.toggle_attacker(PlayerNum::One, InstanceId::new(1)).unwrap();
        engine.confirm_attackers(PlayerNum::One).unwrap();
        engine.confirm_blockers(PlayerNum::Two).unwrap();

        assert_ne!(engine.state().rng, before);
        let points = engine.state().player(PlayerNum::One).points;
        assert!((1..=6).contains(&points));
    }
}
