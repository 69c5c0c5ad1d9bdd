//! The AI player.
//!
//! `AiOpponent` drives a seat through `GameEngine`'s public operations only,
//! exactly as a human client would. The decision functions are synchronous
//! and public; `take_turn`, `finish_turn` and `declare_blockers` wrap them
//! with pacing delays.
//!
//! A turn runs in a fixed order: one resource, then affordable cards by
//! value, then combat, then end turn. When attackers are sent the turn waits
//! for the defender to confirm blockers, and `finish_turn` ends it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::evaluate::{card_value, expected_damage};
use super::personality::{Personality, PersonalityParams};
use crate::cards::{CardInstance, CardType, Keyword};
use crate::core::{CombatStep, GameRng, InstanceId, PlayerNum};
use crate::rules::GameEngine;

/// Wall-clock pacing between AI actions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiPacing {
    pub thinking_delay_ms: u64,
    pub action_delay_ms: u64,
    pub end_turn_delay_ms: u64,
}

impl Default for AiPacing {
    fn default() -> Self {
        Self {
            thinking_delay_ms: 800,
            action_delay_ms: 1_000,
            end_turn_delay_ms: 500,
        }
    }
}

impl AiPacing {
    /// No delays at all.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            thinking_delay_ms: 0,
            action_delay_ms: 0,
            end_turn_delay_ms: 0,
        }
    }

    pub fn with_thinking_delay(mut self, ms: u64) -> Self {
        self.thinking_delay_ms = ms;
        self
    }

    pub fn with_action_delay(mut self, ms: u64) -> Self {
        self.action_delay_ms = ms;
        self
    }
}

/// What the AI did on its turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub resource: Option<InstanceId>,
    pub cards_played: Vec<InstanceId>,
    pub attackers: Vec<InstanceId>,
    /// Attackers were sent and the defender has not confirmed blockers yet.
    pub awaiting_blockers: bool,
    pub ended_turn: bool,
}

/// A (blocker, attacker) assignment.
pub type BlockPlan = Vec<(InstanceId, InstanceId)>;

pub struct AiOpponent {
    player: PlayerNum,
    personality: Personality,
    params: PersonalityParams,
    pacing: AiPacing,
    rng: GameRng,
}

impl AiOpponent {
    #[must_use]
    pub fn new(player: PlayerNum, personality: Personality, seed: u64) -> Self {
        Self {
            player,
            personality,
            params: personality.params(),
            pacing: AiPacing::default(),
            rng: GameRng::new(seed),
        }
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: AiPacing) -> Self {
        self.pacing = pacing;
        self
    }

    #[must_use]
    pub fn player(&self) -> PlayerNum {
        self.player
    }

    #[must_use]
    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// A random flavor line.
    pub fn quote(&mut self) -> &'static str {
        self.rng.choose(self.personality.quotes()).copied().unwrap_or("")
    }

    fn resolve(&mut self, flag: Option<bool>) -> bool {
        flag.unwrap_or_else(|| self.rng.gen_bool(0.5))
    }

    async fn pause(ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    // === Decisions ===

    /// Hand card to play as a resource this turn, if any.
    ///
    /// Personalities that hold resources skip the play once they can
    /// already pay for everything in hand.
    pub fn choose_resource(&mut self, hand: &[CardInstance], resources: usize) -> Option<InstanceId> {
        if hand.is_empty() {
            return None;
        }

        if self.resolve(self.params.hold_resources) {
            let most_expensive = hand
                .iter()
                .map(|c| c.card.cost_requirement().total() as usize)
                .max()
                .unwrap_or(0);
            if resources >= most_expensive {
                return None;
            }
        }

        if self.personality == Personality::Chaotic && self.rng.gen_bool(0.3) {
            let index = self.rng.gen_range_usize(0..hand.len());
            return Some(hand[index].instance_id);
        }

        if self.resolve(self.params.prefer_creatures) {
            if let Some(card) = hand.iter().find(|c| !c.is_pupil()) {
                return Some(card.instance_id);
            }
        }

        lowest_value(hand).map(|c| c.instance_id)
    }

    /// Score used to order plays. Higher plays first.
    #[must_use]
    pub fn play_priority(&self, card: &CardInstance) -> f64 {
        let mut score = card_value(card);
        match self.personality {
            Personality::Aggressive if card.is_pupil() => score += expected_damage(card) / 2.0,
            Personality::Defensive if card.is_pupil() => {
                score += f64::from(card.card.endurance.unwrap_or(0)) / 2.0;
            }
            Personality::Control if !card.is_pupil() => score += 1.0,
            _ => {}
        }
        if self.params.prefer_creatures == Some(true) && card.is_pupil() {
            score += 0.5;
        }
        score
    }

    /// Affordable hand cards in the order the AI wants to play them.
    #[must_use]
    pub fn rank_playable(&self, engine: &GameEngine) -> Vec<InstanceId> {
        let hand = &engine.state().player(self.player).hand;
        let mut ranked: Vec<(&CardInstance, f64)> = engine
            .playable_cards(self.player)
            .into_iter()
            .filter_map(|id| hand.iter().find(|c| c.instance_id == id))
            .filter(|c| !(c.card_type() == CardType::Interruption && self.personality.holds_interruptions()))
            .map(|c| (c, self.play_priority(c)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.into_iter().map(|(c, _)| c.instance_id).collect()
    }

    /// Which eligible attackers to send against the given blockers.
    ///
    /// With no blockers everyone attacks.
    pub fn decide_attackers(&mut self, attackers: &[CardInstance], blockers: &[CardInstance]) -> Vec<InstanceId> {
        if blockers.is_empty() {
            return attackers.iter().map(|c| c.instance_id).collect();
        }

        let avg_blocker = blockers.iter().map(card_value).sum::<f64>() / blockers.len() as f64;
        let bar = avg_blocker * (self.params.attack_threshold + 0.5) - self.params.risk_tolerance;
        let reckless = matches!(self.personality, Personality::Aggressive | Personality::Chaotic);

        let mut chosen = Vec::new();
        for attacker in attackers {
            let always = attacker.has(Keyword::Relentless) || attacker.has(Keyword::Overwhelm);
            let send = always
                || (reckless && self.rng.gen_bool(self.params.risk_tolerance))
                || card_value(attacker) >= bar;
            if send {
                chosen.push(attacker.instance_id);
            }
        }
        chosen
    }

    /// Assign blockers against incoming attackers, most valuable first.
    pub fn plan_blocks(&mut self, attackers: &[CardInstance], blockers: &[CardInstance]) -> BlockPlan {
        let mut incoming: Vec<&CardInstance> = attackers.iter().collect();
        incoming.sort_by(|a, b| card_value(b).total_cmp(&card_value(a)));

        let mut available: Vec<&CardInstance> = blockers.iter().filter(|c| c.can_block()).collect();
        let trade_bar = (1.0 + 4.0 * self.params.block_threshold) * (1.0 + self.params.risk_tolerance) / 1.5;

        let mut plan = Vec::new();
        for attacker in incoming {
            if available.is_empty() {
                break;
            }
            let hit = expected_damage(attacker);
            let survivor = available
                .iter()
                .enumerate()
                .filter(|(_, b)| f64::from(b.current_endurance.unwrap_or(0)) > hit)
                .min_by(|a, b| card_value(a.1).total_cmp(&card_value(b.1)))
                .map(|(i, _)| i);

            let pick = match survivor {
                Some(index) => Some(index),
                None if card_value(attacker) >= trade_bar => {
                    let declines = self.personality == Personality::Aggressive
                        && self.rng.gen_bool(self.params.risk_tolerance / 2.0);
                    if declines {
                        None
                    } else {
                        available
                            .iter()
                            .enumerate()
                            .min_by(|a, b| card_value(a.1).total_cmp(&card_value(b.1)))
                            .map(|(i, _)| i)
                    }
                }
                None => None,
            };

            if let Some(index) = pick {
                let blocker = available.remove(index);
                plan.push((blocker.instance_id, attacker.instance_id));
            }
        }
        plan
    }

    // === Driving the engine ===

    /// Play the AI's turn up to combat and, when no blockers are pending,
    /// end it.
    pub async fn take_turn(&mut self, engine: &mut GameEngine) -> TurnSummary {
        let mut summary = TurnSummary::default();
        if !engine.is_player_turn(self.player) || engine.state().game_over {
            return summary;
        }
        let me = self.player;

        Self::pause(self.pacing.thinking_delay_ms).await;

        let ps = engine.state().player(me);
        let hand: Vec<CardInstance> = ps.hand.iter().cloned().collect();
        let resources = ps.resources.len();
        if let Some(id) = self.choose_resource(&hand, resources) {
            match engine.play_card(me, id, true) {
                Ok(_) => summary.resource = Some(id),
                Err(err) => tracing::debug!(player = %me, %err, "ai resource rejected"),
            }
        }
        Self::pause(self.pacing.action_delay_ms).await;

        for id in self.rank_playable(engine) {
            let affordable = engine
                .state()
                .player(me)
                .hand_card(id)
                .is_some_and(|c| engine.can_afford(&c.card, me));
            if !affordable {
                continue;
            }
            match engine.play_card(me, id, false) {
                Ok(_) => {
                    summary.cards_played.push(id);
                    Self::pause(self.pacing.action_delay_ms).await;
                }
                Err(err) => tracing::debug!(player = %me, %err, "ai play rejected"),
            }
        }
        Self::pause(self.pacing.action_delay_ms).await;

        self.attack(engine, &mut summary).await;

        summary.awaiting_blockers = engine.state().combat_step == Some(CombatStep::DeclareBlockers);
        if !summary.awaiting_blockers {
            summary.ended_turn = self.finish_turn(engine).await;
        }
        tracing::debug!(
            player = %me,
            played = summary.cards_played.len(),
            attackers = summary.attackers.len(),
            "ai turn"
        );
        summary
    }

    async fn attack(&mut self, engine: &mut GameEngine, summary: &mut TurnSummary) {
        let me = self.player;
        let eligible: Vec<CardInstance> = engine
            .state()
            .player(me)
            .field
            .iter()
            .filter(|c| c.can_attack())
            .cloned()
            .collect();
        if eligible.is_empty() || engine.state().game_over {
            return;
        }
        if engine.start_combat(me).is_err() {
            return;
        }
        Self::pause(self.pacing.action_delay_ms).await;

        let blockers: Vec<CardInstance> = engine
            .state()
            .player(me.opponent())
            .available_blockers()
            .cloned()
            .collect();
        for id in self.decide_attackers(&eligible, &blockers) {
            if engine.toggle_attacker(me, id).is_ok() {
                summary.attackers.push(id);
            }
        }
        Self::pause(self.pacing.action_delay_ms).await;

        if let Err(err) = engine.confirm_attackers(me) {
            tracing::debug!(player = %me, %err, "ai confirm attackers rejected");
        }
    }

    /// End the turn once combat is settled. Returns whether it ended.
    pub async fn finish_turn(&mut self, engine: &mut GameEngine) -> bool {
        if !engine.is_player_turn(self.player)
            || engine.state().game_over
            || engine.state().combat_step == Some(CombatStep::DeclareBlockers)
        {
            return false;
        }
        Self::pause(self.pacing.end_turn_delay_ms).await;
        engine.end_turn(self.player).is_ok()
    }

    /// Defend: assign blockers and confirm them. Returns the plan used.
    pub async fn declare_blockers(&mut self, engine: &mut GameEngine) -> BlockPlan {
        let state = engine.state();
        if state.combat_step != Some(CombatStep::DeclareBlockers) || state.current_player == self.player {
            return Vec::new();
        }
        let me = self.player;

        Self::pause(self.pacing.thinking_delay_ms).await;

        let state = engine.state();
        let attacking = state.player(me.opponent());
        let attackers: Vec<CardInstance> = state
            .attackers
            .iter()
            .filter_map(|id| attacking.field_card(*id).cloned())
            .collect();
        let blockers: Vec<CardInstance> = state.player(me).available_blockers().cloned().collect();

        let plan = self.plan_blocks(&attackers, &blockers);
        for (blocker, attacker) in &plan {
            if let Err(err) = engine.toggle_blocker(me, *blocker, *attacker) {
                tracing::debug!(player = %me, %err, "ai block rejected");
            }
        }
        Self::pause(self.pacing.action_delay_ms).await;

        if let Err(err) = engine.confirm_blockers(me) {
            tracing::debug!(player = %me, %err, "ai confirm blockers rejected");
        }
        plan
    }
}

fn lowest_value(cards: &[CardInstance]) -> Option<&CardInstance> {
    cards.iter().min_by(|a, b| card_value(a).total_cmp(&card_value(b)))
}
