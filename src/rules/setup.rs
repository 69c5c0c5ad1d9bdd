//! Match creation: decks, shuffles and opening hands.

use thiserror::Error;

use super::engine::GameEngine;
use crate::cards::{CardDefinition, CardInstance, CardRegistry};
use crate::core::{EngineConfig, GameRng, InstanceAllocator, MatchState, PlayerMap, PlayerNum, PlayerState};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("No cards available to build a random deck")]
    EmptyCardPool,
}

/// Builds the starting `MatchState` for two players.
///
/// A player without a deck list (or whose list names no known cards) gets a
/// random deck drawn from the registry's deck pool. Every deck is shuffled
/// with a per-seat RNG stream, so a seed fully determines the opening.
///
/// ```
/// use riutiz_ccg::cards::{CardDefinition, CardRegistry, CardType};
/// use riutiz_ccg::core::PlayerNum;
/// use riutiz_ccg::rules::MatchBuilder;
///
/// let mut registry = CardRegistry::new();
/// registry.register(CardDefinition::new("1", "Study Buddy", CardType::Pupil).with_cost("(1)"));
///
/// let engine = MatchBuilder::new(7).build(&registry).unwrap();
/// let state = engine.state();
/// assert_eq!(state.player(PlayerNum::One).hand.len(), 7);
/// assert_eq!(state.player(PlayerNum::One).deck.len(), 33);
/// ```
#[derive(Clone, Debug)]
pub struct MatchBuilder {
    config: EngineConfig,
    seed: u64,
    decks: PlayerMap<Option<Vec<String>>>,
}

impl MatchBuilder {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            config: EngineConfig::default(),
            seed,
            decks: PlayerMap::with_value(None),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a deck list of card ids for `player`.
    #[must_use]
    pub fn with_deck<I, S>(mut self, player: PlayerNum, card_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decks[player] = Some(card_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Build the opening state.
    pub fn build_state(&self, registry: &CardRegistry) -> Result<MatchState, SetupError> {
        let rng = GameRng::new(self.seed);
        let mut ids = InstanceAllocator::default();
        let mut players = PlayerMap::<PlayerState>::with_default();

        for player in PlayerNum::BOTH {
            let mut deck_rng = rng.for_context(&format!("deck-{}", player.number()));
            let mut cards = self.deck_cards(player, registry, &mut deck_rng)?;
            deck_rng.shuffle(&mut cards);

            let instances: Vec<CardInstance> = cards
                .into_iter()
                .map(|card| CardInstance::new(ids.next_id(), card))
                .collect();
            let mut ps = PlayerState::with_deck(instances);
            ps.draw(self.config.starting_hand_size);
            players[player] = ps;
        }

        let mut state = MatchState::new(players, self.seed);
        state.instance_ids = ids;
        tracing::info!(seed = self.seed, "match state created");
        Ok(state)
    }

    pub fn build(self, registry: &CardRegistry) -> Result<GameEngine, SetupError> {
        let state = self.build_state(registry)?;
        Ok(GameEngine::new(self.config, state))
    }

    fn deck_cards(
        &self,
        player: PlayerNum,
        registry: &CardRegistry,
        rng: &mut GameRng,
    ) -> Result<Vec<CardDefinition>, SetupError> {
        if let Some(list) = &self.decks[player] {
            let cards: Vec<CardDefinition> = list
                .iter()
                .filter_map(|id| {
                    let card = registry.get(id);
                    if card.is_none() {
                        tracing::warn!(%player, card = %id, "unknown card in deck list");
                    }
                    card.cloned()
                })
                .collect();
            if !cards.is_empty() {
                return Ok(cards);
            }
        }

        let pool: Vec<&CardDefinition> = registry.deck_pool().collect();
        if pool.is_empty() {
            return Err(SetupError::EmptyCardPool);
        }
        Ok((0..self.config.random_deck_size)
            .filter_map(|_| rng.choose(&pool).map(|card| (*card).clone()))
            .collect())
    }
}
