//! Private lobbies.
//!
//! The host creates a lobby with a short join code, guests join by code
//! or id, everyone marks ready with a deck, and the host starts the match.
//! Only the host ever creates the match, so there is nothing to race.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::factory::create_match;
use super::{MatchmakingConfig, MatchmakingError};
use crate::core::GameRng;
use crate::sync::{join_path, MatchMode, Namespace, PlayerProfile, PlayerSlot, RemoteStore, StoreEvent, Subscription};

/// Join code characters. Look-alikes (0/O, 1/I) are left out.
pub const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Inputs at most this long are treated as join codes.
const MAX_CODE_INPUT: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyStatus {
    #[default]
    Waiting,
    Started,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyMember {
    pub user_id: String,
    pub display_name: String,
    pub rating: i32,
    pub ready: bool,
    pub deck_id: Option<String>,
    pub is_host: bool,
    pub joined_at: Value,
}

impl LobbyMember {
    fn from_profile(profile: &PlayerProfile, is_host: bool, joined_at: Value) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            display_name: profile.display_name.clone(),
            rating: profile.rating,
            ready: false,
            deck_id: None,
            is_host,
            joined_at,
        }
    }

    fn slot(&self) -> PlayerSlot {
        PlayerSlot::new(&self.user_id, &self.display_name)
            .with_deck(self.deck_id.clone())
            .with_rating(self.rating)
    }
}

/// The lobby document at `lobbies/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyRecord {
    pub id: String,
    pub join_code: String,
    pub host_id: String,
    pub host_name: String,
    pub mode: MatchMode,
    pub allow_spectators: bool,
    pub status: LobbyStatus,
    pub max_players: usize,
    pub players: BTreeMap<String, LobbyMember>,
    pub created_at: Value,
    pub match_id: Option<String>,
}

impl Default for LobbyRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            join_code: String::new(),
            host_id: String::new(),
            host_name: String::new(),
            mode: MatchMode::Casual,
            allow_spectators: true,
            status: LobbyStatus::Waiting,
            max_players: 2,
            players: BTreeMap::new(),
            created_at: Value::Null,
            match_id: None,
        }
    }
}

impl LobbyRecord {
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    #[must_use]
    pub fn all_ready(&self) -> bool {
        self.players.values().all(|p| p.ready)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LobbyEvent {
    Updated(LobbyRecord),
    MatchStarted { match_id: String },
    Kicked,
    Closed,
}

/// Random join code of `length` characters.
pub fn generate_join_code(rng: &mut GameRng, length: usize) -> String {
    (0..length)
        .filter_map(|_| rng.choose(JOIN_CODE_ALPHABET).map(|&b| char::from(b)))
        .collect()
}

/// Lobbies still accepting players.
pub fn active_lobbies(store: &impl RemoteStore, ns: &Namespace) -> Result<Vec<LobbyRecord>, MatchmakingError> {
    let Some(Value::Object(lobbies)) = store.get(&ns.lobbies())? else {
        return Ok(Vec::new());
    };
    Ok(lobbies
        .into_iter()
        .filter_map(|(_, value)| serde_json::from_value::<LobbyRecord>(value).ok())
        .filter(|lobby| lobby.status == LobbyStatus::Waiting)
        .collect())
}

/// This client's membership of one lobby.
pub struct Lobby<S: RemoteStore> {
    store: S,
    config: MatchmakingConfig,
    profile: PlayerProfile,
    lobby_id: String,
    join_code: String,
    is_host: bool,
    sub: Subscription,
    present: bool,
    left: bool,
}

impl<S: RemoteStore> Lobby<S> {
    pub fn create(
        store: S,
        config: MatchmakingConfig,
        profile: PlayerProfile,
        mode: MatchMode,
        allow_spectators: bool,
        rng: &mut GameRng,
    ) -> Result<Self, MatchmakingError> {
        let ns = &config.namespace;
        let lobby_id = store.push_unique_key(&ns.lobbies());
        let join_code = generate_join_code(rng, config.join_code_length);
        let joined_at = store.server_timestamp();

        let mut players = BTreeMap::new();
        players.insert(
            profile.user_id.clone(),
            LobbyMember::from_profile(&profile, true, joined_at.clone()),
        );
        let record = LobbyRecord {
            id: lobby_id.clone(),
            join_code: join_code.clone(),
            host_id: profile.user_id.clone(),
            host_name: profile.display_name.clone(),
            mode,
            allow_spectators,
            status: LobbyStatus::Waiting,
            max_players: config.max_lobby_players,
            players,
            created_at: joined_at,
            match_id: None,
        };

        let path = ns.lobby_path(&lobby_id);
        store.set(&path, serde_json::to_value(&record)?)?;
        store.register_on_disconnect_write(&path, Value::Null)?;
        let sub = store.subscribe(&path);
        tracing::info!(lobby_id = %lobby_id, join_code = %join_code, host = %profile.user_id, "lobby created");

        Ok(Self {
            store,
            config,
            profile,
            lobby_id,
            join_code,
            is_host: true,
            sub,
            present: true,
            left: false,
        })
    }

    /// Join by join code or lobby id.
    pub fn join(store: S, config: MatchmakingConfig, profile: PlayerProfile, id_or_code: &str) -> Result<Self, MatchmakingError> {
        let ns = &config.namespace;
        let lobby = find_lobby(&store, ns, id_or_code)?.ok_or(MatchmakingError::LobbyNotFound)?;
        let rejoining = lobby.players.contains_key(&profile.user_id);
        if lobby.is_full() && !rejoining {
            return Err(MatchmakingError::LobbyFull);
        }
        if lobby.status != LobbyStatus::Waiting {
            return Err(MatchmakingError::LobbyClosed);
        }

        let path = ns.lobby_path(&lobby.id);
        let member_path = join_path(&path, &format!("players/{}", profile.user_id));
        if !rejoining {
            let member = LobbyMember::from_profile(&profile, false, store.server_timestamp());
            store.set(&member_path, serde_json::to_value(&member)?)?;
        }
        store.register_on_disconnect_write(&member_path, Value::Null)?;
        let sub = store.subscribe(&path);
        tracing::info!(lobby_id = %lobby.id, user = %profile.user_id, "joined lobby");

        Ok(Self {
            store,
            is_host: lobby.host_id == profile.user_id,
            config,
            profile,
            lobby_id: lobby.id,
            join_code: lobby.join_code,
            sub,
            present: true,
            left: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.lobby_id
    }

    #[must_use]
    pub fn join_code(&self) -> &str {
        &self.join_code
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        self.is_host
    }

    fn path(&self) -> String {
        self.config.namespace.lobby_path(&self.lobby_id)
    }

    fn member_path(&self, user_id: &str) -> String {
        join_path(&self.path(), &format!("players/{user_id}"))
    }

    pub fn record(&self) -> Result<LobbyRecord, MatchmakingError> {
        let value = self.store.get(&self.path())?.ok_or(MatchmakingError::LobbyNotFound)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn set_ready(&self, ready: bool, deck_id: Option<String>) -> Result<(), MatchmakingError> {
        let mut fields = Map::new();
        fields.insert("ready".into(), Value::Bool(ready));
        fields.insert("deck_id".into(), deck_id.map_or(Value::Null, Value::from));
        self.store.update(&self.member_path(&self.profile.user_id), fields)?;
        Ok(())
    }

    /// Host only. Seats the host as player 1.
    pub fn start_match(&self) -> Result<String, MatchmakingError> {
        if !self.is_host {
            return Err(MatchmakingError::NotHost);
        }
        let lobby = self.record()?;
        if lobby.status != LobbyStatus::Waiting {
            return Err(MatchmakingError::LobbyClosed);
        }
        if lobby.players.len() < 2 {
            return Err(MatchmakingError::NotEnoughPlayers);
        }
        if !lobby.all_ready() {
            return Err(MatchmakingError::NotAllReady);
        }

        let host = lobby
            .players
            .get(&lobby.host_id)
            .ok_or(MatchmakingError::NotHost)?;
        let Some(guest) = lobby.players.values().find(|p| p.user_id != lobby.host_id) else {
            return Err(MatchmakingError::NotEnoughPlayers);
        };

        let ns = &self.config.namespace;
        let match_id = create_match(&self.store, ns, lobby.mode, host.slot(), guest.slot(), lobby.allow_spectators)?;

        let mut fields = Map::new();
        fields.insert("status".into(), serde_json::to_value(LobbyStatus::Started)?);
        fields.insert("match_id".into(), Value::from(match_id.as_str()));
        self.store.update(&self.path(), fields)?;
        // A started lobby outlives the host's connection so the guest sees it.
        self.store.cancel_on_disconnect_write(&self.path());
        tracing::info!(lobby_id = %self.lobby_id, match_id = %match_id, "lobby started match");
        Ok(match_id)
    }

    pub fn kick(&self, user_id: &str) -> Result<(), MatchmakingError> {
        if !self.is_host {
            return Err(MatchmakingError::NotHost);
        }
        if user_id == self.profile.user_id {
            return Err(MatchmakingError::CannotKickSelf);
        }
        self.store.remove(&self.member_path(user_id))?;
        tracing::info!(lobby_id = %self.lobby_id, user = user_id, "kicked from lobby");
        Ok(())
    }

    /// Leave. A leaving host closes the lobby.
    pub fn leave(&mut self) -> Result<(), MatchmakingError> {
        if self.left {
            return Ok(());
        }
        self.left = true;
        self.store.unsubscribe(self.sub.id());
        if self.is_host {
            self.store.cancel_on_disconnect_write(&self.path());
            self.store.remove(&self.path())?;
        } else {
            let member = self.member_path(&self.profile.user_id);
            self.store.cancel_on_disconnect_write(&member);
            self.store.remove(&member)?;
        }
        tracing::info!(lobby_id = %self.lobby_id, user = %self.profile.user_id, "left lobby");
        Ok(())
    }

    /// Changes since the last poll, oldest first.
    pub fn poll(&mut self) -> Vec<LobbyEvent> {
        let mut events = Vec::new();
        for event in self.sub.drain() {
            let StoreEvent::Value(value) = event else {
                continue;
            };
            let Some(value) = value else {
                events.push(LobbyEvent::Closed);
                continue;
            };
            let lobby: LobbyRecord = match serde_json::from_value(value) {
                Ok(lobby) => lobby,
                Err(err) => {
                    tracing::warn!(lobby_id = %self.lobby_id, error = %err, "unreadable lobby");
                    continue;
                }
            };

            let member = lobby.players.contains_key(&self.profile.user_id);
            if self.present && !member {
                self.present = false;
                events.push(LobbyEvent::Kicked);
                continue;
            }
            if let (LobbyStatus::Started, Some(match_id)) = (lobby.status, lobby.match_id.clone()) {
                events.push(LobbyEvent::MatchStarted { match_id });
            } else {
                events.push(LobbyEvent::Updated(lobby));
            }
        }
        events
    }
}

fn find_lobby(store: &impl RemoteStore, ns: &Namespace, id_or_code: &str) -> Result<Option<LobbyRecord>, MatchmakingError> {
    let input = id_or_code.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if input.len() <= MAX_CODE_INPUT {
        let code = input.to_uppercase();
        let Some(Value::Object(lobbies)) = store.get(&ns.lobbies())? else {
            return Ok(None);
        };
        return Ok(lobbies
            .into_iter()
            .filter_map(|(_, value)| serde_json::from_value::<LobbyRecord>(value).ok())
            .find(|lobby| lobby.join_code == code));
    }
    match store.get(&ns.lobby_path(input))? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
