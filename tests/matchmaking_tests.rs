//! Matchmaking queue and lobby tests.
//!
//! Every client gets its own connection to a shared `InMemoryStore`, the
//! way separate browsers would.

use std::time::{Duration, Instant};

use riutiz_ccg::core::{GameRng, PlayerNum};
use riutiz_ccg::matchmaking::{
    active_lobbies, active_matches, Lobby, LobbyEvent, LobbyStatus, MatchmakingConfig, MatchmakingError,
    MatchmakingQueue, QueuePoll,
};
use riutiz_ccg::sync::{InMemoryStore, MatchMode, MatchRecord, MatchStatus, Namespace, PlayerProfile, StoreHandle};

const QUEUE: &str = "arcade/matchmaking/riutiz/queue";

fn queue_client(store: &InMemoryStore, user: &str, rating: i32) -> (StoreHandle, MatchmakingQueue<StoreHandle>) {
    let handle = store.connect();
    let profile = PlayerProfile::new(user, user.to_uppercase()).with_rating(rating);
    let queue = MatchmakingQueue::new(handle.clone(), MatchmakingConfig::default(), profile);
    (handle, queue)
}

fn matched(poll: QueuePoll) -> (String, bool, Option<u32>) {
    match poll {
        QueuePoll::Matched(found) => (found.match_id, found.created, found.quality),
        other => panic!("expected a match, got {other:?}"),
    }
}

fn read_match(store: &InMemoryStore, id: &str) -> MatchRecord {
    serde_json::from_value(store.peek(&format!("arcade/matches/riutiz/{id}")).unwrap()).unwrap()
}

fn profile(user: &str) -> PlayerProfile {
    PlayerProfile::new(user, user.to_uppercase())
}

// =============================================================================
// Queue
// =============================================================================

/// Test that two queued players end up in one match with one creator.
#[test]
fn test_queue_pairs_with_single_creator() {
    let store = InMemoryStore::new();
    let now = Instant::now();
    let (_a, mut alice) = queue_client(&store, "alice", 1000);
    let (_b, mut bob) = queue_client(&store, "bob", 1040);

    alice.join(MatchMode::Casual, Some("deck-a".into())).unwrap();
    store.advance_clock(250);
    bob.join(MatchMode::Casual, None).unwrap();

    // Bob joined later, so he waits for Alice to create.
    assert_eq!(bob.poll(now).unwrap(), QueuePoll::Waiting);
    assert!(bob.is_queued());

    let (match_id, created, quality) = matched(alice.poll(now).unwrap());
    assert!(created);
    assert_eq!(quality, Some(100));
    assert!(!alice.is_queued());

    // The assignment is seen even inside the scan interval.
    let (their_id, created, quality) = matched(bob.poll(now).unwrap());
    assert_eq!(their_id, match_id);
    assert!(!created);
    assert_eq!(quality, Some(100));
    assert_eq!(store.peek(QUEUE), None);

    let record = read_match(&store, &match_id);
    assert_eq!(record.status, MatchStatus::Starting);
    assert_eq!(record.seat_of("alice"), Some(PlayerNum::One));
    assert_eq!(record.seat_of("bob"), Some(PlayerNum::Two));
    assert_eq!(record.players[PlayerNum::One].deck_id.as_deref(), Some("deck-a"));
    assert!(record.players[PlayerNum::One].connected);
    assert!(!record.players[PlayerNum::Two].connected);

    assert_eq!(bob.poll(now).unwrap(), QueuePoll::Idle);
}

/// Test that modes never pair across each other.
#[test]
fn test_queue_respects_mode() {
    let store = InMemoryStore::new();
    let now = Instant::now();
    let (_a, mut alice) = queue_client(&store, "alice", 1000);
    let (_c, mut carol) = queue_client(&store, "carol", 1000);

    alice.join(MatchMode::Ranked, None).unwrap();
    carol.join(MatchMode::Casual, None).unwrap();

    assert_eq!(alice.poll(now).unwrap(), QueuePoll::Waiting);
    assert_eq!(carol.poll(now).unwrap(), QueuePoll::Waiting);
    assert!(active_matches(&store.connect(), &Namespace::default()).unwrap().is_empty());
}

/// Test scanning is throttled to the poll interval.
#[test]
fn test_queue_scan_interval() {
    let store = InMemoryStore::new();
    let now = Instant::now();
    let (_a, mut alice) = queue_client(&store, "alice", 1000);
    alice.join(MatchMode::Casual, None).unwrap();
    assert_eq!(alice.poll(now).unwrap(), QueuePoll::Waiting);

    store.advance_clock(10);
    let (_b, mut bob) = queue_client(&store, "bob", 1000);
    bob.join(MatchMode::Casual, None).unwrap();

    // Within the interval Alice does not look again.
    assert_eq!(alice.poll(now + Duration::from_millis(500)).unwrap(), QueuePoll::Waiting);
    let (_, created, _) = matched(alice.poll(now + Duration::from_millis(2_000)).unwrap());
    assert!(created);
}

/// Test join, rejoin, leave and disconnect cleanup.
#[test]
fn test_queue_membership() {
    let store = InMemoryStore::new();
    let now = Instant::now();
    let (handle, mut alice) = queue_client(&store, "alice", 1000);

    assert_eq!(alice.poll(now).unwrap(), QueuePoll::Idle);
    alice.join(MatchMode::Casual, None).unwrap();
    assert!(matches!(
        alice.join(MatchMode::Casual, None),
        Err(MatchmakingError::AlreadyQueued)
    ));

    alice.leave().unwrap();
    assert!(!alice.is_queued());
    assert_eq!(store.peek(&format!("{QUEUE}/alice")), None);

    alice.join(MatchMode::Ranked, None).unwrap();
    assert!(store.peek(&format!("{QUEUE}/alice")).is_some());
    store.drop_connection(&handle);
    assert_eq!(store.peek(&format!("{QUEUE}/alice")), None);
}

// =============================================================================
// Lobbies
// =============================================================================

/// Test the whole lobby flow from code to match.
#[test]
fn test_lobby_create_join_start() {
    let store = InMemoryStore::new();
    let config = MatchmakingConfig::default();
    let mut rng = GameRng::new(31);

    let mut host = Lobby::create(
        store.connect(),
        config.clone(),
        profile("alice"),
        MatchMode::Casual,
        false,
        &mut rng,
    )
    .unwrap();
    assert!(host.is_host());
    assert_eq!(host.join_code().len(), 6);

    let code = host.join_code().to_lowercase();
    let mut guest = Lobby::join(store.connect(), config.clone(), profile("bob"), &code).unwrap();
    assert!(!guest.is_host());
    assert_eq!(guest.id(), host.id());

    let listed = active_lobbies(&store.connect(), &Namespace::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].players.len(), 2);

    assert!(matches!(host.start_match(), Err(MatchmakingError::NotAllReady)));
    assert!(matches!(guest.start_match(), Err(MatchmakingError::NotHost)));

    host.set_ready(true, Some("deck-a".into())).unwrap();
    guest.set_ready(true, Some("deck-b".into())).unwrap();
    let match_id = host.start_match().unwrap();

    let events = guest.poll();
    assert_eq!(
        events.last(),
        Some(&LobbyEvent::MatchStarted {
            match_id: match_id.clone()
        })
    );
    assert!(matches!(host.poll().last(), Some(LobbyEvent::MatchStarted { .. })));

    let record = read_match(&store, &match_id);
    assert_eq!(record.seat_of("alice"), Some(PlayerNum::One));
    assert_eq!(record.players[PlayerNum::Two].deck_id.as_deref(), Some("deck-b"));
    assert!(!record.allow_spectators);
    assert_eq!(host.record().unwrap().status, LobbyStatus::Started);

    // Two players fill a lobby; capacity is checked first.
    let late = Lobby::join(store.connect(), config, profile("carol"), &code);
    assert!(matches!(late, Err(MatchmakingError::LobbyFull)));
    assert!(active_lobbies(&store.connect(), &Namespace::default()).unwrap().is_empty());
}

/// Test that a started lobby with room left refuses newcomers.
#[test]
fn test_started_lobby_is_closed() {
    let store = InMemoryStore::new();
    let config = MatchmakingConfig {
        max_lobby_players: 3,
        ..MatchmakingConfig::default()
    };
    let mut rng = GameRng::new(5);

    let host = Lobby::create(store.connect(), config.clone(), profile("alice"), MatchMode::Ranked, true, &mut rng).unwrap();
    let guest = Lobby::join(store.connect(), config.clone(), profile("bob"), host.id()).unwrap();
    host.set_ready(true, None).unwrap();
    guest.set_ready(true, None).unwrap();
    host.start_match().unwrap();

    let late = Lobby::join(store.connect(), config, profile("carol"), host.join_code());
    assert!(matches!(late, Err(MatchmakingError::LobbyClosed)));
    assert!(matches!(host.start_match(), Err(MatchmakingError::LobbyClosed)));
}

/// Test kicking and the guest's view of it.
#[test]
fn test_lobby_kick() {
    let store = InMemoryStore::new();
    let config = MatchmakingConfig::default();
    let mut rng = GameRng::new(8);

    let host = Lobby::create(store.connect(), config.clone(), profile("alice"), MatchMode::Casual, true, &mut rng).unwrap();
    let mut guest = Lobby::join(store.connect(), config, profile("bob"), host.join_code()).unwrap();
    guest.poll();

    assert!(matches!(guest.kick("alice"), Err(MatchmakingError::NotHost)));
    assert!(matches!(host.kick("alice"), Err(MatchmakingError::CannotKickSelf)));
    host.kick("bob").unwrap();

    assert_eq!(guest.poll(), vec![LobbyEvent::Kicked]);
    assert!(matches!(host.start_match(), Err(MatchmakingError::NotEnoughPlayers)));
    assert_eq!(host.record().unwrap().players.len(), 1);
}

/// Test leaving and disconnect cleanup.
#[test]
fn test_lobby_leave_and_disconnect() {
    let store = InMemoryStore::new();
    let config = MatchmakingConfig::default();
    let mut rng = GameRng::new(13);

    let mut host = Lobby::create(store.connect(), config.clone(), profile("alice"), MatchMode::Casual, true, &mut rng).unwrap();
    let guest_conn = store.connect();
    let guest = Lobby::join(guest_conn.clone(), config.clone(), profile("bob"), host.join_code()).unwrap();
    host.poll();

    store.drop_connection(&guest_conn);
    assert_eq!(host.record().unwrap().players.len(), 1);
    drop(guest);

    let mut second = Lobby::join(store.connect(), config.clone(), profile("dave"), host.join_code()).unwrap();
    second.poll();
    host.leave().unwrap();
    assert_eq!(second.poll(), vec![LobbyEvent::Closed]);

    let missing = Lobby::join(store.connect(), config, profile("erin"), "ZZZZZZ");
    assert!(matches!(missing, Err(MatchmakingError::LobbyNotFound)));
}
