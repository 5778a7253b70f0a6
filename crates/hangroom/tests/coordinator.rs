//! Integration tests for the session coordinator over in-memory ports.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use hangroom::prelude::*;
use hangroom_registry::{ConnectionRecord, RegistryError};
use hangroom_room::{StoreError, StoredSession, Version};
use hangroom_transport::OutboxReceiver;
use serde_json::{Value, json};

// =========================================================================
// Helpers
// =========================================================================

type Coordinator<S = InMemorySessionStore, R = InMemoryConnectionRegistry> =
    SessionCoordinator<S, R, Outbox, JsonCodec>;

struct Harness<S = InMemorySessionStore, R = InMemoryConnectionRegistry> {
    coordinator: Arc<Coordinator<S, R>>,
    store: Arc<S>,
    registry: Arc<R>,
    outbox: Arc<Outbox>,
}

impl Harness {
    fn new() -> Self {
        Self::with(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryConnectionRegistry::new()),
        )
    }
}

impl<S: SessionStore, R: ConnectionRegistry> Harness<S, R> {
    fn with(store: Arc<S>, registry: Arc<R>) -> Self {
        let outbox = Arc::new(Outbox::new());
        let coordinator = SessionCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&outbox),
            JsonCodec,
        )
        .with_words(WordList::new(["cat"]).unwrap());
        Self {
            coordinator: Arc::new(coordinator),
            store,
            registry,
            outbox,
        }
    }

    async fn connect(&self, id: u64) -> Client {
        let id = ConnectionId::new(id);
        let rx = self.outbox.attach(id).await;
        self.coordinator.connect(id).await;
        Client { id, rx }
    }

    async fn send(&self, client: &Client, request: Value) {
        let bytes = serde_json::to_vec(&request).unwrap();
        self.coordinator
            .handle_bytes(client.id, &bytes)
            .await
            .unwrap();
    }

    async fn session(&self, room: &str) -> GameSession {
        self.store
            .get(&RoomCode::parse(room).unwrap())
            .await
            .unwrap()
            .session
    }

    /// Connects a host and a guest and seats both in a fresh room.
    async fn two_player_room(&self) -> (Client, Client, String) {
        let mut host = self.connect(1).await;
        let mut guest = self.connect(2).await;

        self.send(&host, json!({"action": "createRoom", "playerName": "Ann"}))
            .await;
        let created = host.next_event();
        let room = created["roomId"].as_str().unwrap().to_string();

        self.send(
            &guest,
            json!({"action": "joinRoom", "roomId": room, "playerName": "Bob"}),
        )
        .await;
        assert_eq!(host.next_event()["action"], "gameStarted");
        assert_eq!(guest.next_event()["action"], "gameStarted");
        (host, guest, room)
    }
}

struct Client {
    id: ConnectionId,
    rx: OutboxReceiver,
}

impl Client {
    fn next_event(&mut self) -> Value {
        let bytes = self.rx.try_recv().expect("an event should be queued");
        serde_json::from_slice(&bytes).unwrap()
    }

    fn drain(&mut self) -> Vec<Value> {
        let mut events = Vec::new();
        while let Ok(bytes) = self.rx.try_recv() {
            events.push(serde_json::from_slice(&bytes).unwrap());
        }
        events
    }

    fn assert_quiet(&mut self) {
        assert!(self.rx.try_recv().is_err(), "no event expected");
    }
}

// =========================================================================
// createRoom / joinRoom
// =========================================================================

#[tokio::test]
async fn test_create_room_replies_to_creator_only() {
    let harness = Harness::new();
    let mut host = harness.connect(1).await;
    let mut other = harness.connect(2).await;

    harness
        .send(&host, json!({"action": "createRoom", "playerName": "  Ann  "}))
        .await;

    let event = host.next_event();
    assert_eq!(event["action"], "roomCreated");
    let room = event["roomId"].as_str().unwrap();
    assert_eq!(room.len(), 4);
    assert_eq!(event["gameState"]["status"], "waiting");
    assert_eq!(event["gameState"]["maskedWord"], "___");
    assert_eq!(event["gameState"]["maxWrongGuesses"], 6);
    assert_eq!(
        event["gameState"]["players"],
        json!([{"name": "Ann", "isHost": true}])
    );
    assert!(event["gameState"].get("word").is_none());
    other.assert_quiet();

    let record = harness.registry.lookup(host.id).await.unwrap();
    assert_eq!(record.room.unwrap().as_str(), room);
    assert_eq!(record.player_name.as_deref(), Some("Ann"));
}

#[tokio::test]
async fn test_create_room_without_name_uses_default() {
    let harness = Harness::new();
    let mut host = harness.connect(1).await;

    harness.send(&host, json!({"action": "createRoom"})).await;

    assert_eq!(
        host.next_event()["gameState"]["players"][0]["name"],
        "Player 1"
    );
}

#[tokio::test]
async fn test_join_room_broadcasts_game_started_to_both() {
    let harness = Harness::new();
    let (_host, _guest, room) = harness.two_player_room().await;

    let session = harness.session(&room).await;
    assert_eq!(session.status(), GameStatus::Playing);
    assert_eq!(session.player_names(), vec!["Ann", "Bob"]);
    assert_eq!(
        harness.registry.members_of(&RoomCode::parse(&room).unwrap()).await,
        vec![ConnectionId::new(1), ConnectionId::new(2)]
    );
}

#[tokio::test]
async fn test_join_room_code_is_case_insensitive() {
    let harness = Harness::new();
    let mut host = harness.connect(1).await;
    let mut guest = harness.connect(2).await;
    harness.send(&host, json!({"action": "createRoom"})).await;
    let room = host.next_event()["roomId"].as_str().unwrap().to_lowercase();

    harness
        .send(&guest, json!({"action": "joinRoom", "roomId": room}))
        .await;

    let event = guest.next_event();
    assert_eq!(event["action"], "gameStarted");
    assert_eq!(event["gameState"]["players"][1]["name"], "Player 2");
}

#[tokio::test]
async fn test_join_unknown_room_is_not_found() {
    let harness = Harness::new();
    let mut guest = harness.connect(2).await;

    harness
        .send(&guest, json!({"action": "joinRoom", "roomId": "ZZZZ"}))
        .await;
    assert_eq!(
        guest.next_event(),
        json!({"action": "error", "message": "Room not found"})
    );

    harness
        .send(&guest, json!({"action": "joinRoom", "roomId": "!!"}))
        .await;
    assert_eq!(guest.next_event()["message"], "Room not found");
}

#[tokio::test]
async fn test_join_full_room_is_rejected_without_broadcast() {
    let harness = Harness::new();
    let (mut host, mut guest, room) = harness.two_player_room().await;
    let mut third = harness.connect(3).await;

    harness
        .send(&third, json!({"action": "joinRoom", "roomId": room}))
        .await;

    assert_eq!(third.next_event()["message"], "Room is full");
    host.assert_quiet();
    guest.assert_quiet();
    assert_eq!(harness.session(&room).await.players().len(), 2);
}

#[tokio::test]
async fn test_create_while_in_room_is_rejected() {
    let harness = Harness::new();
    let (mut host, _guest, _room) = harness.two_player_room().await;

    harness.send(&host, json!({"action": "createRoom"})).await;

    assert_eq!(host.next_event()["message"], "Already in a room");
    assert_eq!(harness.store.len().await, 1);
}

// =========================================================================
// guess / newGame
// =========================================================================

#[tokio::test]
async fn test_guess_game_won_broadcasts_revealed_word() {
    let harness = Harness::new();
    let (mut host, mut guest, _room) = harness.two_player_room().await;

    harness.send(&host, json!({"action": "guess", "letter": "C"})).await;
    let event = guest.next_event();
    assert_eq!(event["action"], "guessResult");
    assert_eq!(event["letter"], "c");
    assert_eq!(event["correct"], true);
    assert_eq!(event["playerName"], "Ann");
    assert_eq!(event["gameState"]["currentTurn"], 1);
    assert_eq!(host.next_event(), event);

    harness.send(&guest, json!({"action": "guess", "letter": "a"})).await;
    harness.send(&host, json!({"action": "guess", "letter": "t"})).await;

    let last = guest.drain().pop().unwrap();
    assert_eq!(last["gameState"]["status"], "won");
    assert_eq!(last["gameState"]["maskedWord"], "cat");
    assert_eq!(last["gameState"]["word"], "cat");
    assert_eq!(last["gameState"]["guessedLetters"], json!(["a", "c", "t"]));
}

#[tokio::test]
async fn test_guess_out_of_turn_goes_to_sender_only() {
    let harness = Harness::new();
    let (mut host, mut guest, room) = harness.two_player_room().await;

    harness.send(&guest, json!({"action": "guess", "letter": "c"})).await;

    assert_eq!(
        guest.next_event(),
        json!({"action": "error", "message": "Not your turn"})
    );
    host.assert_quiet();
    assert_eq!(harness.session(&room).await.guessed_letters().count(), 0);
}

#[tokio::test]
async fn test_guess_rejections_report_exact_messages() {
    let harness = Harness::new();
    let (mut host, mut guest, _room) = harness.two_player_room().await;

    harness.send(&host, json!({"action": "guess", "letter": "ab"})).await;
    assert_eq!(host.next_event()["message"], "Invalid guess");

    harness.send(&host, json!({"action": "guess", "letter": "x"})).await;
    host.drain();
    guest.drain();
    harness.send(&guest, json!({"action": "guess", "letter": "X"})).await;
    assert_eq!(guest.next_event()["message"], "Letter already guessed");
    host.assert_quiet();
}

#[tokio::test]
async fn test_guess_from_lobby_is_not_in_game() {
    let harness = Harness::new();
    let mut loner = harness.connect(1).await;

    harness.send(&loner, json!({"action": "guess", "letter": "a"})).await;

    assert_eq!(loner.next_event()["message"], "Not in a game");
}

#[tokio::test]
async fn test_guess_malformed_letter_is_invalid_before_room_lookup() {
    let harness = Harness::new();
    let mut loner = harness.connect(9).await;

    harness.send(&loner, json!({"action": "guess", "letter": "12"})).await;
    assert_eq!(loner.next_event()["message"], "Invalid guess");

    // Seated in a room that no longer exists: still the letter comes first.
    let (mut host, _guest, room) = harness.two_player_room().await;
    host.drain();
    harness
        .store
        .delete(&RoomCode::parse(&room).unwrap())
        .await
        .unwrap();
    harness.send(&host, json!({"action": "guess", "letter": ""})).await;
    assert_eq!(host.next_event()["message"], "Invalid guess");
    harness.send(&host, json!({"action": "guess", "letter": "a"})).await;
    assert_eq!(host.next_event()["message"], "Game not active");
}

#[tokio::test]
async fn test_guess_while_waiting_is_not_active() {
    let harness = Harness::new();
    let mut host = harness.connect(1).await;
    harness.send(&host, json!({"action": "createRoom"})).await;
    host.drain();

    harness.send(&host, json!({"action": "guess", "letter": "a"})).await;

    assert_eq!(host.next_event()["message"], "Game not active");
}

#[tokio::test]
async fn test_new_game_by_guest_is_rejected_without_broadcast() {
    let harness = Harness::new();
    let (mut host, mut guest, room) = harness.two_player_room().await;
    harness.send(&host, json!({"action": "guess", "letter": "z"})).await;
    host.drain();
    guest.drain();
    let before = harness.session(&room).await;

    harness.send(&guest, json!({"action": "newGame"})).await;

    assert_eq!(
        guest.next_event(),
        json!({"action": "error", "message": "Only host can start new game"})
    );
    host.assert_quiet();
    assert_eq!(harness.session(&room).await, before);
}

#[tokio::test]
async fn test_new_game_outside_a_room_is_ignored() {
    let harness = Harness::new();
    let mut loner = harness.connect(5).await;

    harness.send(&loner, json!({"action": "newGame"})).await;
    loner.assert_quiet();

    let (mut host, mut guest, room) = harness.two_player_room().await;
    harness
        .store
        .delete(&RoomCode::parse(&room).unwrap())
        .await
        .unwrap();
    harness.send(&host, json!({"action": "newGame"})).await;

    host.assert_quiet();
    guest.assert_quiet();
    assert!(harness.store.is_empty().await);
}

#[tokio::test]
async fn test_new_game_by_host_resets_and_broadcasts() {
    let harness = Harness::new();
    let (mut host, mut guest, _room) = harness.two_player_room().await;
    harness.send(&host, json!({"action": "guess", "letter": "z"})).await;
    host.drain();
    guest.drain();

    harness.send(&host, json!({"action": "newGame"})).await;

    let event = guest.next_event();
    assert_eq!(event["action"], "newGame");
    assert_eq!(event["gameState"]["wrongGuesses"], 0);
    assert_eq!(event["gameState"]["currentTurn"], 0);
    assert_eq!(event["gameState"]["status"], "playing");
    assert_eq!(host.next_event(), event);
}

// =========================================================================
// Protocol boundary
// =========================================================================

#[tokio::test]
async fn test_malformed_and_unknown_requests_answered_to_sender() {
    let harness = Harness::new();
    let mut client = harness.connect(1).await;

    harness
        .coordinator
        .handle_bytes(client.id, b"not json")
        .await
        .unwrap();
    assert_eq!(client.next_event()["message"], "Invalid message");

    harness.send(&client, json!({"action": "dance"})).await;
    assert_eq!(client.next_event()["message"], "Unknown action: dance");

    harness.send(&client, json!({"letter": "a"})).await;
    assert_eq!(client.next_event()["message"], "Invalid message");
    assert!(harness.store.is_empty().await);
}

// =========================================================================
// Disconnect
// =========================================================================

#[tokio::test]
async fn test_disconnect_notifies_remaining_player() {
    let harness = Harness::new();
    let (mut host, guest, room) = harness.two_player_room().await;

    harness.coordinator.disconnect(guest.id).await.unwrap();

    assert_eq!(
        host.next_event(),
        json!({"action": "playerLeft", "playerName": "Bob", "players": ["Ann"]})
    );
    assert_eq!(harness.session(&room).await.player_names(), vec!["Ann"]);
    assert!(harness.registry.lookup(guest.id).await.is_err());
}

#[tokio::test]
async fn test_disconnect_last_player_deletes_room() {
    let harness = Harness::new();
    let (host, guest, _room) = harness.two_player_room().await;

    harness.coordinator.disconnect(guest.id).await.unwrap();
    harness.coordinator.disconnect(host.id).await.unwrap();

    assert!(harness.store.is_empty().await);
    assert!(harness.registry.is_empty().await);
}

#[tokio::test]
async fn test_disconnect_repeated_is_harmless() {
    let harness = Harness::new();
    let (mut host, guest, room) = harness.two_player_room().await;

    harness.coordinator.disconnect(guest.id).await.unwrap();
    host.drain();
    harness.coordinator.disconnect(guest.id).await.unwrap();

    host.assert_quiet();
    assert_eq!(harness.session(&room).await.players().len(), 1);
}

#[tokio::test]
async fn test_disconnect_stale_connection_keeps_replacement_seated() {
    let harness = Harness::new();
    let (mut host, guest, room) = harness.two_player_room().await;
    harness.coordinator.disconnect(guest.id).await.unwrap();
    host.drain();

    // Bob comes back on a new connection and takes the free seat.
    let mut bob = harness.connect(3).await;
    harness
        .send(&bob, json!({"action": "joinRoom", "roomId": room, "playerName": "Bob"}))
        .await;
    bob.drain();
    host.drain();

    // A late disconnect for a connection bound to the room but holding no seat.
    let ghost = ConnectionId::new(9);
    harness.registry.register(ghost).await;
    harness
        .registry
        .bind(ghost, RoomCode::parse(&room).unwrap(), "Bob".into())
        .await
        .unwrap();
    harness.coordinator.disconnect(ghost).await.unwrap();

    let session = harness.session(&room).await;
    assert_eq!(session.player_names(), vec!["Ann", "Bob"]);
    assert!(session.player(bob.id).is_some());
    host.assert_quiet();
}

#[tokio::test]
async fn test_rejoin_after_finished_game_resets_counters() {
    let harness = Harness::new();
    let (mut host, mut guest, room) = harness.two_player_room().await;
    for (i, letter) in ["x", "y", "z", "q", "w", "v"].into_iter().enumerate() {
        let player = if i % 2 == 0 { &host } else { &guest };
        harness
            .send(player, json!({"action": "guess", "letter": letter}))
            .await;
    }
    let last = host.drain().pop().unwrap();
    assert_eq!(last["gameState"]["status"], "lost");
    assert_eq!(last["gameState"]["word"], "cat");

    harness.coordinator.disconnect(guest.id).await.unwrap();
    guest.drain();
    host.drain();
    let mut newcomer = harness.connect(3).await;
    harness
        .send(&newcomer, json!({"action": "joinRoom", "roomId": room}))
        .await;

    let event = newcomer.next_event();
    assert_eq!(event["action"], "gameStarted");
    assert_eq!(event["gameState"]["wrongGuesses"], 0);
    assert_eq!(event["gameState"]["guessedLetters"], json!([]));
    assert_eq!(event["gameState"]["status"], "playing");
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_guesses_on_one_turn_accept_exactly_one() {
    for _ in 0..20 {
        let harness = Harness::new();
        let (mut host, mut guest, room) = harness.two_player_room().await;

        // Host holds the turn and fires two guesses at once.
        let tasks: Vec<_> = [r#"{"action":"guess","letter":"c"}"#, r#"{"action":"guess","letter":"x"}"#]
            .into_iter()
            .map(|request| {
                let coordinator = Arc::clone(&harness.coordinator);
                let id = host.id;
                tokio::spawn(async move { coordinator.handle_bytes(id, request.as_bytes()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let session = harness.session(&room).await;
        assert_eq!(session.guessed_letters().count(), 1);
        assert_eq!(session.current_turn(), 1);

        let guest_events = guest.drain();
        assert_eq!(guest_events.len(), 1);
        assert_eq!(guest_events[0]["action"], "guessResult");

        let host_events = host.drain();
        assert_eq!(host_events.len(), 2);
        assert!(host_events.contains(&guest_events[0]));
        assert!(host_events.contains(&json!({"action": "error", "message": "Not your turn"})));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_distinct_rooms() {
    let harness = Harness::new();
    let mut clients = Vec::new();
    for id in 1..=30 {
        clients.push(harness.connect(id).await);
    }

    let tasks: Vec<_> = clients
        .iter()
        .map(|client| {
            let coordinator = Arc::clone(&harness.coordinator);
            let id = client.id;
            tokio::spawn(async move {
                coordinator
                    .handle_bytes(id, br#"{"action":"createRoom"}"#)
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut rooms: Vec<String> = clients
        .iter_mut()
        .map(|c| c.next_event()["roomId"].as_str().unwrap().to_string())
        .collect();
    rooms.sort();
    rooms.dedup();
    assert_eq!(rooms.len(), 30);
    assert_eq!(harness.store.len().await, 30);
}

/// Checks that `departed` holds no seat in `room` and the turn is in range.
async fn assert_departed(harness: &Harness, room: &str, departed: ConnectionId) {
    let session = harness.session(room).await;
    assert!(
        session.players().iter().all(|p| p.connection_id != departed),
        "departed player is seated again: {:?}",
        session.players()
    );
    assert!(!session.players().is_empty());
    assert!(session.players().len() <= 2);
    assert!(session.current_turn() < session.players().len());
    assert!(harness.registry.lookup(departed).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disconnect_racing_guesses_never_reseats_player() {
    for _ in 0..30 {
        let harness = Harness::new();
        let (mut host, mut guest, room) = harness.two_player_room().await;

        // Pass the turn to the guest so their guess is valid when it lands.
        harness.send(&host, json!({"action": "guess", "letter": "c"})).await;
        host.drain();
        guest.drain();

        let guest_guess = {
            let coordinator = Arc::clone(&harness.coordinator);
            let id = guest.id;
            tokio::spawn(async move {
                coordinator
                    .handle_bytes(id, br#"{"action":"guess","letter":"a"}"#)
                    .await
            })
        };
        let host_guess = {
            let coordinator = Arc::clone(&harness.coordinator);
            let id = host.id;
            tokio::spawn(async move {
                coordinator
                    .handle_bytes(id, br#"{"action":"guess","letter":"t"}"#)
                    .await
            })
        };
        let leave = {
            let coordinator = Arc::clone(&harness.coordinator);
            let id = guest.id;
            tokio::spawn(async move { coordinator.disconnect(id).await })
        };
        guest_guess.await.unwrap().unwrap();
        host_guess.await.unwrap().unwrap();
        leave.await.unwrap().unwrap();

        assert_departed(&harness, &room, guest.id).await;
        let session = harness.session(&room).await;
        assert_eq!(session.player_names(), vec!["Ann"]);
        assert_eq!(session.current_turn(), 0);
        assert!(
            host.drain()
                .iter()
                .any(|e| e["action"] == "playerLeft" && e["playerName"] == "Bob")
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disconnect_racing_join_keeps_roster_consistent() {
    for _ in 0..30 {
        let harness = Harness::new();
        let (host, guest, room) = harness.two_player_room().await;
        let mut newcomer = harness.connect(3).await;

        let join = {
            let coordinator = Arc::clone(&harness.coordinator);
            let id = newcomer.id;
            let request = json!({"action": "joinRoom", "roomId": room, "playerName": "Cy"});
            tokio::spawn(async move {
                let bytes = serde_json::to_vec(&request).unwrap();
                coordinator.handle_bytes(id, &bytes).await
            })
        };
        let host_guess = {
            let coordinator = Arc::clone(&harness.coordinator);
            let id = host.id;
            tokio::spawn(async move {
                coordinator
                    .handle_bytes(id, br#"{"action":"guess","letter":"x"}"#)
                    .await
            })
        };
        let leave = {
            let coordinator = Arc::clone(&harness.coordinator);
            let id = guest.id;
            tokio::spawn(async move { coordinator.disconnect(id).await })
        };
        join.await.unwrap().unwrap();
        host_guess.await.unwrap().unwrap();
        leave.await.unwrap().unwrap();

        assert_departed(&harness, &room, guest.id).await;
        let session = harness.session(&room).await;
        let seated = session.player(newcomer.id).is_some();
        let bound = harness.registry.lookup(newcomer.id).await.unwrap().room.is_some();
        assert_eq!(seated, bound);
        if !seated {
            assert_eq!(newcomer.drain()[0]["message"], "Room is full");
        }
    }
}

/// A store whose conditional writes always lose the race.
#[derive(Default)]
struct AlwaysConflicting {
    inner: InMemorySessionStore,
    writes: AtomicU32,
}

impl SessionStore for AlwaysConflicting {
    async fn create(&self, session: GameSession) -> Result<Version, StoreError> {
        self.inner.create(session).await
    }

    async fn get(&self, room: &RoomCode) -> Result<StoredSession, StoreError> {
        self.inner.get(room).await
    }

    async fn contains(&self, room: &RoomCode) -> Result<bool, StoreError> {
        self.inner.contains(room).await
    }

    async fn compare_and_swap(
        &self,
        room: &RoomCode,
        expected: Version,
        _session: GameSession,
    ) -> Result<Version, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::VersionConflict {
            room: room.clone(),
            expected,
        })
    }

    async fn delete_if_version(&self, room: &RoomCode, expected: Version) -> Result<(), StoreError> {
        self.inner.delete_if_version(room, expected).await
    }

    async fn delete(&self, room: &RoomCode) -> Result<bool, StoreError> {
        self.inner.delete(room).await
    }
}

#[tokio::test]
async fn test_guess_under_endless_contention_gives_up() {
    let store = Arc::new(AlwaysConflicting::default());
    let harness = Harness::with(Arc::clone(&store), Arc::new(InMemoryConnectionRegistry::new()));
    let mut host = harness.connect(1).await;
    let mut guest = harness.connect(2).await;
    harness.send(&host, json!({"action": "createRoom"})).await;
    let room = host.next_event()["roomId"].as_str().unwrap().to_string();

    harness
        .send(&guest, json!({"action": "joinRoom", "roomId": room}))
        .await;

    assert_eq!(
        guest.next_event()["message"],
        "Room is busy, please try again"
    );
    assert_eq!(
        store.writes.load(Ordering::SeqCst),
        CoordinatorConfig::default().max_update_attempts
    );
    host.assert_quiet();
}

// =========================================================================
// Join rollback
// =========================================================================

/// A registry that loses one connection right before it is bound.
struct VanishingRegistry {
    inner: InMemoryConnectionRegistry,
    vanishing: ConnectionId,
}

impl ConnectionRegistry for VanishingRegistry {
    async fn register(&self, id: ConnectionId) {
        self.inner.register(id).await;
    }

    async fn bind(
        &self,
        id: ConnectionId,
        room: RoomCode,
        player_name: String,
    ) -> Result<(), RegistryError> {
        if id == self.vanishing {
            self.inner.unregister(id).await;
        }
        self.inner.bind(id, room, player_name).await
    }

    async fn lookup(&self, id: ConnectionId) -> Result<ConnectionRecord, RegistryError> {
        self.inner.lookup(id).await
    }

    async fn members_of(&self, room: &RoomCode) -> Vec<ConnectionId> {
        self.inner.members_of(room).await
    }

    async fn unregister(&self, id: ConnectionId) -> Option<ConnectionRecord> {
        self.inner.unregister(id).await
    }
}

#[tokio::test]
async fn test_join_by_vanished_connection_is_rolled_back() {
    let registry = Arc::new(VanishingRegistry {
        inner: InMemoryConnectionRegistry::new(),
        vanishing: ConnectionId::new(2),
    });
    let harness = Harness::with(Arc::new(InMemorySessionStore::new()), registry);
    let mut host = harness.connect(1).await;
    let guest = harness.connect(2).await;
    harness.send(&host, json!({"action": "createRoom"})).await;
    let room = host.next_event()["roomId"].as_str().unwrap().to_string();

    let result = harness
        .coordinator
        .handle_bytes(
            guest.id,
            json!({"action": "joinRoom", "roomId": room})
                .to_string()
                .as_bytes(),
        )
        .await;

    assert!(matches!(result, Err(HangroomError::Registry(_))));
    assert_eq!(harness.session(&room).await.players().len(), 1);
    host.assert_quiet();
}

#[tokio::test]
async fn test_create_by_vanished_connection_leaves_no_room() {
    let registry = Arc::new(VanishingRegistry {
        inner: InMemoryConnectionRegistry::new(),
        vanishing: ConnectionId::new(1),
    });
    let harness = Harness::with(Arc::new(InMemorySessionStore::new()), registry);
    let host = harness.connect(1).await;

    let result = harness
        .coordinator
        .handle_bytes(host.id, br#"{"action":"createRoom"}"#)
        .await;

    assert!(matches!(result, Err(HangroomError::Registry(_))));
    assert!(harness.store.is_empty().await);
}
