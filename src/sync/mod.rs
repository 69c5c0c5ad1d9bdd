//! Peer-to-peer match synchronisation.
//!
//! Two clients share one match document in a remote tree store. The
//! player holding write authority logs each action and publishes the full
//! state; the other client replays the log and mirrors the snapshot.
//!
//! ## Key Types
//!
//! - `RemoteStore`: the store contract, `InMemoryStore` a local implementation
//! - `MatchRecord` / `PlayerSlot`: the shared match document
//! - `SyncCoordinator`: binds one `GameEngine` to the document
//! - `PresenceMachine` / `TurnTimer`: opponent liveness and the turn clock
//! - `Spectator`: read-only mirror
//! - `ResultRecorder`: where finished matches are reported

pub mod coordinator;
pub mod memory;
pub mod presence;
pub mod record;
pub mod recorder;
pub mod spectator;
pub mod store;

pub use coordinator::{SyncConfig, SyncCoordinator, SyncError, SyncNotification};
pub use memory::{InMemoryStore, StoreHandle};
pub use presence::{PresenceMachine, PresenceState, Transition, TurnTimer};
pub use record::{MatchMode, MatchRecord, MatchStatus, Namespace, PlayerSlot, WinReason};
pub use recorder::{GameResult, PlayerProfile, RecordedResults, ResultRecorder};
pub use spectator::Spectator;
pub use store::{join_path, RemoteStore, StoreError, StoreEvent, Subscription, SubscriptionId};
