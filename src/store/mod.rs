//! Session Store Contract
//!
//! The shared, concurrently-mutated store the whole system coordinates
//! through: sessions, waiting entries, match assignments, and profiles.
//!
//! The store offers no locking to callers. Instead every read carries a
//! version stamp and [`SessionStore::commit`] applies a multi-key write
//! atomically iff all stated preconditions still hold. Concurrent
//! read-modify-write operations therefore serialize: the loser observes
//! [`StoreError::Conflict`], re-reads, and retries. The production
//! backend is a hosted realtime database wrapped to honor the same
//! contract; [`memory::MemoryStore`] is the in-process implementation.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::game::session::{GameId, GameSession, PlayerId};
use crate::matchmaking::{MatchAssignment, PlayerProfile, WaitingEntry};

pub mod memory;

/// Version stamp for a key or collection. `ABSENT` means no record exists;
/// a commit preconditioned on `ABSENT` asserts the key is still unwritten.
pub type Version = u64;

/// Version of a key that has never been written.
pub const ABSENT: Version = 0;

/// Store-level errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A precondition version no longer matched; nothing was applied.
    #[error("transaction conflicted with a concurrent commit")]
    Conflict,
}

/// An atomic multi-key write with optimistic preconditions.
///
/// All writes and deletes apply together or not at all. Preconditions
/// pin the versions observed during the read phase; any mismatch at
/// commit time fails the whole transaction.
#[derive(Debug, Default)]
pub struct Transaction {
    pub(crate) expect_sessions: Vec<(GameId, Version)>,
    pub(crate) expect_profiles: Vec<(PlayerId, Version)>,
    pub(crate) expect_waiting_set: Option<Version>,
    pub(crate) put_sessions: Vec<GameSession>,
    pub(crate) put_waiting: Vec<WaitingEntry>,
    pub(crate) delete_waiting: Vec<PlayerId>,
    pub(crate) put_assignments: Vec<(PlayerId, MatchAssignment)>,
    pub(crate) delete_assignments: Vec<PlayerId>,
    pub(crate) put_profiles: Vec<PlayerProfile>,
}

impl Transaction {
    /// Start an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a session key to still be at `version`.
    pub fn expect_session(mut self, id: GameId, version: Version) -> Self {
        self.expect_sessions.push((id, version));
        self
    }

    /// Require a profile key to still be at `version`.
    pub fn expect_profile(mut self, player: PlayerId, version: Version) -> Self {
        self.expect_profiles.push((player, version));
        self
    }

    /// Require the waiting collection as a whole to still be at `version`.
    ///
    /// Guards matchmaking's read-select-commit against concurrent joiners
    /// racing for the same waiting entry.
    pub fn expect_waiting_set(mut self, version: Version) -> Self {
        self.expect_waiting_set = Some(version);
        self
    }

    /// Write a session.
    pub fn put_session(mut self, session: GameSession) -> Self {
        self.put_sessions.push(session);
        self
    }

    /// Write (or refresh) a waiting entry.
    pub fn put_waiting(mut self, entry: WaitingEntry) -> Self {
        self.put_waiting.push(entry);
        self
    }

    /// Delete a waiting entry. Deleting an absent key is a no-op.
    pub fn delete_waiting(mut self, player: PlayerId) -> Self {
        self.delete_waiting.push(player);
        self
    }

    /// Write a match assignment for a player.
    pub fn put_assignment(mut self, player: PlayerId, assignment: MatchAssignment) -> Self {
        self.put_assignments.push((player, assignment));
        self
    }

    /// Delete a match assignment. Deleting an absent key is a no-op.
    pub fn delete_assignment(mut self, player: PlayerId) -> Self {
        self.delete_assignments.push(player);
        self
    }

    /// Write a profile.
    pub fn put_profile(mut self, profile: PlayerProfile) -> Self {
        self.put_profiles.push(profile);
        self
    }
}

/// The transactional collaborator interface.
///
/// Reads are point-in-time snapshots; subscriptions deliver every
/// subsequent committed value of the watched key.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Read one session with its version stamp.
    async fn session(&self, id: GameId) -> (Option<GameSession>, Version);

    /// Snapshot all waiting entries plus the collection version.
    async fn waiting_set(&self) -> (Vec<WaitingEntry>, Version);

    /// Read a player's pending match assignment, if any.
    async fn assignment(&self, player: PlayerId) -> Option<MatchAssignment>;

    /// Read one profile with its version stamp.
    async fn profile(&self, player: PlayerId) -> (Option<PlayerProfile>, Version);

    /// Atomically apply `txn` iff all its preconditions hold.
    async fn commit(&self, txn: Transaction) -> Result<(), StoreError>;

    /// Subscribe to committed writes of one session.
    ///
    /// Each delivered value carries the version stamp of the commit that
    /// produced it, so a subscriber holding a snapshot can discard
    /// buffered writes the snapshot already reflects.
    async fn watch_session(&self, id: GameId) -> broadcast::Receiver<(Version, GameSession)>;

    /// Subscribe to match assignments appearing for one player.
    async fn watch_assignment(&self, player: PlayerId) -> broadcast::Receiver<MatchAssignment>;
}
