//! In-Process Session Store
//!
//! Reference implementation of [`SessionStore`]: BTreeMaps behind one
//! `RwLock`, per-key version stamps from a global counter, and lazily
//! created broadcast channels for change subscription. Commits hold the
//! write lock for their full check-then-apply span, so transactions
//! serialize exactly as the contract requires.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::trace;

use crate::game::session::{GameId, GameSession, PlayerId};
use crate::matchmaking::{MatchAssignment, PlayerProfile, WaitingEntry};
use crate::store::{SessionStore, StoreError, Transaction, Version, ABSENT};

/// Capacity of each per-key subscription channel.
const WATCH_CAPACITY: usize = 32;

#[derive(Default)]
struct Inner {
    sessions: BTreeMap<GameId, (Version, GameSession)>,
    waiting: BTreeMap<PlayerId, WaitingEntry>,
    waiting_version: Version,
    assignments: BTreeMap<PlayerId, MatchAssignment>,
    profiles: BTreeMap<PlayerId, (Version, PlayerProfile)>,
    /// Global stamp source; every written key gets a fresh value.
    version_counter: Version,
    session_watch: BTreeMap<GameId, broadcast::Sender<(Version, GameSession)>>,
    assignment_watch: BTreeMap<PlayerId, broadcast::Sender<MatchAssignment>>,
}

impl Inner {
    fn next_version(&mut self) -> Version {
        self.version_counter += 1;
        self.version_counter
    }

    fn preconditions_hold(&self, txn: &Transaction) -> bool {
        if let Some(expected) = txn.expect_waiting_set {
            if self.waiting_version != expected {
                return false;
            }
        }
        for (id, expected) in &txn.expect_sessions {
            let current = self.sessions.get(id).map(|(v, _)| *v).unwrap_or(ABSENT);
            if current != *expected {
                return false;
            }
        }
        for (player, expected) in &txn.expect_profiles {
            let current = self.profiles.get(player).map(|(v, _)| *v).unwrap_or(ABSENT);
            if current != *expected {
                return false;
            }
        }
        true
    }
}

/// In-memory [`SessionStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile outside any transaction (registration-time setup).
    pub async fn register_profile(&self, profile: PlayerProfile) {
        let mut inner = self.inner.write().await;
        let version = inner.next_version();
        inner.profiles.insert(profile.player, (version, profile));
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn session(&self, id: GameId) -> (Option<GameSession>, Version) {
        let inner = self.inner.read().await;
        match inner.sessions.get(&id) {
            Some((version, session)) => (Some(session.clone()), *version),
            None => (None, ABSENT),
        }
    }

    async fn waiting_set(&self) -> (Vec<WaitingEntry>, Version) {
        let inner = self.inner.read().await;
        (inner.waiting.values().cloned().collect(), inner.waiting_version)
    }

    async fn assignment(&self, player: PlayerId) -> Option<MatchAssignment> {
        let inner = self.inner.read().await;
        inner.assignments.get(&player).copied()
    }

    async fn profile(&self, player: PlayerId) -> (Option<PlayerProfile>, Version) {
        let inner = self.inner.read().await;
        match inner.profiles.get(&player) {
            Some((version, profile)) => (Some(profile.clone()), *version),
            None => (None, ABSENT),
        }
    }

    async fn commit(&self, txn: Transaction) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if !inner.preconditions_hold(&txn) {
            trace!("commit rejected on stale precondition");
            return Err(StoreError::Conflict);
        }

        // Preconditions verified under the write lock; apply everything.
        for session in txn.put_sessions {
            let version = inner.next_version();
            let id = session.id;
            inner.sessions.insert(id, (version, session.clone()));
            if let Some(tx) = inner.session_watch.get(&id) {
                let _ = tx.send((version, session));
            }
        }

        let mut waiting_touched = false;
        for entry in txn.put_waiting {
            inner.waiting.insert(entry.player, entry);
            waiting_touched = true;
        }
        for player in txn.delete_waiting {
            waiting_touched |= inner.waiting.remove(&player).is_some();
        }
        if waiting_touched {
            inner.waiting_version = inner.next_version();
        }

        for (player, assignment) in txn.put_assignments {
            inner.assignments.insert(player, assignment);
            if let Some(tx) = inner.assignment_watch.get(&player) {
                let _ = tx.send(assignment);
            }
        }
        for player in txn.delete_assignments {
            inner.assignments.remove(&player);
        }

        for profile in txn.put_profiles {
            let version = inner.next_version();
            inner.profiles.insert(profile.player, (version, profile));
        }

        Ok(())
    }

    async fn watch_session(&self, id: GameId) -> broadcast::Receiver<(Version, GameSession)> {
        let mut inner = self.inner.write().await;
        inner
            .session_watch
            .entry(id)
            .or_insert_with(|| broadcast::channel(WATCH_CAPACITY).0)
            .subscribe()
    }

    async fn watch_assignment(&self, player: PlayerId) -> broadcast::Receiver<MatchAssignment> {
        let mut inner = self.inner.write().await;
        inner
            .assignment_watch
            .entry(player)
            .or_insert_with(|| broadcast::channel(WATCH_CAPACITY).0)
            .subscribe()
    }
}

// =============================================================================
// TESTS
// =============================================================================
