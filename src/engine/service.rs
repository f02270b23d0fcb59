//! Game Engine Service
//!
//! The orchestration layer clients talk to. Every operation is a
//! read-validate-commit loop against the store; conflicting commits are
//! retried with fresh reads up to the configured bound and then surfaced
//! as `MatchConflict`. The deferred round reset runs as a spawned task
//! that re-reads state at fire time and only applies a guarded update.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::engine::{EngineConfig, GameError};
use crate::game::session::{GameId, GameSession, PlayerId, RoundProgress};
use crate::game::moves::Move;
use crate::identity::IdentityProvider;
use crate::matchmaking::{select_opponent, MatchAssignment, PlayerProfile, WaitingEntry};
use crate::store::{SessionStore, StoreError, Transaction, Version};

/// The authoritative session engine.
pub struct GameEngine {
    store: Arc<dyn SessionStore>,
    identity: Arc<dyn IdentityProvider>,
    config: EngineConfig,
}

impl GameEngine {
    /// Create an engine over a store and identity collaborator.
    pub fn new(
        store: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            identity,
            config,
        }
    }

    /// Join the matchmaking queue.
    ///
    /// Pairs with the longest-waiting other player when one exists:
    /// creates the session, writes a match assignment for both
    /// participants, and clears both waiting entries, all in one atomic
    /// commit. Otherwise parks the caller with a fresh waiting entry and
    /// returns `None`; the match arrives later via [`Self::watch_match`].
    pub async fn join_queue(&self, player: PlayerId) -> Result<Option<GameId>, GameError> {
        for _ in 0..=self.config.max_commit_retries {
            let (waiting, waiting_version) = self.store.waiting_set().await;

            let Some(entry) = select_opponent(&waiting, player) else {
                // Nobody else waiting: park (or refresh) this player.
                let txn = Transaction::new()
                    .expect_waiting_set(waiting_version)
                    .put_waiting(WaitingEntry {
                        player,
                        joined_at: Utc::now(),
                    });
                match self.store.commit(txn).await {
                    Ok(()) => {
                        debug!(player = %player.short(), "parked in matchmaking queue");
                        return Ok(None);
                    }
                    Err(StoreError::Conflict) => continue,
                }
            };

            let opponent = entry.player;
            let game = GameId::generate();
            let session = GameSession::new(
                game,
                (opponent, self.display_name(opponent).await),
                (player, self.display_name(player).await),
            );

            // The five pairing effects commit together or not at all.
            let txn = Transaction::new()
                .expect_waiting_set(waiting_version)
                .put_session(session)
                .put_assignment(opponent, MatchAssignment { game })
                .put_assignment(player, MatchAssignment { game })
                .delete_waiting(opponent)
                .delete_waiting(player);
            match self.store.commit(txn).await {
                Ok(()) => {
                    info!(
                        game = %game.short(),
                        a = %opponent.short(),
                        b = %player.short(),
                        "paired players into new session"
                    );
                    // The joiner observed the match synchronously; its
                    // assignment is consumed right here.
                    self.consume_assignment(player).await;
                    return Ok(Some(game));
                }
                Err(StoreError::Conflict) => continue,
            }
        }
        Err(GameError::MatchConflict)
    }

    /// Submit a move for the current round.
    pub async fn submit_move(
        &self,
        game: GameId,
        player: PlayerId,
        mv: Move,
    ) -> Result<(), GameError> {
        if let Some(current) = self.identity.current_user() {
            if current != player {
                return Err(GameError::Unauthorized);
            }
        }

        for _ in 0..=self.config.max_commit_retries {
            let (session, version) = self.store.session(game).await;
            let Some(mut session) = session else {
                return Err(GameError::InvalidSession);
            };
            let Some(slot) = session.slot_of(player) else {
                return Err(GameError::InvalidSession);
            };
            if !session.is_active() {
                return Err(GameError::GameNotActive);
            }
            if session.round_complete {
                return Err(GameError::RoundLocked);
            }
            if session.slot(slot).submitted.is_some() {
                return Err(GameError::DuplicateMove);
            }

            let progress = session.record_move(slot, mv, &self.config.rules);

            let mut txn = Transaction::new().expect_session(game, version);
            if session.is_complete() {
                txn = self.bump_games_played(txn, &session).await;
            }
            txn = txn.put_session(session.clone());

            match self.store.commit(txn).await {
                Ok(()) => {
                    match progress {
                        RoundProgress::AwaitingOpponent => {
                            debug!(
                                game = %game.short(),
                                player = %player.short(),
                                "move stored, awaiting opponent"
                            );
                        }
                        RoundProgress::RoundResolved { outcome, game_over: false } => {
                            debug!(
                                game = %game.short(),
                                ?outcome,
                                round = session.current_round - 1,
                                "round resolved"
                            );
                            self.schedule_round_reset(game, session.current_round);
                        }
                        RoundProgress::RoundResolved { outcome, game_over: true } => {
                            info!(
                                game = %game.short(),
                                ?outcome,
                                winner = ?session.winner.map(|w| w.short()),
                                "game complete"
                            );
                        }
                    }
                    return Ok(());
                }
                Err(StoreError::Conflict) => continue,
            }
        }
        Err(GameError::MatchConflict)
    }

    /// Subscribe to a session's full state.
    ///
    /// The watcher yields the current state immediately, then every
    /// subsequent committed mutation.
    pub async fn watch_game(&self, game: GameId) -> Result<GameWatcher, GameError> {
        // Subscribe before the snapshot so no commit lands unseen between
        // the two; writes buffered in that window are deduplicated against
        // the snapshot version.
        let rx = self.store.watch_session(game).await;
        let (current, version) = self.store.session(game).await;
        let current = current.ok_or(GameError::InvalidSession)?;
        Ok(GameWatcher {
            pending: Some(current),
            seen: version,
            rx,
        })
    }

    /// Await the match assignment for a parked player.
    pub async fn watch_match(&self, player: PlayerId) -> MatchWatcher {
        let rx = self.store.watch_assignment(player).await;
        MatchWatcher {
            store: self.store.clone(),
            player,
            rx,
        }
    }

    async fn display_name(&self, player: PlayerId) -> String {
        let (profile, _) = self.store.profile(player).await;
        match profile {
            Some(profile) => profile.display_name,
            None => player.short(),
        }
    }

    /// Add guarded games_played increments for both participants to the
    /// completing transaction.
    async fn bump_games_played(&self, mut txn: Transaction, session: &GameSession) -> Transaction {
        for slot in [&session.slot_a, &session.slot_b] {
            let (profile, version) = self.store.profile(slot.player).await;
            let mut profile = profile
                .unwrap_or_else(|| PlayerProfile::new(slot.player, slot.display_name.clone()));
            profile.games_played += 1;
            txn = txn.expect_profile(slot.player, version).put_profile(profile);
        }
        txn
    }

    async fn consume_assignment(&self, player: PlayerId) {
        let txn = Transaction::new().delete_assignment(player);
        if self.store.commit(txn).await.is_err() {
            warn!(player = %player.short(), "failed to consume match assignment");
        }
    }

    /// Schedule the deferred reset that opens round `round`.
    ///
    /// Fires after the configured drain delay, re-reads the session, and
    /// applies the reset only if the game is still running and the round
    /// has not moved on — a stale timer is a silent no-op.
    fn schedule_round_reset(&self, game: GameId, round: u32) {
        let store = self.store.clone();
        let delay = self.config.round_reset_delay;
        let retries = self.config.max_commit_retries;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            for _ in 0..=retries {
                let (session, version) = store.session(game).await;
                let Some(mut session) = session else {
                    return;
                };
                if session.is_complete()
                    || session.current_round != round
                    || !session.round_complete
                {
                    debug!(game = %game.short(), round, "stale reset timer, leaving state alone");
                    return;
                }

                session.reset_round();
                let txn = Transaction::new()
                    .expect_session(game, version)
                    .put_session(session);
                match store.commit(txn).await {
                    Ok(()) => {
                        debug!(game = %game.short(), round, "round reset, accepting moves");
                        return;
                    }
                    Err(StoreError::Conflict) => continue,
                }
            }
            warn!(game = %game.short(), round, "round reset abandoned after repeated conflicts");
        });
    }
}

/// Live view of one session: current state first, then every mutation,
/// delivered in version order.
pub struct GameWatcher {
    pending: Option<GameSession>,
    seen: Version,
    rx: broadcast::Receiver<(Version, GameSession)>,
}

impl GameWatcher {
    /// Next state, or `None` once the store side closes.
    pub async fn next(&mut self) -> Option<GameSession> {
        if let Some(state) = self.pending.take() {
            return Some(state);
        }
        loop {
            match self.rx.recv().await {
                // Writes committed between subscribing and the snapshot
                // replay here but are already reflected in it; drop them
                // so observed state never regresses.
                Ok((version, _)) if version <= self.seen => continue,
                Ok((version, state)) => {
                    self.seen = version;
                    return Some(state);
                }
                // Skipped intermediate states; the next commit carries the
                // full session anyway.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// One-shot wait for a parked player's match assignment.
pub struct MatchWatcher {
    store: Arc<dyn SessionStore>,
    player: PlayerId,
    rx: broadcast::Receiver<MatchAssignment>,
}

impl MatchWatcher {
    /// Resolve once an assignment exists, deleting it on consumption.
    pub async fn assigned(mut self) -> Option<GameId> {
        if let Some(assignment) = self.store.assignment(self.player).await {
            self.consume().await;
            return Some(assignment.game);
        }
        loop {
            match self.rx.recv().await {
                Ok(assignment) => {
                    self.consume().await;
                    return Some(assignment.game);
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    if let Some(assignment) = self.store.assignment(self.player).await {
                        self.consume().await;
                        return Some(assignment.game);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn consume(&self) {
        let txn = Transaction::new().delete_assignment(self.player);
        if self.store.commit(txn).await.is_err() {
            warn!(player = %self.player.short(), "failed to consume match assignment");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
