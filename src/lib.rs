//! # RPS Arena Server
//!
//! Authoritative multiplayer session engine for realtime
//! rock-paper-scissors: matchmaking, per-round move submission, winner
//! determination, and tie-breaker escalation, correct under concurrent
//! access from two uncoordinated clients.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RPS ARENA SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/            - Pure game logic (no I/O, no clocks)      │
//! │  ├── moves.rs     - Move enum and round resolver             │
//! │  └── session.rs   - Session state machine, escalation        │
//! │                                                              │
//! │  matchmaking.rs   - Queue records, opponent selection        │
//! │  identity.rs      - External identity collaborator seam      │
//! │                                                              │
//! │  store/           - Transactional shared store               │
//! │  ├── mod.rs       - Versioned commit contract                │
//! │  └── memory.rs    - In-process reference implementation      │
//! │                                                              │
//! │  engine/          - Orchestration                            │
//! │  └── service.rs   - Join, submit, watch, deferred reset      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! The store is the only shared mutable resource. Every engine operation
//! is an optimistic read-modify-write: reads carry version stamps and a
//! commit applies its multi-key writes atomically iff every stamp still
//! matches, so concurrent transactions serialize. Losers retry with a
//! fresh read up to a configured bound, then surface `MatchConflict`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod engine;
pub mod game;
pub mod identity;
pub mod matchmaking;
pub mod store;

// Re-export commonly used types
pub use engine::{EngineConfig, GameEngine, GameError, GameWatcher, MatchWatcher};
pub use game::moves::{resolve, Move, RoundOutcome};
pub use game::session::{GameId, GameSession, MatchRules, PlayerId, SessionStatus, Slot};
pub use matchmaking::{MatchAssignment, PlayerProfile, WaitingEntry};
pub use store::memory::MemoryStore;
pub use store::{SessionStore, StoreError, Transaction, Version};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
