//! RPS Arena Server
//!
//! Drives a complete demo match through the engine: two players are
//! registered, matched through the queue, and played to completion with
//! every state transition logged.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rps_arena::{
    EngineConfig, GameEngine, MemoryStore, Move, PlayerId, PlayerProfile, SessionStatus,
    SessionStore, VERSION,
};
use rps_arena::identity::StaticIdentity;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("RPS Arena Server v{}", VERSION);

    demo_match().await
}

/// Run a scripted match end to end.
async fn demo_match() -> Result<()> {
    info!("=== Starting Demo Match ===");

    let store = Arc::new(MemoryStore::new());
    let config = EngineConfig {
        // Short drain so the demo moves along.
        round_reset_delay: Duration::from_millis(300),
        ..Default::default()
    };
    // The demo plays both sides, switching the signed-in user before
    // each submission.
    let identity = Arc::new(StaticIdentity::signed_out());
    let engine = Arc::new(GameEngine::new(store.clone(), identity.clone(), config));

    let alice = PlayerId::generate();
    let bob = PlayerId::generate();
    store.register_profile(PlayerProfile::new(alice, "alice")).await;
    store.register_profile(PlayerProfile::new(bob, "bob")).await;

    // Both players hit the queue concurrently; exactly one of them forms
    // the session, the other learns about it through the assignment.
    let (first, second) = tokio::join!(engine.join_queue(alice), engine.join_queue(bob));
    let game = match (first?, second?) {
        (Some(game), None) | (None, Some(game)) => game,
        other => anyhow::bail!("matchmaking produced unexpected result: {:?}", other),
    };
    info!("Matched into game {}", game);

    let mut watcher = engine.watch_game(game).await?;

    // Scripted rounds: alice takes the first, drops the second, then
    // closes it out 2-1.
    let script = [
        (Move::Rock, Move::Scissors),
        (Move::Paper, Move::Scissors),
        (Move::Paper, Move::Rock),
    ];

    for (round, (alice_move, bob_move)) in script.iter().enumerate() {
        info!(
            "Round {}: alice plays {:?}, bob plays {:?}",
            round + 1,
            alice_move,
            bob_move
        );
        identity.sign_in(alice);
        engine.submit_move(game, alice, *alice_move).await?;
        identity.sign_in(bob);
        engine.submit_move(game, bob, *bob_move).await?;

        // Wait out the drain window before the next round.
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    // Drain the watcher to the final state.
    let mut final_state = None;
    while let Some(state) = watcher.next().await {
        let done = state.status == SessionStatus::Complete;
        final_state = Some(state);
        if done {
            break;
        }
    }

    info!("=== Match Results ===");
    if let Some(state) = final_state {
        info!(
            "{} {} - {} {}",
            state.slot_a.display_name, state.slot_a.score, state.slot_b.score, state.slot_b.display_name
        );
        match state.winner {
            Some(winner) => info!("Winner: {}", winner),
            None => info!("No winner recorded"),
        }
    }

    for player in [alice, bob] {
        let (profile, _) = store.profile(player).await;
        if let Some(profile) = profile {
            info!("{} has now played {} game(s)", profile.display_name, profile.games_played);
        }
    }

    Ok(())
}
