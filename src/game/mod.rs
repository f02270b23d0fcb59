//! Deterministic game logic: move resolution and the session state
//! machine. No I/O and no clocks — the engine layer owns scheduling.

pub mod moves;
pub mod session;
