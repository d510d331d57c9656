//! Host Application Interface
//!
//! The lifecycle a replicated host drives: seed once, feed ordered batches,
//! poll for completion. Engines implement it; hosts and test drivers own
//! the loop and hold the engine by composition.

use crate::game::intent::Intent;

pub use crate::game::events::StepEvent;

/// Deterministic state-transition application.
pub trait Application {
    /// Seed the session. An empty seed is valid.
    fn init(&mut self, seed: &[u8]);

    /// Apply a batch of intents in order, returning one event per applied
    /// intent, in the same order. Rejected intents produce no event.
    fn step(&mut self, batch: &[Intent]) -> Vec<StepEvent>;

    /// Whether the session has an outcome, and its settlement payload.
    ///
    /// Must not mutate state; repeated calls return the same answer until
    /// the next `step`.
    fn status(&self) -> (bool, Vec<u8>);
}
