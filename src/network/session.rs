//! Host Session Loop
//!
//! Owns the engine and drives it on a fixed tick. Intents arrive from
//! connections over an mpsc queue; each tick drains the queue into one
//! ordered batch, steps the engine, and broadcasts the resulting
//! [`BatchState`] to every subscriber.
//!
//! The engine is only ever touched from this task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::app::Application;
use crate::game::intent::Intent;
use crate::network::protocol::BatchState;

/// Upper bound on intents folded into a single batch.
pub const MAX_BATCH_INTENTS: usize = 256;

/// Receives the settlement payload once the session has an outcome.
pub trait SettlementSink: Send {
    /// Called exactly once per session.
    fn settle(&mut self, payload: &[u8]);
}

/// Default sink: logs the payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSettlement;

impl SettlementSink for LogSettlement {
    fn settle(&mut self, payload: &[u8]) {
        info!("Session settled ({} bytes): 0x{}", payload.len(), hex::encode(payload));
    }
}

/// Session loop state.
pub struct HostSession<A: Application> {
    app: A,
    sink: Box<dyn SettlementSink>,
    settled: bool,
    ticks: u64,
}

impl<A: Application> HostSession<A> {
    /// Wrap an engine and seed it.
    pub fn new(mut app: A, seed: &[u8], sink: Box<dyn SettlementSink>) -> Self {
        app.init(seed);
        Self {
            app,
            sink,
            settled: false,
            ticks: 0,
        }
    }

    /// The wrapped engine.
    pub fn app(&self) -> &A {
        &self.app
    }

    /// Whether the settlement entry has gone out.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Ticks processed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Step one batch and package its output.
    ///
    /// The first time `status` reports an outcome, the settlement entry is
    /// appended after the step's snapshots and the sink is notified.
    pub fn tick(&mut self, batch: &[Intent]) -> BatchState {
        self.ticks += 1;
        let events = self.app.step(batch);
        let mut out = BatchState::from_events(&events);

        if !self.settled {
            let (done, payload) = self.app.status();
            if done {
                self.settled = true;
                out.push_settlement(&payload);
                self.sink.settle(&payload);
            }
        }

        out
    }

    /// Run until shutdown or until every intent sender is gone.
    #[instrument(skip_all)]
    pub async fn run(
        mut self,
        mut intents: mpsc::Receiver<Intent>,
        batches: broadcast::Sender<Arc<BatchState>>,
        tick_interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Self {
        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut open = true;

        while open {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => {
                    info!("Session loop shutting down after {} ticks", self.ticks);
                    break;
                }
            }

            let mut batch = Vec::new();
            while batch.len() < MAX_BATCH_INTENTS {
                match intents.try_recv() {
                    Ok(intent) => batch.push(intent),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        open = false;
                        break;
                    }
                }
            }
            if batch.is_empty() {
                continue;
            }

            let out = self.tick(&batch);
            debug!("Tick {}: {} intents, {} entries", self.ticks, batch.len(), out.states.len());
            if !out.is_empty() && batches.send(Arc::new(out)).is_err() {
                debug!("No subscribers for tick {}", self.ticks);
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::game::engine::{EngineConfig, GomokuEngine};
    use crate::game::events::RoomSnapshot;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Vec<u8>>>>);

    impl SettlementSink for Recorder {
        fn settle(&mut self, payload: &[u8]) {
            self.0.lock().unwrap().push(payload.to_vec());
        }
    }

    fn session(recorder: &Recorder) -> HostSession<GomokuEngine> {
        let engine = GomokuEngine::new(EngineConfig::default()).unwrap();
        HostSession::new(engine, b"seed", Box::new(recorder.clone()))
    }

    fn winning_batch() -> Vec<Intent> {
        let mut batch = vec![Intent::join("p1"), Intent::join("p2")];
        for i in 0..4 {
            batch.push(Intent::play("p1", i));
            batch.push(Intent::play("p2", 19 + i));
        }
        batch.push(Intent::play("p1", 4));
        batch
    }

    #[test]
    fn test_tick_packages_events() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        let out = session.tick(&[Intent::join("p1"), Intent::join("p2")]);

        assert_eq!(out.states.len(), 2);
        assert_eq!(out.states[0].recipient_key, "p1");
        let snapshot = RoomSnapshot::from_json(&out.states[1].attributes[0].value).unwrap();
        assert!(snapshot.state.ready);
        assert!(!session.is_settled());
    }

    #[test]
    fn test_settlement_appended_once() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);

        let out = session.tick(&winning_batch());
        let last = out.states.last().unwrap();
        assert!(last.is_settlement());
        assert_eq!(last.attributes[0].value.len(), 192);
        assert!(session.is_settled());

        let later = session.tick(&[Intent::play("p2", 100)]);
        assert!(later.states.iter().all(|s| !s.is_settlement()));
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_broadcasts_batches() {
        let recorder = Recorder::default();
        let session = session(&recorder);
        let (intent_tx, intent_rx) = mpsc::channel(64);
        let (batch_tx, mut batch_rx) = broadcast::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        for intent in winning_batch() {
            intent_tx.send(intent).await.unwrap();
        }
        let handle = tokio::spawn(session.run(
            intent_rx,
            batch_tx,
            Duration::from_millis(5),
            shutdown_rx,
        ));

        let batch = batch_rx.recv().await.unwrap();
        assert!(batch.states.last().unwrap().is_settlement());

        drop(intent_tx);
        let session = handle.await.unwrap();
        assert!(session.is_settled());
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let recorder = Recorder::default();
        let session = session(&recorder);
        let (_intent_tx, intent_rx) = mpsc::channel::<Intent>(4);
        let (batch_tx, _) = broadcast::channel(4);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(session.run(
            intent_rx,
            batch_tx,
            Duration::from_millis(5),
            shutdown_rx,
        ));
        shutdown_tx.send(()).unwrap();
        let session = handle.await.unwrap();
        assert!(!session.is_settled());
    }
}
