//! Session Engine
//!
//! Ties matchmaking, the turn engine and event emission together behind the
//! [`Application`] interface. One engine owns one session for its lifetime,
//! so nothing here locks: every intent runs to completion, win check
//! included, before the next one is looked at.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::app::Application;
use crate::core::hash::{settlement_word, StateHash, StateHasher};
use crate::core::identity::Identity;
use crate::game::events::StepEvent;
use crate::game::intent::Intent;
use crate::game::matchmaking::{Joined, RoomAllocator, RoomHandle};
use crate::game::room::TurnViolation;
use crate::{BOARD_GRID_SIZE, WIN_LENGTH};

/// Engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Grid size `N`; the board is `(N+1) × (N+1)` cells.
    pub grid_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: BOARD_GRID_SIZE,
        }
    }
}

impl EngineConfig {
    /// Cells per board side.
    pub fn board_width(&self) -> usize {
        self.grid_size + 1
    }

    /// Reject boards on which no line can ever be completed.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.board_width() < WIN_LENGTH {
            return Err(EngineError::BoardTooSmall {
                width: self.board_width(),
            });
        }
        Ok(())
    }
}

/// Engine construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Board narrower than a winning line.
    #[error("board width {width} is too small for a line of five")]
    BoardTooSmall {
        /// Configured width
        width: usize,
    },
}

/// Why an intent was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Join from a player already seated in the current live room.
    #[error("already seated")]
    AlreadySeated,
    /// Move from a player with no room.
    #[error("player has no room")]
    NoRoom,
    /// Identity equal to the reserved settlement key.
    #[error("identity is reserved")]
    ReservedIdentity,
    /// Move failed a turn precondition.
    #[error(transparent)]
    Turn(#[from] TurnViolation),
}

/// Settlement outcome of a finished room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Room that produced it
    pub room_id: String,
    /// First joiner (Black)
    pub first: Identity,
    /// Second joiner (White)
    pub second: Identity,
    /// Winner
    pub winner: Identity,
}

impl Outcome {
    /// Encoded payload length: three 32-byte words.
    pub const ENCODED_LEN: usize = 96;

    /// Encode `(first, second, winner)` as three 32-byte words.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        for identity in [&self.first, &self.second, &self.winner] {
            out.extend_from_slice(&settlement_word(identity));
        }
        out
    }
}

/// Counters for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Batches processed
    pub batches: u64,
    /// Intents applied
    pub applied: u64,
    /// Intents dropped
    pub dropped: u64,
}

/// Authoritative gomoku session engine.
#[derive(Clone, Debug)]
pub struct GomokuEngine {
    config: EngineConfig,
    seed: Vec<u8>,
    rooms: RoomAllocator,
    /// First room to finish; its outcome is the session outcome.
    settled: Option<RoomHandle>,
    stats: EngineStats,
}

impl GomokuEngine {
    /// Create an engine.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            seed: Vec::new(),
            rooms: RoomAllocator::new(config.board_width()),
            settled: None,
            stats: EngineStats::default(),
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Matchmaker and rooms.
    pub fn rooms(&self) -> &RoomAllocator {
        &self.rooms
    }

    /// Counters.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Apply one intent, returning the room it touched.
    pub fn apply(&mut self, intent: &Intent) -> Result<RoomHandle, Rejection> {
        if intent.identity().is_reserved() {
            return Err(Rejection::ReservedIdentity);
        }
        match intent {
            Intent::Join { identity } => match self.rooms.join(identity.clone()) {
                Joined::Seated { handle, .. } => Ok(handle),
                Joined::AlreadySeated { .. } => Err(Rejection::AlreadySeated),
            },
            Intent::Move { identity, position } => {
                let handle = self.rooms.room_of(identity).ok_or(Rejection::NoRoom)?;
                let room = self.rooms.room_mut(handle).ok_or(Rejection::NoRoom)?;
                let applied = room.apply_move(identity, *position)?;

                if applied.winner.is_some() && self.settled.is_none() {
                    self.settled = Some(handle);
                    info!("Session outcome decided in room {}", room.id());
                }
                Ok(handle)
            }
        }
    }

    /// Outcome of the first finished room.
    pub fn outcome(&self) -> Option<Outcome> {
        let room = self.rooms.room(self.settled?)?;
        Some(Outcome {
            room_id: room.id().to_string(),
            first: room.first_joiner()?.clone(),
            second: room.second_joiner()?.clone(),
            winner: room.winner()?.clone(),
        })
    }

    /// Hash of all rooms, in creation order.
    pub fn state_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_engine_state();
        hasher.update_u32(self.seed.len() as u32);
        hasher.update_bytes(&self.seed);
        hasher.update_u64(self.config.grid_size as u64);
        hasher.update_u32(self.rooms.rooms().len() as u32);

        for room in self.rooms.rooms() {
            hasher.update_str(&room.id().to_string());
            hasher.update_u32(room.step());
            hasher.update_u8(room.next_color() as u8);
            hasher.update_u8(room.players().len() as u8);
            for (identity, color) in room.players() {
                hasher.update_str(identity.as_str());
                hasher.update_u8(*color as u8);
            }
            hasher.update_bool(room.winner().is_some());
            if let Some(winner) = room.winner() {
                hasher.update_str(winner.as_str());
            }
            for cell in room.board().cells() {
                hasher.update_u8(cell.map_or(0, |c| c as u8));
            }
        }

        hasher.finalize()
    }
}

impl Application for GomokuEngine {
    fn init(&mut self, seed: &[u8]) {
        self.seed = seed.to_vec();
        self.rooms.set_seed(seed);
        info!("Engine seeded ({} bytes: {})", seed.len(), hex::encode(seed));
    }

    fn step(&mut self, batch: &[Intent]) -> Vec<StepEvent> {
        self.stats.batches += 1;
        let mut events = Vec::with_capacity(batch.len());

        for intent in batch {
            let handle = match self.apply(intent) {
                Ok(handle) => handle,
                Err(reason) => {
                    self.stats.dropped += 1;
                    debug!("Dropped {:?} from {}: {}", intent, intent.identity().short(), reason);
                    continue;
                }
            };
            self.stats.applied += 1;

            let Some(room) = self.rooms.room(handle) else {
                continue;
            };
            match StepEvent::room_update(intent.identity(), room) {
                Ok(event) => {
                    #[cfg(feature = "debug-tracing")]
                    tracing::trace!(room = %room.id(), snapshot = %event.value, "room event");
                    events.push(event);
                }
                Err(e) => error!("Failed to serialize room {}: {}", room.id(), e),
            }
        }

        events
    }

    fn status(&self) -> (bool, Vec<u8>) {
        match self.outcome() {
            Some(outcome) => (true, outcome.encode()),
            None => (false, Vec::new()),
        }
    }
}
