//! Game Logic Module
//!
//! All session logic. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `board`: Stone colors and the flat board
//! - `win`: Five-in-a-row detection
//! - `room`: Room state and the turn engine
//! - `matchmaking`: Pairing players into rooms
//! - `intent`: Typed intents and payload validation
//! - `events`: Room snapshots emitted per applied intent
//! - `engine`: The session engine behind the host interface

pub mod board;
pub mod win;
pub mod room;
pub mod matchmaking;
pub mod intent;
pub mod events;
pub mod engine;

// Re-export key types
pub use board::{Board, Cell, Color};
pub use win::{detect, find_line, Direction, WinningLine};
pub use room::{Room, TurnViolation, MoveApplied};
pub use matchmaking::{RoomAllocator, RoomHandle, Joined};
pub use intent::{Intent, IntentRequest, IntentError};
pub use events::{StepEvent, RoomSnapshot, RoomStateView, PlayerColors};
pub use engine::{GomokuEngine, EngineConfig, EngineError, Outcome, Rejection};
