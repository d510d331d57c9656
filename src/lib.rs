//! # Gomoku Session Engine
//!
//! Deterministic two-player gomoku for replicated hosts. Every replica fed
//! the same seed and the same ordered intent batches ends in the same
//! rooms, the same snapshots and the same settlement payload.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    GOMOKU ENGINE                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  app.rs          - Host lifecycle: init / step / status      │
//! │                                                              │
//! │  core/           - Deterministic primitives                  │
//! │  ├── identity.rs - Opaque player identity                    │
//! │  └── hash.rs     - Room ids, state hash, settlement words    │
//! │                                                              │
//! │  game/           - Session logic (deterministic)             │
//! │  ├── board.rs    - Colors and the flat board                 │
//! │  ├── win.rs      - Five-in-a-row detection                   │
//! │  ├── room.rs     - Room state and turn engine                │
//! │  ├── matchmaking.rs - Pairing players into rooms             │
//! │  ├── intent.rs   - Intent payload validation                 │
//! │  ├── events.rs   - Room snapshots                            │
//! │  └── engine.rs   - GomokuEngine (Application impl)           │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── protocol.rs - Message envelope and BatchState           │
//! │  ├── session.rs  - Tick loop around the engine               │
//! │  ├── server.rs   - WebSocket host                            │
//! │  └── client.rs   - Player-side view                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - Room ids derived from the session seed, never random
//!
//! Wall-clock time only appears in `network/` envelope timestamps.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod app;
pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::app::Application;
pub use crate::core::identity::Identity;
pub use crate::game::board::{Cell, Color};
pub use crate::game::engine::{GomokuEngine, EngineConfig, Outcome};
pub use crate::game::events::{StepEvent, RoomSnapshot};
pub use crate::game::intent::Intent;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default grid size; the board is `(BOARD_GRID_SIZE + 1)²` cells.
pub const BOARD_GRID_SIZE: usize = 18;

/// Stones in a row needed to win.
pub const WIN_LENGTH: usize = 5;
