//! Network Layer
//!
//! Envelope codec, host session loop, WebSocket server and client consumer.
//! This layer is **non-deterministic** - all game logic runs through `game/`.

pub mod protocol;
pub mod session;
pub mod server;
pub mod client;

pub use protocol::{Message, MessageKind, Attribute, StateEntry, BatchState, ProtocolError};
pub use session::{HostSession, SettlementSink, LogSettlement};
pub use server::{GameServer, ServerConfig, ServerError, ConfigError, FrameError};
pub use client::{ClientSession, ClientView, ViewEvent};
