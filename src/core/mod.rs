//! Core deterministic primitives.
//!
//! Identity tokens and hashing helpers shared by the game and network layers.

pub mod identity;
pub mod hash;

// Re-export core types
pub use identity::{Identity, RESERVED_DATA_KEY};
pub use hash::{StateHash, StateHasher, derive_room_id, settlement_word};
