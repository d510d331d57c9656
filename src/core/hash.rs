//! Hashing Helpers
//!
//! Deterministic SHA-256 hashing used for:
//! - Room id derivation from the session seed
//! - Settlement payload words for non-address identities
//! - Engine state hashes for cross-replica comparison

use sha2::{Sha256, Digest};
use uuid::Uuid;

use super::identity::Identity;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher with a domain separator.
///
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for engine state.
    pub fn for_engine_state() -> Self {
        Self::new(b"GOMOKU_STATE_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> StateHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Derive a room id from the session seed and the room's creation ordinal.
///
/// Every replica fed the same seed assigns the same ids in the same order.
pub fn derive_room_id(seed: &[u8], ordinal: u64) -> Uuid {
    let mut hasher = StateHasher::new(b"GOMOKU_ROOM_ID_V1");
    hasher.update_u32(seed.len() as u32);
    hasher.update_bytes(seed);
    hasher.update_u64(ordinal);
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Encode an identity as one 32-byte settlement word.
///
/// Account addresses are left-padded with zeros (ABI `address` encoding).
/// Anything else is hashed, so the word still has a fixed width.
pub fn settlement_word(identity: &Identity) -> [u8; 32] {
    match identity.as_address() {
        Some(address) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(&address);
            word
        }
        None => hash_with_domain(b"GOMOKU_IDENTITY_V1:", identity.as_str().as_bytes()),
    }
}
