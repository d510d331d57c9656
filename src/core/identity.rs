//! Player Identity
//!
//! Opaque player token as delivered by the transport (usually a wallet
//! address string). Ordered so it can key `BTreeMap`s deterministically.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Attribute key reserved for the settlement signal in a `BatchState`.
///
/// No player may use it as an identity, otherwise a consumer could mistake
/// that player's room snapshot for a settlement notice.
pub const RESERVED_DATA_KEY: &str = "data";

/// Opaque, comparable player identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this identity collides with a reserved wire key.
    pub fn is_reserved(&self) -> bool {
        self.0 == RESERVED_DATA_KEY
    }

    /// Parse as a 20-byte account address (`0x` + 40 hex digits).
    pub fn as_address(&self) -> Option<[u8; 20]> {
        let digits = self.0.strip_prefix("0x").or_else(|| self.0.strip_prefix("0X"))?;
        if digits.len() != 40 {
            return None;
        }
        let bytes = hex::decode(digits).ok()?;
        let mut address = [0u8; 20];
        address.copy_from_slice(&bytes);
        Some(address)
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(10)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        let id = Identity::new("0x00000000000000000000000000000000000000ff");
        let address = id.as_address().unwrap();
        assert_eq!(address[19], 0xff);
        assert!(address[..19].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_non_address_identity() {
        assert!(Identity::new("alice").as_address().is_none());
        assert!(Identity::new("0x1234").as_address().is_none());
        assert!(Identity::new("0xzz00000000000000000000000000000000000000").as_address().is_none());
    }

    #[test]
    fn test_reserved_key() {
        assert!(Identity::new("data").is_reserved());
        assert!(!Identity::new("Data").is_reserved());
    }

    #[test]
    fn test_serde_transparent() {
        let id = Identity::new("p1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
        let back: Identity = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_short_prefix() {
        assert_eq!(Identity::new("0x0123456789abcdef").short(), "0x01234567");
        assert_eq!(Identity::new("bob").short(), "bob");
    }
}
