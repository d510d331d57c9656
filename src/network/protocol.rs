//! Protocol Messages
//!
//! Wire format between clients and the host. Every frame is a bincode
//! [`Message`] envelope:
//!
//! - `Request` envelopes carry a JSON intent payload (see `game::intent`).
//! - `Response` envelopes carry a bincode [`BatchState`].
//!
//! Both directions share the same codec options, so a frame produced by
//! one side always decodes on the other.

use bincode::Options;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::identity::{Identity, RESERVED_DATA_KEY};
use crate::game::events::StepEvent;
use crate::game::intent::{Intent, IntentError};

/// Largest frame the codec will decode.
pub const MAX_FRAME_BYTES: u64 = 1 << 20;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_FRAME_BYTES)
}

/// Envelope direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Client to host.
    Request,
    /// Host to client.
    Response,
}

/// Binary envelope exchanged over the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Direction
    pub kind: MessageKind,
    /// Sender (requests) or recipient (responses)
    pub identity: Identity,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// JSON intent (requests) or encoded `BatchState` (responses)
    pub payload: Vec<u8>,
    /// Sender signature; verified upstream of this crate
    pub signature: Vec<u8>,
}

impl Message {
    /// Build a request envelope around an intent.
    pub fn request(intent: &Intent, timestamp: u64) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: MessageKind::Request,
            identity: intent.identity().clone(),
            timestamp,
            payload: intent.encode()?,
            signature: Vec::new(),
        })
    }

    /// Build a response envelope around a batch.
    pub fn response(
        recipient: Identity,
        batch: &BatchState,
        timestamp: u64,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: MessageKind::Response,
            identity: recipient,
            timestamp,
            payload: batch.to_bytes()?,
            signature: Vec::new(),
        })
    }

    /// Decode the intent of a request envelope.
    ///
    /// The payload must name the same player as the envelope.
    pub fn intent(&self) -> Result<Intent, IntentError> {
        let intent = Intent::decode(&self.payload)?;
        if intent.identity() != &self.identity {
            return Err(IntentError::SenderMismatch {
                sender: self.identity.clone(),
                payload: intent.identity().clone(),
            });
        }
        Ok(intent)
    }

    /// Decode the batch of a response envelope.
    pub fn batch(&self) -> Result<BatchState, ProtocolError> {
        if self.kind != MessageKind::Response {
            return Err(ProtocolError::UnexpectedKind {
                expected: MessageKind::Response,
                found: self.kind,
            });
        }
        BatchState::from_bytes(&self.payload)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(codec().serialize(self)?)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        Ok(codec().deserialize(data)?)
    }
}

/// One key/value pair of a state entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Key; the acting identity, or `"data"` for the settlement signal
    pub key: String,
    /// Value; a JSON room snapshot, or the hex settlement payload
    pub value: String,
}

/// Snapshot entry addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Recipient key
    pub recipient_key: String,
    /// Ordered attributes
    pub attributes: Vec<Attribute>,
}

impl StateEntry {
    /// True if this entry is the settlement signal rather than a snapshot.
    pub fn is_settlement(&self) -> bool {
        self.attributes
            .first()
            .map_or(false, |a| a.key == RESERVED_DATA_KEY)
    }
}

/// Ordered batch of state entries sent to clients after a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    /// Entries in step order
    pub states: Vec<StateEntry>,
}

impl BatchState {
    /// Package step events, preserving their order.
    pub fn from_events(events: &[StepEvent]) -> Self {
        let states = events
            .iter()
            .map(|event| StateEntry {
                recipient_key: event.key.to_string(),
                attributes: vec![Attribute {
                    key: event.key.to_string(),
                    value: event.value.clone(),
                }],
            })
            .collect();
        Self { states }
    }

    /// Append the settlement signal carrying the hex-encoded payload.
    pub fn push_settlement(&mut self, payload: &[u8]) {
        self.states.push(StateEntry {
            recipient_key: RESERVED_DATA_KEY.to_string(),
            attributes: vec![Attribute {
                key: RESERVED_DATA_KEY.to_string(),
                value: hex::encode(payload),
            }],
        });
    }

    /// Nothing to send.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(codec().serialize(self)?)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        Ok(codec().deserialize(data)?)
    }
}

/// Envelope-level failures. These stay in the transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
    /// Envelope of the wrong direction.
    #[error("expected {expected:?} envelope, got {found:?}")]
    UnexpectedKind {
        /// Expected kind
        expected: MessageKind,
        /// Kind received
        found: MessageKind,
    },
    /// Intent payload could not be encoded.
    #[error("intent payload: {0}")]
    Intent(#[from] IntentError),
}

/// Current wall-clock time for envelope timestamps.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::ROOM_EVENT_TYPE;

    #[test]
    fn test_request_envelope_roundtrip() {
        let msg = Message::request(&Intent::play("p1", 42), 1234567890).unwrap();
        let bytes = msg.to_bytes().unwrap();
        let parsed = Message::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.kind, MessageKind::Request);
        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.intent().unwrap(), Intent::play("p1", 42));
    }

    #[test]
    fn test_sender_mismatch() {
        let mut msg = Message::request(&Intent::join("p1"), 0).unwrap();
        msg.identity = Identity::new("p2");
        assert!(matches!(msg.intent(), Err(IntentError::SenderMismatch { .. })));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(Message::from_bytes(&[0xff, 0x01]).is_err());

        let msg = Message::request(&Intent::join("p1"), 0).unwrap();
        let mut bytes = msg.to_bytes().unwrap();
        bytes.push(0);
        assert!(Message::from_bytes(&bytes).is_err(), "trailing bytes must be rejected");
    }

    #[test]
    fn test_batch_preserves_event_order() {
        let events = vec![
            StepEvent { kind: ROOM_EVENT_TYPE.into(), key: "p1".into(), value: "{\"a\":1}".into() },
            StepEvent { kind: ROOM_EVENT_TYPE.into(), key: "p2".into(), value: "{\"a\":2}".into() },
        ];
        let batch = BatchState::from_events(&events);
        let response = Message::response(Identity::new("p2"), &batch, 5).unwrap();
        let decoded = Message::from_bytes(&response.to_bytes().unwrap())
            .unwrap()
            .batch()
            .unwrap();

        let keys: Vec<_> = decoded.states.iter().map(|s| s.recipient_key.as_str()).collect();
        assert_eq!(keys, vec!["p1", "p2"]);
        assert_eq!(decoded.states[1].attributes[0].value, "{\"a\":2}");
        assert!(!decoded.states[0].is_settlement());
    }

    #[test]
    fn test_settlement_entry() {
        let mut batch = BatchState::default();
        batch.push_settlement(&[0xab, 0xcd]);
        assert!(batch.states[0].is_settlement());
        assert_eq!(batch.states[0].attributes[0].value, "abcd");
    }

    #[test]
    fn test_batch_from_request_rejected() {
        let msg = Message::request(&Intent::join("p1"), 0).unwrap();
        assert!(matches!(
            msg.batch(),
            Err(ProtocolError::UnexpectedKind { expected: MessageKind::Response, .. })
        ));
    }
}
