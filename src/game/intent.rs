//! Player Intents
//!
//! The typed requests the engine consumes, and the decoder for the JSON
//! request payload carried inside a `Request` envelope:
//!
//! ```json
//! {"version": 1, "requestType": "NEW", "identity": "0xabc..."}
//! {"version": 1, "requestType": "PROCEED", "identity": "0xabc...", "position": 42}
//! ```
//!
//! Anything that does not decode into exactly one of these shapes is a
//! validation failure and never reaches the engine.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::identity::Identity;

/// Payload schema version understood by this decoder.
pub const INTENT_VERSION: u64 = 1;

/// A validated player intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Ask for a seat.
    Join {
        /// Acting player
        identity: Identity,
    },
    /// Place a stone.
    Move {
        /// Acting player
        identity: Identity,
        /// Flat board index
        position: usize,
    },
}

impl Intent {
    /// Build a join intent.
    pub fn join(identity: impl Into<Identity>) -> Self {
        Intent::Join { identity: identity.into() }
    }

    /// Build a move intent.
    pub fn play(identity: impl Into<Identity>, position: usize) -> Self {
        Intent::Move { identity: identity.into(), position }
    }

    /// Acting player.
    pub fn identity(&self) -> &Identity {
        match self {
            Intent::Join { identity } | Intent::Move { identity, .. } => identity,
        }
    }

    /// Decode and validate a request payload.
    pub fn decode(payload: &[u8]) -> Result<Self, IntentError> {
        IntentRequest::decode(payload).map(Intent::from)
    }

    /// Encode as a request payload.
    pub fn encode(&self) -> Result<Vec<u8>, IntentError> {
        IntentRequest::from(self.clone()).encode()
    }
}

/// Wire shape of a request payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "requestType")]
pub enum IntentRequest {
    /// Join matchmaking.
    #[serde(rename = "NEW")]
    New {
        /// Acting player
        #[serde(alias = "address")]
        identity: Identity,
    },
    /// Play a move.
    #[serde(rename = "PROCEED")]
    Proceed {
        /// Acting player
        #[serde(alias = "address")]
        identity: Identity,
        /// Flat board index
        position: usize,
    },
}

impl IntentRequest {
    /// Decode a request payload, checking version and reserved identities.
    pub fn decode(payload: &[u8]) -> Result<Self, IntentError> {
        let mut value: serde_json::Value =
            serde_json::from_slice(payload).map_err(|e| IntentError::Malformed(e.to_string()))?;

        let object = value.as_object_mut().ok_or(IntentError::NotAnObject)?;
        let version = match object.remove("version") {
            None | Some(serde_json::Value::Null) => INTENT_VERSION,
            Some(v) => v.as_u64().ok_or(IntentError::UnsupportedVersion(None))?,
        };
        if version != INTENT_VERSION {
            return Err(IntentError::UnsupportedVersion(Some(version)));
        }

        match object.get("requestType").and_then(|v| v.as_str()) {
            Some("NEW") | Some("PROCEED") => {}
            Some(other) => return Err(IntentError::UnknownRequestType(other.to_string())),
            None => return Err(IntentError::MissingField("requestType")),
        }
        if object.get("requestType").and_then(|v| v.as_str()) == Some("PROCEED")
            && object.get("position").map_or(true, |v| v.is_null())
        {
            return Err(IntentError::MissingField("position"));
        }

        let request: IntentRequest =
            serde_json::from_value(value).map_err(|e| IntentError::Malformed(e.to_string()))?;

        if request.identity().is_reserved() {
            return Err(IntentError::ReservedIdentity);
        }
        Ok(request)
    }

    /// Encode with the current version tag.
    pub fn encode(&self) -> Result<Vec<u8>, IntentError> {
        let mut value = serde_json::to_value(self).map_err(|e| IntentError::Malformed(e.to_string()))?;
        if let Some(object) = value.as_object_mut() {
            object.insert("version".to_string(), INTENT_VERSION.into());
        }
        serde_json::to_vec(&value).map_err(|e| IntentError::Malformed(e.to_string()))
    }

    /// Acting player.
    pub fn identity(&self) -> &Identity {
        match self {
            IntentRequest::New { identity } | IntentRequest::Proceed { identity, .. } => identity,
        }
    }
}

impl From<IntentRequest> for Intent {
    fn from(request: IntentRequest) -> Self {
        match request {
            IntentRequest::New { identity } => Intent::Join { identity },
            IntentRequest::Proceed { identity, position } => Intent::Move { identity, position },
        }
    }
}

impl From<Intent> for IntentRequest {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Join { identity } => IntentRequest::New { identity },
            Intent::Move { identity, position } => IntentRequest::Proceed { identity, position },
        }
    }
}

/// Validation failures for request payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// Not JSON, or JSON of the wrong shape.
    #[error("malformed request: {0}")]
    Malformed(String),
    /// Top-level JSON value is not an object.
    #[error("request is not a JSON object")]
    NotAnObject,
    /// Version missing a numeric value or not understood.
    #[error("unsupported request version {0:?}")]
    UnsupportedVersion(Option<u64>),
    /// `requestType` is not NEW or PROCEED.
    #[error("unknown request type {0:?}")]
    UnknownRequestType(String),
    /// A required field is absent or null.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// Identity collides with a reserved wire key.
    #[error("identity is reserved")]
    ReservedIdentity,
    /// Payload identity differs from the envelope sender.
    #[error("payload identity {payload} does not match sender {sender}")]
    SenderMismatch {
        /// Envelope identity
        sender: Identity,
        /// Identity inside the payload
        payload: Identity,
    },
}
