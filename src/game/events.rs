//! Step Events
//!
//! Every intent the engine applies produces one event keyed by the acting
//! player, carrying a JSON snapshot of that player's room:
//!
//! ```json
//! {"roomId":"…","state":{"step":3,"playerColor":{"0xa…":"BLACK","0xb…":"WHITE"},
//!  "nextColor":"WHITE","squares":[null,"BLACK",…],"winner":null,"ready":true}}
//! ```

use std::fmt;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::identity::Identity;
use crate::game::board::{Cell, Color};
use crate::game::room::Room;

/// Event type tag for room snapshots.
pub const ROOM_EVENT_TYPE: &str = "__room__";

/// One outbound event produced by `step`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Event type tag
    #[serde(rename = "type")]
    pub kind: String,
    /// Acting player
    pub key: Identity,
    /// JSON room snapshot
    pub value: String,
}

impl StepEvent {
    /// Snapshot `room` for the player who just acted.
    pub fn room_update(actor: &Identity, room: &Room) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: ROOM_EVENT_TYPE.to_string(),
            key: actor.clone(),
            value: RoomSnapshot::capture(room).to_json()?,
        })
    }
}

/// Seat colors in join order. Serialized as a JSON object whose key order
/// is the join order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerColors(pub Vec<(Identity, Color)>);

impl PlayerColors {
    /// Color held by an identity.
    pub fn get(&self, identity: &Identity) -> Option<Color> {
        self.0.iter().find(|(id, _)| id == identity).map(|(_, c)| *c)
    }

    /// Number of seated players.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No seated players.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PlayerColors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (identity, color) in &self.0 {
            map.serialize_entry(identity, color)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlayerColors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = PlayerColors;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of identity to color")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(2));
                while let Some((identity, color)) = access.next_entry::<Identity, Color>()? {
                    entries.push((identity, color));
                }
                Ok(PlayerColors(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Room state as clients see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStateView {
    /// Accepted move count
    pub step: u32,
    /// Seat colors in join order
    pub player_color: PlayerColors,
    /// Color to move
    pub next_color: Color,
    /// Board cells, row-major
    pub squares: Vec<Cell>,
    /// Winner, once decided
    pub winner: Option<Identity>,
    /// Both seats taken
    #[serde(default)]
    pub ready: bool,
}

/// Full snapshot value of a room event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Room id
    pub room_id: String,
    /// Room state
    pub state: RoomStateView,
}

impl RoomSnapshot {
    /// Capture the current state of a room.
    pub fn capture(room: &Room) -> Self {
        Self {
            room_id: room.id().to_string(),
            state: RoomStateView {
                step: room.step(),
                player_color: PlayerColors(room.players().to_vec()),
                next_color: room.next_color(),
                squares: room.board().cells().to_vec(),
                winner: room.winner().cloned(),
                ready: room.is_ready(),
            },
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
