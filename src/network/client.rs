//! Client Consumer
//!
//! The player side of the wire. [`ClientSession`] carries the player's
//! identity and builds request envelopes. [`ClientView`] folds response
//! batches into a local picture of the player's room.
//!
//! Local moves are applied optimistically and sent; the next authoritative
//! snapshot for the room replaces the local picture wholesale.

use tracing::debug;

use crate::core::identity::Identity;
use crate::game::board::Color;
use crate::game::events::{RoomSnapshot, RoomStateView};
use crate::game::intent::Intent;
use crate::game::room::TurnViolation;
use crate::game::win;
use crate::network::protocol::{BatchState, Message, ProtocolError};

/// Player-side session context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    identity: Identity,
}

impl ClientSession {
    /// Create a session for one player.
    pub fn new(identity: impl Into<Identity>) -> Self {
        Self { identity: identity.into() }
    }

    /// This player's identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Envelope asking for a seat.
    pub fn join_request(&self, timestamp: u64) -> Result<Message, ProtocolError> {
        Message::request(&Intent::join(self.identity.clone()), timestamp)
    }

    /// Envelope placing a stone.
    pub fn move_request(&self, position: usize, timestamp: u64) -> Result<Message, ProtocolError> {
        Message::request(&Intent::play(self.identity.clone(), position), timestamp)
    }
}

/// Something the view noticed while applying a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Local state replaced by an authoritative snapshot.
    Updated {
        /// Room the snapshot belongs to
        room_id: String,
        /// Confirmed step
        step: u32,
    },
    /// The session produced its settlement payload.
    SettlementReady(Vec<u8>),
}

/// Local picture of the player's room.
#[derive(Debug, Clone)]
pub struct ClientView {
    identity: Identity,
    width: usize,
    room_id: Option<String>,
    state: Option<RoomStateView>,
    confirmed_step: u32,
    /// Winner as reported by the host; local play never sets it.
    confirmed_winner: Option<Identity>,
    /// A join was sent; the next snapshot may name a different room.
    rejoining: bool,
    settlement: Option<Vec<u8>>,
}

impl ClientView {
    /// Empty view for one player on a `width × width` board.
    pub fn new(identity: impl Into<Identity>, width: usize) -> Self {
        Self {
            identity: identity.into(),
            width,
            room_id: None,
            state: None,
            confirmed_step: 0,
            confirmed_winner: None,
            rejoining: false,
            settlement: None,
        }
    }

    /// Room this player was last seen in.
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    /// Current room state (optimistic until the next snapshot lands).
    pub fn state(&self) -> Option<&RoomStateView> {
        self.state.as_ref()
    }

    /// Highest step confirmed by the host.
    pub fn confirmed_step(&self) -> u32 {
        self.confirmed_step
    }

    /// Winner confirmed by the host.
    pub fn confirmed_winner(&self) -> Option<&Identity> {
        self.confirmed_winner.as_ref()
    }

    /// Settlement payload, once announced.
    pub fn settlement(&self) -> Option<&[u8]> {
        self.settlement.as_deref()
    }

    /// This player's color, once seated.
    pub fn my_color(&self) -> Option<Color> {
        self.state.as_ref()?.player_color.get(&self.identity)
    }

    /// Note that a join went out. The host may seat this player in a new
    /// room even while the current one is unfinished.
    pub fn expect_new_room(&mut self) {
        self.rejoining = true;
    }

    /// Fold one response batch into the view.
    pub fn apply_batch(&mut self, batch: &BatchState) -> Vec<ViewEvent> {
        let mut out = Vec::new();

        for entry in &batch.states {
            let Some(attribute) = entry.attributes.first() else {
                continue;
            };

            if entry.is_settlement() {
                match hex::decode(&attribute.value) {
                    Ok(payload) => {
                        self.settlement = Some(payload.clone());
                        out.push(ViewEvent::SettlementReady(payload));
                    }
                    Err(e) => debug!("Bad settlement entry: {}", e),
                }
                continue;
            }

            let snapshot = match RoomSnapshot::from_json(&attribute.value) {
                Ok(s) => s,
                Err(e) => {
                    debug!("Unreadable snapshot for {}: {}", entry.recipient_key, e);
                    continue;
                }
            };
            if let Some(event) = self.apply_snapshot(snapshot) {
                out.push(event);
            }
        }

        out
    }

    fn apply_snapshot(&mut self, snapshot: RoomSnapshot) -> Option<ViewEvent> {
        if snapshot.state.player_color.get(&self.identity).is_none() {
            return None;
        }

        let same_room = self.room_id.as_deref() == Some(snapshot.room_id.as_str());
        if self.room_id.is_some() && !same_room {
            // A new room is only expected once the current one is over,
            // or after this player asked for a seat again.
            if self.confirmed_winner.is_none() && !self.rejoining {
                debug!("Ignoring snapshot for foreign room {}", snapshot.room_id);
                return None;
            }
            self.confirmed_step = 0;
            self.rejoining = false;
        } else if same_room && snapshot.state.step < self.confirmed_step {
            debug!(
                "Ignoring stale snapshot (step {} < {})",
                snapshot.state.step, self.confirmed_step
            );
            return None;
        }

        self.confirmed_step = snapshot.state.step;
        self.confirmed_winner = snapshot.state.winner.clone();
        self.room_id = Some(snapshot.room_id.clone());
        self.state = Some(snapshot.state);
        Some(ViewEvent::Updated {
            room_id: snapshot.room_id,
            step: self.confirmed_step,
        })
    }

    /// Play a stone locally and return the intent to send.
    ///
    /// Checks the same preconditions as the host, against local state.
    pub fn play_local(&mut self, position: usize) -> Result<Intent, TurnViolation> {
        let my_color = self.my_color();
        let width = self.width;
        let state = self.state.as_mut().ok_or(TurnViolation::NotReady)?;

        if state.player_color.len() < 2 {
            return Err(TurnViolation::NotReady);
        }
        if state.winner.is_some() {
            return Err(TurnViolation::AlreadyFinished);
        }
        let color = my_color.ok_or(TurnViolation::NotAttached)?;
        if color != state.next_color {
            return Err(TurnViolation::NotYourTurn {
                expected: state.next_color,
                actual: color,
            });
        }
        let cells = state.squares.len();
        let square = state
            .squares
            .get_mut(position)
            .ok_or(TurnViolation::OutOfBounds { position, cells })?;
        if square.is_some() {
            return Err(TurnViolation::Occupied { position });
        }

        *square = Some(color);
        state.next_color = color.opposite();
        state.step += 1;
        if win::detect(&state.squares, width) == Some(color) {
            state.winner = Some(self.identity.clone());
        }

        Ok(Intent::play(self.identity.clone(), position))
    }
}
