//! Room State and Turn Engine
//!
//! A room is one paired game: board, seat colors, turn and winner.
//! All mutation after seating goes through [`Room::apply_move`], which
//! checks every precondition before touching state.

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::identity::Identity;
use crate::game::board::{Board, Color};
use crate::game::win::{find_line, WinningLine};

/// Seats per room.
pub const ROOM_CAPACITY: usize = 2;

/// Why a move was not applied.
///
/// These are steady-state outcomes of client/server desync. Callers drop
/// the intent and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnViolation {
    /// Room does not have two players yet.
    #[error("room is not ready")]
    NotReady,
    /// Room already has a winner.
    #[error("room is already finished")]
    AlreadyFinished,
    /// Player holds no seat in this room.
    #[error("player is not seated in this room")]
    NotAttached,
    /// Player's color is not the color to move.
    #[error("not {actual:?}'s turn, {expected:?} to move")]
    NotYourTurn {
        /// Color to move
        expected: Color,
        /// Color of the player who tried
        actual: Color,
    },
    /// Position is off the board.
    #[error("position {position} is off the board ({cells} cells)")]
    OutOfBounds {
        /// Requested position
        position: usize,
        /// Cells on the board
        cells: usize,
    },
    /// Cell already holds a stone.
    #[error("cell {position} is occupied")]
    Occupied {
        /// Requested position
        position: usize,
    },
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveApplied {
    /// Color that was played
    pub color: Color,
    /// Step counter after the move
    pub step: u32,
    /// Winner, if this move completed a line
    pub winner: Option<Identity>,
}

/// One two-player game.
#[derive(Clone, Debug)]
pub struct Room {
    id: Uuid,
    board: Board,
    /// Seat order is join order: index 0 is Black.
    player_color: Vec<(Identity, Color)>,
    next_color: Color,
    step: u32,
    winner: Option<Identity>,
    winning_line: Option<WinningLine>,
}

impl Room {
    /// Create an empty room with a `width × width` board.
    pub fn new(id: Uuid, width: usize) -> Self {
        Self {
            id,
            board: Board::new(width),
            player_color: Vec::with_capacity(ROOM_CAPACITY),
            next_color: Color::Black,
            step: 0,
            winner: None,
            winning_line: None,
        }
    }

    /// Room id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Seated players in join order.
    pub fn players(&self) -> &[(Identity, Color)] {
        &self.player_color
    }

    /// Color to move next.
    pub fn next_color(&self) -> Color {
        self.next_color
    }

    /// Accepted move count.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Winner, once decided.
    pub fn winner(&self) -> Option<&Identity> {
        self.winner.as_ref()
    }

    /// The line that decided the game.
    pub fn winning_line(&self) -> Option<&WinningLine> {
        self.winning_line.as_ref()
    }

    /// Both seats taken.
    pub fn is_ready(&self) -> bool {
        self.player_color.len() == ROOM_CAPACITY
    }

    /// Same as ready; no seat left for matchmaking.
    pub fn is_full(&self) -> bool {
        self.player_color.len() >= ROOM_CAPACITY
    }

    /// Winner decided; room is frozen.
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Check if an identity holds a seat.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.player_color.iter().any(|(id, _)| id == identity)
    }

    /// Color held by an identity.
    pub fn color_of(&self, identity: &Identity) -> Option<Color> {
        self.player_color
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, color)| *color)
    }

    /// Identity holding a color.
    pub fn holder_of(&self, color: Color) -> Option<&Identity> {
        self.player_color
            .iter()
            .find(|(_, c)| *c == color)
            .map(|(id, _)| id)
    }

    /// First joiner (Black).
    pub fn first_joiner(&self) -> Option<&Identity> {
        self.player_color.first().map(|(id, _)| id)
    }

    /// Second joiner (White).
    pub fn second_joiner(&self) -> Option<&Identity> {
        self.player_color.get(1).map(|(id, _)| id)
    }

    /// Give `identity` the next free seat.
    ///
    /// Returns the seat color, or `None` if the room is full or the identity
    /// is already seated (no mutation in either case).
    pub(crate) fn seat(&mut self, identity: Identity) -> Option<Color> {
        if self.contains(&identity) {
            return None;
        }
        let color = Color::for_seat(self.player_color.len())?;
        self.player_color.push((identity, color));

        if self.is_ready() {
            self.next_color = Color::Black;
            info!("Room {} ready", self.id);
        }
        Some(color)
    }

    /// Apply one move.
    ///
    /// Preconditions are checked in this order: room ready, no winner,
    /// player seated, player's turn, position on the board, cell empty.
    /// On success the stone is written, the step advances, the turn passes,
    /// and the board is checked for a completed line.
    pub fn apply_move(
        &mut self,
        identity: &Identity,
        position: usize,
    ) -> Result<MoveApplied, TurnViolation> {
        if !self.is_ready() {
            return Err(TurnViolation::NotReady);
        }
        if self.is_finished() {
            return Err(TurnViolation::AlreadyFinished);
        }
        let color = self.color_of(identity).ok_or(TurnViolation::NotAttached)?;
        if color != self.next_color {
            return Err(TurnViolation::NotYourTurn {
                expected: self.next_color,
                actual: color,
            });
        }
        if !self.board.in_bounds(position) {
            return Err(TurnViolation::OutOfBounds {
                position,
                cells: self.board.len(),
            });
        }
        if self.board.get(position).is_some() {
            return Err(TurnViolation::Occupied { position });
        }

        debug_assert!(self.winner.is_none(), "mutating a finished room");

        self.board.place(position, color);
        self.step += 1;
        self.next_color = color.opposite();

        if let Some(line) = find_line(self.board.cells(), self.board.width()) {
            self.winner = self.holder_of(line.color).cloned();
            self.winning_line = Some(line);
            if let Some(winner) = &self.winner {
                info!(
                    "Room {} won by {} ({:?}) at step {}, line {:?} from {}",
                    self.id,
                    winner.short(),
                    line.color,
                    self.step,
                    line.direction,
                    line.start
                );
            }
        } else {
            debug!("Room {} step {}: {:?} at {}", self.id, self.step, color, position);
        }

        Ok(MoveApplied {
            color,
            step: self.step,
            winner: self.winner.clone(),
        })
    }
}
