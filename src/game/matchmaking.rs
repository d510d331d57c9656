//! Room Allocation
//!
//! Pairs joining players into rooms of two. There is at most one open room
//! at a time: the most recently created one, while it has a free seat.
//! Full rooms (playing or finished) are never offered again.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::core::hash::derive_room_id;
use crate::core::identity::Identity;
use crate::game::board::Color;
use crate::game::room::Room;

/// Index of a room within the allocator. Stable for the session lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomHandle(usize);

impl RoomHandle {
    /// Creation ordinal of the room.
    pub fn ordinal(self) -> usize {
        self.0
    }
}

/// Outcome of a join request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Joined {
    /// Player took a new seat.
    Seated {
        /// Room the player now belongs to
        handle: RoomHandle,
        /// Seat color
        color: Color,
    },
    /// Player already holds a seat in a live room; nothing changed.
    AlreadySeated {
        /// Room the player belongs to
        handle: RoomHandle,
    },
}

impl Joined {
    /// Room handle regardless of outcome.
    pub fn handle(&self) -> RoomHandle {
        match self {
            Joined::Seated { handle, .. } | Joined::AlreadySeated { handle } => *handle,
        }
    }

    /// True if state changed.
    pub fn is_new_seat(&self) -> bool {
        matches!(self, Joined::Seated { .. })
    }
}

/// Matchmaker and owner of every room in the session.
#[derive(Clone, Debug)]
pub struct RoomAllocator {
    width: usize,
    seed: Vec<u8>,
    rooms: Vec<Room>,
    memberships: BTreeMap<Identity, RoomHandle>,
}

impl RoomAllocator {
    /// Create an allocator for `width × width` boards.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            seed: Vec::new(),
            rooms: Vec::new(),
            memberships: BTreeMap::new(),
        }
    }

    /// Set the seed used to derive ids of rooms created from now on.
    pub fn set_seed(&mut self, seed: &[u8]) {
        self.seed = seed.to_vec();
    }

    /// Board width for new rooms.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Seat `identity` in the open room, opening a fresh one if needed.
    ///
    /// A player already seated in the most recent room is left alone while
    /// that room is unfinished; the call is a no-op. Anyone else (newcomers,
    /// players from an older room, players whose room has finished) takes
    /// the next free seat, and their membership moves with them. Rooms they
    /// leave behind are abandoned as they are.
    pub fn join(&mut self, identity: Identity) -> Joined {
        if let Some(handle) = self.memberships.get(&identity).copied() {
            if Some(handle) == self.current() && !self.rooms[handle.0].is_finished() {
                debug!("{} already seated in room {}", identity.short(), self.rooms[handle.0].id());
                return Joined::AlreadySeated { handle };
            }
        }

        let handle = match self.open_room() {
            Some(handle) => handle,
            None => self.create_room(),
        };

        let room = &mut self.rooms[handle.0];
        match room.seat(identity.clone()) {
            Some(color) => {
                info!("{} joined room {} as {:?}", identity.short(), room.id(), color);
                if let Some(previous) = self.memberships.insert(identity, handle) {
                    if previous != handle {
                        debug!("Room #{} superseded for this player", previous.ordinal());
                    }
                }
                Joined::Seated { handle, color }
            }
            // Only reachable if the open room already holds this identity,
            // which the membership check above rules out.
            None => Joined::AlreadySeated { handle },
        }
    }

    /// Room currently accepting players.
    pub fn open_room(&self) -> Option<RoomHandle> {
        match self.rooms.last() {
            Some(room) if !room.is_full() => Some(RoomHandle(self.rooms.len() - 1)),
            _ => None,
        }
    }

    /// Most recently created room.
    pub fn current(&self) -> Option<RoomHandle> {
        self.rooms.len().checked_sub(1).map(RoomHandle)
    }

    /// Room a player belongs to.
    pub fn room_of(&self, identity: &Identity) -> Option<RoomHandle> {
        self.memberships.get(identity).copied()
    }

    /// Borrow a room.
    pub fn room(&self, handle: RoomHandle) -> Option<&Room> {
        self.rooms.get(handle.0)
    }

    /// Borrow a room mutably.
    pub(crate) fn room_mut(&mut self, handle: RoomHandle) -> Option<&mut Room> {
        self.rooms.get_mut(handle.0)
    }

    /// All rooms in creation order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    fn create_room(&mut self) -> RoomHandle {
        let ordinal = self.rooms.len();
        let id = derive_room_id(&self.seed, ordinal as u64);
        self.rooms.push(Room::new(id, self.width));
        info!("Created room {} (#{})", id, ordinal);
        RoomHandle(ordinal)
    }
}
