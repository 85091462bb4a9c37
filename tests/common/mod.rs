//! In-memory table: one host and its guests on `MemoryTransport`s, with
//! frames pumped by hand.

#![allow(dead_code)]

use ludo_sync::config::HostConfig;
use ludo_sync::engine::{Color, GameSession, TokenSet, TurnPhase};
use ludo_sync::sync::{
    GuestSession, HostSession, MemoryTransport, MirrorUpdate, PeerId, Room, RoomMember, SyncError,
    SyncMessage,
};

pub const HOST: PeerId = PeerId(1);

/// Guest `i` has peer id `i + 2` and sits at seat `i + 1`.
pub struct Table {
    pub host: HostSession<MemoryTransport>,
    pub guests: Vec<GuestSession<MemoryTransport>>,
}

/// The part of a session every mirror must agree on.
pub type Projection = (Vec<TokenSet>, usize, TurnPhase, Option<u8>, Vec<u8>);

pub fn projection(session: &GameSession) -> Projection {
    (
        session.token_arrays().to_vec(),
        session.current_turn_index,
        session.phase,
        session.last_roll,
        session.movable.clone(),
    )
}

impl Table {
    pub fn new(players: usize, seed: u64) -> Self {
        let mut room = Room::new("TABLE1", RoomMember::new(HOST, "Host"));
        let mut guests = Vec::new();
        for i in 0..players - 1 {
            let peer = guest_peer(i);
            let name = format!("Guest{}", peer.0);
            room.add_member(RoomMember::new(peer, name.clone())).unwrap();
            guests.push(GuestSession::new(peer, name, HOST, MemoryTransport::new()));
        }

        let host = HostSession::new(room, MemoryTransport::new(), &HostConfig::default().with_seed(seed));
        Self { host, guests }
    }

    pub fn start(&mut self) -> Vec<SyncMessage> {
        let sent = self.host.start_game().unwrap();
        self.deliver();
        sent
    }

    pub fn session(&self) -> &GameSession {
        self.host.session().unwrap()
    }

    /// Hand every queued host frame to its guest. Returns each guest's
    /// updates in arrival order.
    pub fn deliver(&mut self) -> Vec<(PeerId, MirrorUpdate)> {
        let mut updates = Vec::new();
        for (peer, frame) in self.host.transport_mut().drain() {
            let guest = &mut self.guests[guest_index(peer)];
            updates.push((peer, guest.handle_frame(&frame).unwrap()));
        }
        updates
    }

    /// Hand every frame guest `i` queued to the host.
    pub fn pump_guest(&mut self, i: usize) -> Result<Vec<SyncMessage>, SyncError> {
        let mut sent = Vec::new();
        let frames = self.guests[i].transport_mut().drain();
        for (_, frame) in frames {
            sent.extend(self.host.handle_frame(guest_peer(i), &frame)?);
        }
        Ok(sent)
    }

    /// Roll for whoever holds the turn, through whichever peer owns the seat.
    pub fn roll_current(&mut self) -> Vec<SyncMessage> {
        let seat = self.session().current_turn_index;
        let sent = if seat == 0 {
            self.host.host_roll().unwrap()
        } else {
            self.guests[seat - 1].request_roll().unwrap();
            self.pump_guest(seat - 1).unwrap()
        };
        self.deliver();
        sent
    }

    /// Select the `pick`-th movable token for whoever holds the turn.
    pub fn select_current(&mut self, pick: usize) -> Vec<SyncMessage> {
        let session = self.session();
        let seat = session.current_turn_index;
        let token = session.movable[pick % session.movable.len()];
        let sent = if seat == 0 {
            self.host.host_move(token).unwrap()
        } else {
            self.guests[seat - 1].request_move(token).unwrap();
            self.pump_guest(seat - 1).unwrap()
        };
        self.deliver();
        sent
    }

    /// Every still-connected mirror against the host.
    pub fn assert_converged(&self) {
        let expected = projection(self.session());
        for guest in self.connected_guests() {
            let mirror = guest.session().expect("guest lost its mirror");
            assert_eq!(projection(mirror), expected, "guest {} diverged", guest.peer_id);
            if self.session().is_over() {
                assert_eq!(mirror.ranking, self.session().ranking);
            }
        }
    }

    pub fn connected_guests(&self) -> impl Iterator<Item = &GuestSession<MemoryTransport>> {
        self.guests
            .iter()
            .filter(|g| self.host.links().is_connected(g.peer_id))
    }

    pub fn color_of_guest(&self, i: usize) -> Color {
        self.guests[i].color().unwrap()
    }
}

pub fn guest_peer(i: usize) -> PeerId {
    PeerId(i as u64 + 2)
}

pub fn guest_index(peer: PeerId) -> usize {
    (peer.0 - 2) as usize
}
