//! Room state management.
//!
//! A room is the roster of peers playing together. The creating peer is
//! the host and holds the authoritative game; everyone else is a guest.
//! Seat order is join order, and seats map to colors through the fixed
//! seating table.

use std::collections::HashMap;

use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;

use super::link::PeerId;
use crate::config::HostConfig;
use crate::engine::{active_colors, Color, PlayerSlot, MAX_COLORS};

/// Maximum peers per room.
pub const MAX_ROOM_PLAYERS: usize = MAX_COLORS;

/// Minimum peers needed to start a game.
pub const MIN_ROOM_PLAYERS: usize = 2;

/// Default length of a shareable room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Room phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomPhase {
    /// Gathering players
    #[default]
    Lobby,
    /// A game is running
    Playing,
}

impl RoomPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
        }
    }
}

/// A peer's entry in a room roster.
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub peer_id: PeerId,

    /// Display name, unique within the room
    pub name: String,

    pub is_host: bool,

    /// Whether the peer's link is still up
    pub is_connected: bool,

    /// When the peer joined this room
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl RoomMember {
    pub fn new(peer_id: PeerId, name: impl Into<String>) -> Self {
        Self {
            peer_id,
            name: name.into(),
            is_host: false,
            is_connected: true,
            joined_at: chrono::Utc::now(),
        }
    }
}

/// Room errors. These describe the room lifecycle and are kept apart from
/// rule errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room {0} not found")]
    RoomNotFound(String),
    #[error("Room is full")]
    Full,
    #[error("Already a member of this room")]
    AlreadyMember,
    #[error("Name {0} is already taken in this room")]
    NameTaken(String),
    #[error("Not a member of this room")]
    NotMember,
    #[error("Only the host can do that")]
    NotHost,
    #[error("A game is in progress")]
    GameInProgress,
    #[error("No game is in progress")]
    NoGame,
    #[error("Need 2 to 4 players to start, have {0}")]
    NotEnoughPlayers(usize),
    #[error("Peer {0} is unreachable")]
    PeerUnreachable(PeerId),
    #[error("Room was closed by the host")]
    Closed,
}

/// Room state.
#[derive(Debug, Clone)]
pub struct Room {
    /// Shareable code
    pub code: String,

    /// Members in seat order
    members: Vec<RoomMember>,

    pub host_id: PeerId,

    pub max_players: usize,

    pub phase: RoomPhase,

    /// When room was created
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Room {
    /// Create a room with `host` as its first member.
    pub fn new(code: impl Into<String>, mut host: RoomMember) -> Self {
        host.is_host = true;
        Self {
            code: code.into().to_uppercase(),
            host_id: host.peer_id,
            members: vec![host],
            max_players: MAX_ROOM_PLAYERS,
            phase: RoomPhase::Lobby,
            created_at: chrono::Utc::now(),
        }
    }

    /// Add a guest.
    pub fn add_member(&mut self, mut member: RoomMember) -> Result<(), RoomError> {
        if self.phase == RoomPhase::Playing {
            return Err(RoomError::GameInProgress);
        }
        if self.is_full() {
            return Err(RoomError::Full);
        }
        if self.has_member(member.peer_id) {
            return Err(RoomError::AlreadyMember);
        }
        if self.members.iter().any(|m| m.name == member.name) {
            return Err(RoomError::NameTaken(member.name));
        }

        member.is_host = false;
        self.members.push(member);
        Ok(())
    }

    /// Remove a member. The host cannot be removed; closing the room is
    /// the caller's job.
    pub fn remove_member(&mut self, peer_id: PeerId) -> Result<RoomMember, RoomError> {
        if peer_id == self.host_id {
            return Err(RoomError::Closed);
        }
        let index = self
            .members
            .iter()
            .position(|m| m.peer_id == peer_id)
            .ok_or(RoomError::NotMember)?;
        Ok(self.members.remove(index))
    }

    pub fn get_member(&self, peer_id: PeerId) -> Option<&RoomMember> {
        self.members.iter().find(|m| m.peer_id == peer_id)
    }

    pub fn has_member(&self, peer_id: PeerId) -> bool {
        self.get_member(peer_id).is_some()
    }

    pub fn is_host(&self, peer_id: PeerId) -> bool {
        self.host_id == peer_id
    }

    /// Set member connection state.
    pub fn set_connected(&mut self, peer_id: PeerId, connected: bool) -> Result<(), RoomError> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.peer_id == peer_id)
            .ok_or(RoomError::NotMember)?;
        member.is_connected = connected;
        Ok(())
    }

    /// Members in seat order.
    pub fn members(&self) -> &[RoomMember] {
        &self.members
    }

    pub fn guest_ids(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.members
            .iter()
            .filter(|m| !m.is_host)
            .map(|m| m.peer_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn connected_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_connected).count()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_players
    }

    /// Color for each seat, in seat order. Empty if the roster cannot be seated.
    pub fn seat_colors(&self) -> Vec<(PeerId, Color)> {
        active_colors(self.members.len())
            .map(|colors| {
                self.members
                    .iter()
                    .zip(colors)
                    .map(|(m, c)| (m.peer_id, *c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Color seated for a peer.
    pub fn color_of(&self, peer_id: PeerId) -> Option<Color> {
        self.seat_colors()
            .into_iter()
            .find(|(p, _)| *p == peer_id)
            .map(|(_, c)| c)
    }

    /// Move from lobby to playing and return the seated players.
    pub fn start_game(&mut self, by: PeerId) -> Result<Vec<PlayerSlot>, RoomError> {
        if !self.is_host(by) {
            return Err(RoomError::NotHost);
        }
        if self.phase == RoomPhase::Playing {
            return Err(RoomError::GameInProgress);
        }
        let count = self.members.len();
        if count < MIN_ROOM_PLAYERS {
            return Err(RoomError::NotEnoughPlayers(count));
        }
        let colors = active_colors(count).ok_or(RoomError::NotEnoughPlayers(count))?;

        self.phase = RoomPhase::Playing;
        Ok(self
            .members
            .iter()
            .zip(colors)
            .map(|(m, c)| PlayerSlot::new(*c, m.name.clone()))
            .collect())
    }

    /// Back to the lobby.
    pub fn end_game(&mut self) -> Result<(), RoomError> {
        if self.phase != RoomPhase::Playing {
            return Err(RoomError::NoGame);
        }
        self.phase = RoomPhase::Lobby;
        Ok(())
    }

    /// Convert to JSON for the UI.
    pub fn to_json(&self) -> serde_json::Value {
        let seats = self.seat_colors();
        let members: Vec<serde_json::Value> = self
            .members
            .iter()
            .map(|m| {
                let color = seats
                    .iter()
                    .find(|(p, _)| *p == m.peer_id)
                    .map(|(_, c)| c.as_str());
                serde_json::json!({
                    "peer_id": m.peer_id.0,
                    "name": m.name,
                    "is_host": m.is_host,
                    "is_connected": m.is_connected,
                    "color": color
                })
            })
            .collect();

        serde_json::json!({
            "room_code": self.code,
            "players": members,
            "host_id": self.host_id.0,
            "max_players": self.max_players,
            "phase": self.phase.as_str()
        })
    }
}

/// What happened when a peer left.
#[derive(Debug, Clone)]
pub enum LeaveOutcome {
    /// A guest left; the room stays open
    Left { code: String, member: RoomMember },
    /// The host left and the room is gone
    Closed { room: Room },
}

/// Directory of open rooms, consulted when a peer asks to join by code.
#[derive(Debug, Default)]
pub struct RoomManager {
    /// Rooms by code
    rooms: HashMap<String, Room>,

    /// Peer to room code
    peer_index: HashMap<PeerId, String>,

    code_len: usize,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::with_code_len(ROOM_CODE_LEN)
    }

    /// Directory issuing codes of the configured length.
    pub fn from_config(config: &HostConfig) -> Self {
        Self::with_code_len(config.room_code_len)
    }

    pub fn with_code_len(code_len: usize) -> Self {
        Self {
            code_len: code_len.max(1),
            ..Default::default()
        }
    }

    /// Open a room hosted by `host`. The code is derived from the host's
    /// transport connection id; a random suffix replaces the tail while it
    /// collides with an open room.
    pub fn create_room(&mut self, host: RoomMember, connection_id: &str) -> Result<&Room, RoomError> {
        if self.peer_index.contains_key(&host.peer_id) {
            return Err(RoomError::AlreadyMember);
        }

        let code = self.issue_code(connection_id);
        let host_id = host.peer_id;
        tracing::info!(%code, host = %host_id, "Room opened");

        self.peer_index.insert(host_id, code.clone());
        Ok(self.rooms.entry(code.clone()).or_insert_with(|| Room::new(code, host)))
    }

    fn issue_code(&self, connection_id: &str) -> String {
        let cleaned: Vec<char> = connection_id
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let tail_start = cleaned.len().saturating_sub(self.code_len);
        let mut code: String = cleaned[tail_start..].iter().collect();

        let mut rng = rand::thread_rng();
        while code.len() < self.code_len {
            code.push(rng.sample(Alphanumeric).to_ascii_uppercase() as char);
        }

        // Codes only need to be unique among open rooms.
        let keep = self.code_len / 2;
        while self.rooms.contains_key(&code) {
            let suffix: String = (keep..self.code_len)
                .map(|_| rng.sample(Alphanumeric).to_ascii_uppercase() as char)
                .collect();
            code.truncate(keep);
            code.push_str(&suffix);
        }
        code
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(&code.to_uppercase())
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(&code.to_uppercase())
    }

    pub fn get_for_peer(&self, peer_id: PeerId) -> Option<&Room> {
        self.peer_index
            .get(&peer_id)
            .and_then(|code| self.rooms.get(code))
    }

    /// Join a room by code (case-insensitive).
    pub fn join(&mut self, code: &str, member: RoomMember) -> Result<&Room, RoomError> {
        if self.peer_index.contains_key(&member.peer_id) {
            return Err(RoomError::AlreadyMember);
        }

        let code = code.to_uppercase();
        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        let peer_id = member.peer_id;
        room.add_member(member)?;
        tracing::info!(%code, peer = %peer_id, "Peer joined room");

        self.peer_index.insert(peer_id, code);
        Ok(room)
    }

    /// Take a peer out of its room. A departing host closes the room.
    pub fn leave(&mut self, peer_id: PeerId) -> Result<LeaveOutcome, RoomError> {
        let code = self.peer_index.get(&peer_id).cloned().ok_or(RoomError::NotMember)?;
        let room = self.rooms.get_mut(&code).ok_or(RoomError::NotMember)?;

        if room.is_host(peer_id) {
            let room = self.remove(&code).ok_or(RoomError::NotMember)?;
            return Ok(LeaveOutcome::Closed { room });
        }

        let member = room.remove_member(peer_id)?;
        self.peer_index.remove(&peer_id);
        tracing::info!(%code, peer = %peer_id, "Peer left room");
        Ok(LeaveOutcome::Left { code, member })
    }

    /// Remove a room entirely.
    pub fn remove(&mut self, code: &str) -> Option<Room> {
        let room = self.rooms.remove(&code.to_uppercase())?;
        for member in room.members() {
            self.peer_index.remove(&member.peer_id);
        }
        tracing::info!(code = %room.code, "Room closed");
        Some(room)
    }

    /// Remove rooms where nobody is connected any more.
    pub fn cleanup_abandoned(&mut self) -> Vec<String> {
        let abandoned: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, r)| r.connected_count() == 0)
            .map(|(code, _)| code.clone())
            .collect();

        for code in &abandoned {
            self.remove(code);
        }

        abandoned
    }

    pub fn count(&self) -> usize {
        self.rooms.len()
    }
}
