//! The hosting peer.
//!
//! The host owns the only [`GameSession`] that is ever derived. Its own
//! player's input arrives through [`HostSession::host_roll`] and
//! [`HostSession::host_move`], bound to the host's seat; guest input
//! arrives as frames and is checked against the seat the sending peer
//! actually holds, never the color it claims.
//!
//! Every message of one committed transition reaches every guest before
//! any peer that failed a delivery is dropped, so a departure never
//! overtakes the snapshots it follows.

use tracing::instrument;

use super::link::{Links, PeerId, Transport};
use super::protocol::SyncMessage;
use super::room::{Room, RoomError, RoomMember};
use super::SyncError;
use crate::config::HostConfig;
use crate::engine::{Color, Dice, GameSession, Transition, TurnError};

#[derive(Debug)]
pub struct HostSession<T> {
    room: Room,
    links: Links<T>,
    dice: Dice,
    session: Option<GameSession>,
    relay_guest_frames: bool,
}

impl<T: Transport> HostSession<T> {
    /// Host `room`, opening a link to every guest already in it.
    pub fn new(room: Room, transport: T, config: &HostConfig) -> Self {
        let mut links = Links::new(transport);
        for guest in room.guest_ids() {
            links.open(guest);
        }
        let dice = config.dice_seed.map(Dice::new).unwrap_or_else(Dice::from_entropy);

        Self {
            room,
            links,
            dice,
            session: None,
            relay_guest_frames: config.relay_guest_frames,
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn links(&self) -> &Links<T> {
        &self.links
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.links.transport_mut()
    }

    /// The host player's own color once the game is seated.
    pub fn host_color(&self) -> Option<Color> {
        self.room.color_of(self.room.host_id)
    }

    /// Seat a guest that joined through the room directory.
    pub fn add_guest(&mut self, member: RoomMember) -> Result<(), SyncError> {
        let peer = member.peer_id;
        self.room.add_member(member)?;
        self.links.open(peer);
        tracing::info!(%peer, "Guest joined");
        Ok(())
    }

    /// A guest left the lobby on purpose.
    pub fn remove_guest(&mut self, peer: PeerId) -> Result<Vec<SyncMessage>, SyncError> {
        if self.session.is_some() {
            return self.peer_lost(peer);
        }
        self.room.remove_member(peer)?;
        self.links.remove(peer);
        tracing::info!(%peer, "Guest left");
        Ok(Vec::new())
    }

    /// Leave the lobby and seat everyone.
    #[instrument(skip(self), fields(room = %self.room.code))]
    pub fn start_game(&mut self) -> Result<Vec<SyncMessage>, SyncError> {
        let players = self.room.start_game(self.room.host_id)?;
        let session = GameSession::with_players(players);
        let start = SyncMessage::game_start(&session);
        self.session = Some(session);

        tracing::info!(players = self.room.member_count(), "Game started");
        Ok(self.publish(vec![start]))
    }

    /// Roll for the host's own seat.
    pub fn host_roll(&mut self) -> Result<Vec<SyncMessage>, SyncError> {
        let color = self.seated_host()?;
        self.roll_for(color)
    }

    /// Move one of the host's own tokens with the pending roll.
    pub fn host_move(&mut self, token: u8) -> Result<Vec<SyncMessage>, SyncError> {
        let color = self.seated_host()?;
        self.move_for(color, token)
    }

    /// Go back to the lobby, telling every guest why.
    #[instrument(skip(self), fields(room = %self.room.code))]
    pub fn restart(&mut self, message: &str) -> Result<Vec<SyncMessage>, SyncError> {
        self.room.end_game()?;
        self.session = None;
        tracing::info!("Game restarted");

        Ok(self.publish(vec![SyncMessage::RestartGame {
            message: message.to_string(),
        }]))
    }

    /// Handle a frame from a guest. Requests are relayed to the other
    /// guests, then run through the engine; a rejected one is answered
    /// with a `rejected` notice to the sender only. Snapshot kinds only
    /// the host may send are dropped without relaying.
    #[instrument(skip(self, frame))]
    pub fn handle_frame(&mut self, from: PeerId, frame: &str) -> Result<Vec<SyncMessage>, SyncError> {
        let Some(message) = self.links.receive(from, frame)? else {
            return Ok(Vec::new());
        };
        tracing::debug!(kind = message.kind(), "Frame from guest");

        if !message.is_request() {
            tracing::warn!(kind = message.kind(), "Ignoring snapshot sent by a guest");
            return Ok(Vec::new());
        }

        let mut sent = Vec::new();
        if self.relay_guest_frames {
            let failed = self.links.broadcast_except(Some(from), &message);
            sent.extend(self.drop_lost(failed));
        }

        let result = match message {
            SyncMessage::RollRequest { color } => self
                .check_seat(from, color)
                .and_then(|color| self.roll_for(color)),
            SyncMessage::MoveRequest { color, token } => self
                .check_seat(from, color)
                .and_then(|color| self.move_for(color, token)),
            _ => Ok(Vec::new()),
        };

        if let Err(SyncError::Turn(e)) = &result {
            tracing::warn!(%from, error = %e, "Rejected guest request");
            let notice = SyncMessage::Rejected { reason: e.notice() };
            if let Err(e) = self.links.send(from, &notice) {
                tracing::warn!(%from, error = %e, "Could not deliver rejection");
                self.peer_lost(from)?;
                return Err(RoomError::PeerUnreachable(from).into());
            }
        }
        sent.extend(result?);
        Ok(sent)
    }

    /// The transport reports a peer gone for good. Its color is frozen and
    /// the game carries on without it.
    #[instrument(skip(self))]
    pub fn peer_lost(&mut self, peer: PeerId) -> Result<Vec<SyncMessage>, SyncError> {
        self.links.lose(peer);
        self.room.set_connected(peer, false)?;
        tracing::warn!("Peer lost");

        let Some(session) = self.session.as_ref() else {
            return Ok(Vec::new());
        };
        let Some(color) = self.room.color_of(peer) else {
            return Ok(Vec::new());
        };
        let transition = session.depart(color)?;
        Ok(self.commit(transition))
    }

    fn seated_host(&self) -> Result<Color, SyncError> {
        if self.session.is_none() {
            return Err(SyncError::NoGame);
        }
        self.host_color().ok_or(SyncError::NoGame)
    }

    #[instrument(skip(self))]
    fn roll_for(&mut self, color: Color) -> Result<Vec<SyncMessage>, SyncError> {
        let session = self.session.as_ref().ok_or(SyncError::NoGame)?;
        // sample only once the action is known to be acceptable
        if !session.is_color_turn(color) {
            return Err(not_your_turn(session, color).into());
        }
        let value = self.dice.roll();
        let transition = session.roll(color, value)?;
        Ok(self.commit(transition))
    }

    #[instrument(skip(self))]
    fn move_for(&mut self, color: Color, token: u8) -> Result<Vec<SyncMessage>, SyncError> {
        let session = self.session.as_ref().ok_or(SyncError::NoGame)?;
        let transition = session.select(color, token)?;
        Ok(self.commit(transition))
    }

    /// Map the sender to its seat. A claim to play another seat is refused.
    fn check_seat(&self, from: PeerId, claimed: Color) -> Result<Color, SyncError> {
        let session = self.session.as_ref().ok_or(SyncError::NoGame)?;
        match self.room.color_of(from) {
            Some(seat) if seat == claimed => Ok(seat),
            _ => Err(not_your_turn(session, claimed).into()),
        }
    }

    /// Store the new session and broadcast every resulting snapshot.
    fn commit(&mut self, transition: Transition) -> Vec<SyncMessage> {
        let Transition { session, events } = transition;
        self.session = Some(session);

        let messages = events.iter().filter_map(SyncMessage::from_event).collect();
        self.publish(messages)
    }

    /// Send a batch to every guest in order. Peers whose delivery failed
    /// are dropped only after the whole batch is out; any transitions that
    /// causes are published after it and returned with it.
    fn publish(&mut self, messages: Vec<SyncMessage>) -> Vec<SyncMessage> {
        let mut failed = Vec::new();
        for message in &messages {
            tracing::debug!(kind = message.kind(), "Broadcast");
            for peer in self.links.broadcast_except(None, message) {
                if !failed.contains(&peer) {
                    failed.push(peer);
                }
            }
        }

        let mut sent = messages;
        sent.extend(self.drop_lost(failed));
        sent
    }

    fn drop_lost(&mut self, peers: Vec<PeerId>) -> Vec<SyncMessage> {
        let mut sent = Vec::new();
        for peer in peers {
            match self.peer_lost(peer) {
                Ok(more) => sent.extend(more),
                Err(e) => tracing::warn!(%peer, error = %e, "Could not drop lost peer"),
            }
        }
        sent
    }
}

fn not_your_turn(session: &GameSession, color: Color) -> TurnError {
    if session.is_over() {
        TurnError::GameOver
    } else {
        TurnError::NotYourTurn { color }
    }
}
