//! Guest-side mirror of the host's game.
//!
//! Guests never run the rules. Each host snapshot overwrites the matching
//! part of the local [`GameSession`] verbatim, so after every message the
//! mirror equals the host's state for that step, and applying the same
//! snapshot twice changes nothing.

use thiserror::Error;

use super::link::{LinkError, Links, PeerId, Transport};
use super::protocol::SyncMessage;
use super::SyncError;
use crate::engine::{
    active_colors, Color, GameSession, PlayerSlot, TokenSet, TurnPhase, DIE_FACES, TOKENS_PER_COLOR,
};

/// A host snapshot the mirror cannot apply. The mirror has no way to
/// repair a divergent state, so it drops its session; the player has to
/// rejoin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSnapshot {
    #[error("{0} arrived with no game running")]
    NoSession(&'static str),
    #[error("A game cannot seat {0} players")]
    PlayerCount(usize),
    #[error("Unknown player index {0}")]
    PlayerIndex(usize),
    #[error("Unknown token ordinal {0}")]
    TokenOrdinal(u8),
    #[error("Die roll {0} is out of range")]
    Roll(u8),
    #[error("Expected {expected} token arrays, got {got}")]
    TokenArrays { expected: usize, got: usize },
    #[error("Token location out of range")]
    TokenLocation,
    #[error("Ranking does not list every seated color once")]
    Ranking,
}

/// What applying a message did to the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorUpdate {
    /// The session changed (or was re-confirmed)
    Synced,
    /// Host went back to the lobby
    Restarted { message: String },
    /// Host refused one of our requests
    Rejected { reason: String },
    /// Not state: another guest's request relayed to us
    Ignored,
}

/// Local copy of the host's session.
#[derive(Debug, Clone, Default)]
pub struct GuestMirror {
    session: Option<GameSession>,
}

impl GuestMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the session after an unrecoverable desync.
    pub fn discard(&mut self) {
        self.session = None;
    }

    /// Apply one host message. A malformed snapshot discards the session.
    pub fn apply(&mut self, message: &SyncMessage) -> Result<MirrorUpdate, MalformedSnapshot> {
        match self.apply_inner(message) {
            Ok(update) => Ok(update),
            Err(e) => {
                tracing::warn!(kind = message.kind(), error = %e, "Discarding mirrored session");
                self.session = None;
                Err(e)
            }
        }
    }

    fn apply_inner(&mut self, message: &SyncMessage) -> Result<MirrorUpdate, MalformedSnapshot> {
        match message {
            SyncMessage::GameStart { players, tokens } => {
                let colors = active_colors(players.len())
                    .ok_or(MalformedSnapshot::PlayerCount(players.len()))?;
                let slots = colors
                    .iter()
                    .zip(players)
                    .map(|(c, name)| PlayerSlot::new(*c, name.clone()))
                    .collect();

                let mut session = GameSession::with_players(slots);
                check_token_arrays(&session, tokens)?;
                session.set_token_arrays(tokens.clone());
                self.session = Some(session);
            }

            SyncMessage::DiceRoll {
                roll,
                player_index,
                movable,
            } => {
                let session = self.current("dice-roll")?;
                check_player_index(session, *player_index)?;
                if !(1..=DIE_FACES).contains(roll) {
                    return Err(MalformedSnapshot::Roll(*roll));
                }
                if let Some(bad) = movable.iter().find(|t| **t as usize >= TOKENS_PER_COLOR) {
                    return Err(MalformedSnapshot::TokenOrdinal(*bad));
                }

                session.current_turn_index = *player_index;
                session.last_roll = Some(*roll);
                session.movable = movable.clone();
                session.phase = if movable.len() > 1 {
                    TurnPhase::AwaitingSelection
                } else {
                    TurnPhase::AwaitingRoll
                };
            }

            SyncMessage::TokenMove {
                token,
                roll,
                tokens,
                player_index,
                ..
            } => {
                let session = self.current("token-move")?;
                check_player_index(session, *player_index)?;
                if *token as usize >= TOKENS_PER_COLOR {
                    return Err(MalformedSnapshot::TokenOrdinal(*token));
                }
                check_token_arrays(session, tokens)?;

                session.set_token_arrays(tokens.clone());
                session.current_turn_index = *player_index;
                session.last_roll = Some(*roll);
                session.movable.clear();
                session.phase = TurnPhase::AwaitingRoll;
            }

            SyncMessage::NextTurn { next_player_index } => {
                let session = self.current("next-turn")?;
                check_player_index(session, *next_player_index)?;

                session.current_turn_index = *next_player_index;
                session.last_roll = None;
                session.movable.clear();
                session.phase = TurnPhase::AwaitingRoll;
            }

            SyncMessage::GameOver { ranking } => {
                let session = self.current("game-over")?;
                check_ranking(session, ranking)?;

                session.ranking = ranking.clone();
                session.movable.clear();
                session.phase = TurnPhase::GameOver;
            }

            SyncMessage::RestartGame { message } => {
                self.session = None;
                return Ok(MirrorUpdate::Restarted {
                    message: message.clone(),
                });
            }

            SyncMessage::Rejected { reason } => {
                return Ok(MirrorUpdate::Rejected {
                    reason: reason.clone(),
                });
            }

            SyncMessage::RollRequest { .. } | SyncMessage::MoveRequest { .. } => {
                return Ok(MirrorUpdate::Ignored);
            }
        }

        Ok(MirrorUpdate::Synced)
    }

    fn current(&mut self, kind: &'static str) -> Result<&mut GameSession, MalformedSnapshot> {
        self.session
            .as_mut()
            .ok_or(MalformedSnapshot::NoSession(kind))
    }
}

fn check_player_index(session: &GameSession, index: usize) -> Result<(), MalformedSnapshot> {
    if index < session.color_count() {
        Ok(())
    } else {
        Err(MalformedSnapshot::PlayerIndex(index))
    }
}

fn check_token_arrays(session: &GameSession, tokens: &[TokenSet]) -> Result<(), MalformedSnapshot> {
    if tokens.len() != session.color_count() {
        return Err(MalformedSnapshot::TokenArrays {
            expected: session.color_count(),
            got: tokens.len(),
        });
    }
    if !tokens.iter().flatten().all(|t| t.is_well_formed()) {
        return Err(MalformedSnapshot::TokenLocation);
    }
    Ok(())
}

fn check_ranking(session: &GameSession, ranking: &[Color]) -> Result<(), MalformedSnapshot> {
    let complete = ranking.len() == session.color_count()
        && session.colors().all(|c| ranking.iter().filter(|r| **r == c).count() == 1);
    if complete {
        Ok(())
    } else {
        Err(MalformedSnapshot::Ranking)
    }
}

/// A guest peer: one ordered link to the host plus the mirror.
#[derive(Debug)]
pub struct GuestSession<T> {
    pub peer_id: PeerId,
    pub name: String,
    host_id: PeerId,
    links: Links<T>,
    mirror: GuestMirror,
}

impl<T: Transport> GuestSession<T> {
    pub fn new(peer_id: PeerId, name: impl Into<String>, host_id: PeerId, transport: T) -> Self {
        let mut links = Links::new(transport);
        links.open(host_id);
        Self {
            peer_id,
            name: name.into(),
            host_id,
            links,
            mirror: GuestMirror::new(),
        }
    }

    pub fn mirror(&self) -> &GuestMirror {
        &self.mirror
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.mirror.session()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.links.transport_mut()
    }

    /// Our color, found by matching our name against the seated players.
    pub fn color(&self) -> Option<Color> {
        self.session()?
            .players()
            .iter()
            .find(|p| p.name == self.name)
            .map(|p| p.color)
    }

    /// Ask the host to roll for us.
    pub fn request_roll(&mut self) -> Result<(), SyncError> {
        let color = self.color().ok_or(SyncError::NoGame)?;
        self.send_to_host(SyncMessage::RollRequest { color })
    }

    /// Ask the host to move one of our tokens.
    pub fn request_move(&mut self, token: u8) -> Result<(), SyncError> {
        let color = self.color().ok_or(SyncError::NoGame)?;
        self.send_to_host(SyncMessage::MoveRequest { color, token })
    }

    fn send_to_host(&mut self, message: SyncMessage) -> Result<(), SyncError> {
        self.links.send(self.host_id, &message)?;
        Ok(())
    }

    /// Handle a frame from the host. A link or snapshot failure is fatal
    /// for this guest's game: the mirror is discarded and the error
    /// returned so the UI can ask the player to rejoin.
    pub fn handle_frame(&mut self, frame: &str) -> Result<MirrorUpdate, SyncError> {
        let message = match self.links.receive(self.host_id, frame) {
            Ok(Some(message)) => message,
            Ok(None) => return Ok(MirrorUpdate::Ignored),
            Err(e) => {
                self.mirror.discard();
                return Err(e.into());
            }
        };

        tracing::debug!(kind = message.kind(), "Applying host snapshot");
        Ok(self.mirror.apply(&message)?)
    }

    /// The transport reported the host gone. The game cannot continue.
    pub fn host_lost(&mut self) -> SyncError {
        self.links.lose(self.host_id);
        self.mirror.discard();
        tracing::warn!(host = %self.host_id, "Lost connection to host");
        SyncError::Link(LinkError::Lost(self.host_id))
    }
}
