//! Sync protocol messages.
//!
//! Host snapshots are total: each one carries everything a guest needs to
//! overwrite its mirror for that step, so replaying a message is harmless.
//!
//! Wire form is JSON with a kebab-case `type` tag and camelCase fields:
//!
//! ```text
//! {"type":"next-turn","nextPlayerIndex":2}
//! {"type":"dice-roll","roll":6,"playerIndex":0,"movable":[0,1,2,3]}
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::{Color, GameSession, TokenSet, TurnEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SyncMessage {
    /// Lobby to playing. Colors follow from the seating table.
    #[serde(rename_all = "camelCase")]
    GameStart {
        players: Vec<String>,
        tokens: Vec<TokenSet>,
    },

    #[serde(rename_all = "camelCase")]
    DiceRoll {
        roll: u8,
        player_index: usize,
        movable: Vec<u8>,
    },

    #[serde(rename_all = "camelCase")]
    TokenMove {
        token: u8,
        roll: u8,
        tokens: Vec<TokenSet>,
        player_index: usize,
        finished: bool,
        captured: bool,
    },

    #[serde(rename_all = "camelCase")]
    NextTurn { next_player_index: usize },

    #[serde(rename_all = "camelCase")]
    GameOver { ranking: Vec<Color> },

    #[serde(rename_all = "camelCase")]
    RestartGame { message: String },

    /// Guest asks the host to roll. Advisory only.
    #[serde(rename_all = "camelCase")]
    RollRequest { color: Color },

    /// Guest asks the host to move a token. Advisory only.
    #[serde(rename_all = "camelCase")]
    MoveRequest { color: Color, token: u8 },

    /// Host tells one guest its request was refused.
    #[serde(rename_all = "camelCase")]
    Rejected { reason: String },
}

impl SyncMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameStart { .. } => "game-start",
            Self::DiceRoll { .. } => "dice-roll",
            Self::TokenMove { .. } => "token-move",
            Self::NextTurn { .. } => "next-turn",
            Self::GameOver { .. } => "game-over",
            Self::RestartGame { .. } => "restart-game",
            Self::RollRequest { .. } => "roll-request",
            Self::MoveRequest { .. } => "move-request",
            Self::Rejected { .. } => "rejected",
        }
    }

    /// Guest-originated requests, as opposed to host snapshots.
    pub fn is_request(&self) -> bool {
        matches!(self, Self::RollRequest { .. } | Self::MoveRequest { .. })
    }

    /// Snapshot announcing a freshly seated session.
    pub fn game_start(session: &GameSession) -> Self {
        Self::GameStart {
            players: session.players().iter().map(|p| p.name.clone()).collect(),
            tokens: session.token_arrays().to_vec(),
        }
    }

    /// Wire message for a committed turn event. Events with no wire
    /// counterpart of their own return `None`.
    pub fn from_event(event: &TurnEvent) -> Option<Self> {
        match event {
            TurnEvent::Rolled {
                color_index,
                roll,
                movable,
            } => Some(Self::DiceRoll {
                roll: *roll,
                player_index: *color_index,
                movable: movable.clone(),
            }),
            TurnEvent::Moved {
                color_index,
                token,
                roll,
                tokens,
                finished,
                captures,
            } => Some(Self::TokenMove {
                token: *token,
                roll: *roll,
                tokens: tokens.clone(),
                player_index: *color_index,
                finished: *finished,
                captured: !captures.is_empty(),
            }),
            TurnEvent::NextTurn { color_index, .. } => Some(Self::NextTurn {
                next_player_index: *color_index,
            }),
            TurnEvent::GameOver { ranking } => Some(Self::GameOver {
                ranking: ranking.clone(),
            }),
            TurnEvent::ColorFinished { .. } | TurnEvent::Departed { .. } => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// A message stamped with its per-link sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    #[serde(flatten)]
    pub message: SyncMessage,
}

impl Envelope {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}
