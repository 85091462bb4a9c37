//! Game session state.
//!
//! A [`GameSession`] is an owned value: the Turn Controller takes one by
//! reference and hands back a new one, so there is never an ambient
//! "current game" to mutate.

use serde::{Deserialize, Serialize};

use super::board::{active_colors, Color, TOKENS_PER_COLOR};
use super::token::{TokenLocation, TokenSet};
use super::turn::TurnError;

/// Turn state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Active color must roll
    #[default]
    AwaitingRoll,
    /// Active color rolled and must pick one of several movable tokens
    AwaitingSelection,
    /// Every color is ranked
    GameOver,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingRoll => "awaiting_roll",
            Self::AwaitingSelection => "awaiting_selection",
            Self::GameOver => "game_over",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver)
    }
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub color: Color,
    pub name: String,
}

impl PlayerSlot {
    pub fn new(color: Color, name: impl Into<String>) -> Self {
        Self {
            color,
            name: name.into(),
        }
    }
}

/// Full state of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    /// Seat order; position in this list is the rotation order
    players: Vec<PlayerSlot>,

    /// `tokens[i]` belongs to `players[i]`
    tokens: Vec<TokenSet>,

    /// Seat index of the color whose turn it is
    pub current_turn_index: usize,

    /// Most recent die value, cleared when the turn passes
    pub last_roll: Option<u8>,

    /// Token ordinals the active color may move with `last_roll`
    pub movable: Vec<u8>,

    /// Colors in the order they finished
    pub ranking: Vec<Color>,

    /// Colors whose peer left mid-game
    pub departed: Vec<Color>,

    pub phase: TurnPhase,
}

impl GameSession {
    /// Seat players by name. Colors come from the seating table.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self, TurnError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let colors =
            active_colors(names.len()).ok_or(TurnError::InvalidPlayerCount(names.len()))?;

        let players = colors
            .iter()
            .zip(names)
            .map(|(color, name)| PlayerSlot::new(*color, name))
            .collect();

        Ok(Self::with_players(players))
    }

    /// Build a session from already seated players, all tokens at home.
    pub(crate) fn with_players(players: Vec<PlayerSlot>) -> Self {
        let tokens = vec![[TokenLocation::AtHome; TOKENS_PER_COLOR]; players.len()];
        Self {
            players,
            tokens,
            current_turn_index: 0,
            last_roll: None,
            movable: Vec::new(),
            ranking: Vec::new(),
            departed: Vec::new(),
            phase: TurnPhase::AwaitingRoll,
        }
    }

    pub fn players(&self) -> &[PlayerSlot] {
        &self.players
    }

    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.players.iter().map(|p| p.color)
    }

    pub fn color_count(&self) -> usize {
        self.players.len()
    }

    /// Seat index of a color, if it is active.
    pub fn seat_of(&self, color: Color) -> Option<usize> {
        self.players.iter().position(|p| p.color == color)
    }

    pub fn color_at(&self, seat: usize) -> Option<Color> {
        self.players.get(seat).map(|p| p.color)
    }

    pub fn current_color(&self) -> Option<Color> {
        self.color_at(self.current_turn_index)
    }

    pub fn current_player(&self) -> Option<&PlayerSlot> {
        self.players.get(self.current_turn_index)
    }

    pub fn is_color_turn(&self, color: Color) -> bool {
        !self.is_over() && self.current_color() == Some(color)
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn tokens(&self, color: Color) -> Option<&TokenSet> {
        self.seat_of(color).map(|seat| &self.tokens[seat])
    }

    pub(crate) fn tokens_mut(&mut self, color: Color) -> Option<&mut TokenSet> {
        let seat = self.seat_of(color)?;
        Some(&mut self.tokens[seat])
    }

    /// Token arrays for every seat, in seat order.
    pub fn token_arrays(&self) -> &[TokenSet] {
        &self.tokens
    }

    /// Overwrite all token arrays. Caller checks the shape.
    pub(crate) fn set_token_arrays(&mut self, tokens: Vec<TokenSet>) {
        self.tokens = tokens;
    }

    pub fn token(&self, color: Color, ordinal: u8) -> Option<TokenLocation> {
        self.tokens(color)?.get(ordinal as usize).copied()
    }

    pub fn all_finished(&self, color: Color) -> bool {
        self.tokens(color)
            .is_some_and(|set| set.iter().all(TokenLocation::is_finished))
    }

    pub fn is_ranked(&self, color: Color) -> bool {
        self.ranking.contains(&color)
    }

    pub fn has_departed(&self, color: Color) -> bool {
        self.departed.contains(&color)
    }

    /// Still taking turns: neither ranked nor departed.
    pub fn is_playing(&self, color: Color) -> bool {
        !self.is_ranked(color) && !self.has_departed(color)
    }

    pub fn playing_count(&self) -> usize {
        self.colors().filter(|c| self.is_playing(*c)).count()
    }

    /// Convert full session state to a JSON snapshot for display.
    pub fn to_json(&self) -> serde_json::Value {
        let players: Vec<serde_json::Value> = self
            .players
            .iter()
            .zip(&self.tokens)
            .map(|(p, tokens)| {
                serde_json::json!({
                    "color": p.color.as_str(),
                    "name": p.name,
                    "tokens": tokens,
                    "departed": self.has_departed(p.color)
                })
            })
            .collect();

        serde_json::json!({
            "players": players,
            "current_turn": self.current_color().map(|c| c.as_str()),
            "current_turn_index": self.current_turn_index,
            "last_roll": self.last_roll,
            "movable": self.movable,
            "ranking": self.ranking,
            "phase": self.phase.as_str()
        })
    }
}
