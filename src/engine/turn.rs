//! Turn controller.
//!
//! # State Diagram
//!
//! ```text
//!              roll: no legal move ──────────────┐
//!              roll: one legal move ──apply──┐   │
//! ┌──────────────┐                          │   │
//! │ AwaitingRoll │── roll: several ──▶┌───────────────────┐
//! └──────────────┘                    │ AwaitingSelection │
//!     ▲     ▲                         └─────────┬─────────┘
//!     │     │ six or finished token             │ select: apply
//!     │     └────────── same color ◀────────────┤
//!     └──────────────── next color ◀────────────┤
//!                                               ▼
//!                                          ┌──────────┐
//!                                          │ GameOver │
//!                                          └──────────┘
//! ```
//!
//! Every command takes the current [`GameSession`] by reference and
//! returns a [`Transition`] holding the committed session and the events
//! it produced. A rejected command changes nothing.

use thiserror::Error;

use super::board::{Color, DIE_FACES, RELEASE_ROLL};
use super::moves::{apply_move, legal_moves, Capture, MoveError};
use super::session::{GameSession, TurnPhase};
use super::token::TokenSet;

/// Something the Turn Controller committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// The active color rolled; `movable` may be empty
    Rolled {
        color_index: usize,
        roll: u8,
        movable: Vec<u8>,
    },
    /// A token moved; `tokens` is every seat's array after the move
    Moved {
        color_index: usize,
        token: u8,
        roll: u8,
        tokens: Vec<TokenSet>,
        finished: bool,
        captures: Vec<Capture>,
    },
    /// A color has all of its tokens home
    ColorFinished { color: Color },
    /// A color's peer left and the color is frozen
    Departed { color: Color },
    /// The next roll belongs to `color_index`; `bonus` when it did not change
    NextTurn { color_index: usize, bonus: bool },
    GameOver { ranking: Vec<Color> },
}

/// A committed step: the new session plus what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: GameSession,
    pub events: Vec<TurnEvent>,
}

/// Turn errors. None of these change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("It's not your turn")]
    NotYourTurn { color: Color },
    #[error("Token {token} cannot be moved now")]
    IllegalMove { token: u8 },
    #[error("Expected {expected}, not this action")]
    UnexpectedAction { expected: &'static str },
    #[error("Die roll {0} is out of range")]
    InvalidRoll(u8),
    #[error("The game is over")]
    GameOver,
    #[error("Color {0} is not seated in this game")]
    UnknownColor(Color),
    #[error("A game needs 2 to 4 players, not {0}")]
    InvalidPlayerCount(usize),
}

impl TurnError {
    /// Short message suitable for showing the player who sent the action.
    pub fn notice(&self) -> String {
        self.to_string()
    }
}

impl From<MoveError> for TurnError {
    fn from(e: MoveError) -> Self {
        match e {
            MoveError::UnknownColor(color) => Self::UnknownColor(color),
            MoveError::UnknownToken(token) | MoveError::IllegalMove { token, .. } => {
                Self::IllegalMove { token }
            }
        }
    }
}

impl GameSession {
    /// Roll for `color` with a die value sampled by the caller.
    ///
    /// With no legal move the turn passes at once; with exactly one it is
    /// applied at once; otherwise the session waits for [`select`](Self::select).
    pub fn roll(&self, color: Color, value: u8) -> Result<Transition, TurnError> {
        self.check_turn(color)?;
        if self.phase != TurnPhase::AwaitingRoll {
            return Err(TurnError::UnexpectedAction {
                expected: "a token selection",
            });
        }
        if !(1..=DIE_FACES).contains(&value) {
            return Err(TurnError::InvalidRoll(value));
        }

        let mut next = self.clone();
        let mut events = Vec::new();
        let movable = legal_moves(&next, color, value);

        next.last_roll = Some(value);
        next.movable = movable.clone();
        events.push(TurnEvent::Rolled {
            color_index: next.current_turn_index,
            roll: value,
            movable: movable.clone(),
        });
        tracing::debug!(%color, roll = value, ?movable, "Rolled");

        match movable.as_slice() {
            [] => next.pass_turn(&mut events),
            [only] => next.commit_move(color, *only, value, &mut events)?,
            _ => next.phase = TurnPhase::AwaitingSelection,
        }

        Ok(Transition {
            session: next,
            events,
        })
    }

    /// Move the chosen token with the pending roll.
    pub fn select(&self, color: Color, token: u8) -> Result<Transition, TurnError> {
        self.check_turn(color)?;
        if self.phase != TurnPhase::AwaitingSelection {
            return Err(TurnError::UnexpectedAction { expected: "a roll" });
        }
        let roll = self.last_roll.ok_or(TurnError::UnexpectedAction { expected: "a roll" })?;
        if !self.movable.contains(&token) {
            return Err(TurnError::IllegalMove { token });
        }

        let mut next = self.clone();
        let mut events = Vec::new();
        next.commit_move(color, token, roll, &mut events)?;

        Ok(Transition {
            session: next,
            events,
        })
    }

    /// Freeze a color whose peer left. Its tokens stay on the board.
    pub fn depart(&self, color: Color) -> Result<Transition, TurnError> {
        if self.seat_of(color).is_none() {
            return Err(TurnError::UnknownColor(color));
        }

        let mut next = self.clone();
        let mut events = Vec::new();
        if next.is_over() || !next.is_playing(color) {
            return Ok(Transition {
                session: next,
                events,
            });
        }

        next.departed.push(color);
        events.push(TurnEvent::Departed { color });
        tracing::info!(%color, "Color departed");

        if next.finish_if_decided(&mut events) {
            return Ok(Transition {
                session: next,
                events,
            });
        }
        if next.current_color() == Some(color) {
            next.pass_turn(&mut events);
        }

        Ok(Transition {
            session: next,
            events,
        })
    }

    /// In-place [`roll`](Self::roll). On error `self` is untouched.
    pub fn roll_mut(&mut self, color: Color, value: u8) -> Result<Vec<TurnEvent>, TurnError> {
        let Transition { session, events } = self.roll(color, value)?;
        *self = session;
        Ok(events)
    }

    /// In-place [`select`](Self::select). On error `self` is untouched.
    pub fn select_mut(&mut self, color: Color, token: u8) -> Result<Vec<TurnEvent>, TurnError> {
        let Transition { session, events } = self.select(color, token)?;
        *self = session;
        Ok(events)
    }

    fn check_turn(&self, color: Color) -> Result<(), TurnError> {
        if self.is_over() {
            return Err(TurnError::GameOver);
        }
        if self.seat_of(color).is_none() {
            return Err(TurnError::UnknownColor(color));
        }
        if self.current_color() != Some(color) {
            return Err(TurnError::NotYourTurn { color });
        }
        Ok(())
    }

    fn commit_move(
        &mut self,
        color: Color,
        token: u8,
        roll: u8,
        events: &mut Vec<TurnEvent>,
    ) -> Result<(), TurnError> {
        let (moved, outcome) = apply_move(self, color, token, roll)?;
        *self = moved;

        let finished = outcome.finished();
        tracing::debug!(
            %color,
            token,
            roll,
            finished,
            captures = outcome.captures.len(),
            "Token moved"
        );
        events.push(TurnEvent::Moved {
            color_index: self.current_turn_index,
            token,
            roll,
            tokens: self.token_arrays().to_vec(),
            finished,
            captures: outcome.captures,
        });

        if self.all_finished(color) && !self.is_ranked(color) {
            self.ranking.push(color);
            events.push(TurnEvent::ColorFinished { color });
            tracing::info!(%color, place = self.ranking.len(), "Color finished");
        }

        if self.finish_if_decided(events) {
            return Ok(());
        }

        if (roll == RELEASE_ROLL || finished) && self.is_playing(color) {
            self.phase = TurnPhase::AwaitingRoll;
            self.last_roll = None;
            self.movable.clear();
            events.push(TurnEvent::NextTurn {
                color_index: self.current_turn_index,
                bonus: true,
            });
        } else {
            self.pass_turn(events);
        }

        Ok(())
    }

    /// Hand the roll to the next playing color in seat order.
    fn pass_turn(&mut self, events: &mut Vec<TurnEvent>) {
        let count = self.color_count();
        let next = (1..=count)
            .map(|offset| (self.current_turn_index + offset) % count)
            .find(|seat| self.color_at(*seat).is_some_and(|c| self.is_playing(c)))
            .unwrap_or(self.current_turn_index);

        self.current_turn_index = next;
        self.phase = TurnPhase::AwaitingRoll;
        self.last_roll = None;
        self.movable.clear();
        events.push(TurnEvent::NextTurn {
            color_index: next,
            bonus: false,
        });
    }

    /// End the game once at most one color is still playing.
    fn finish_if_decided(&mut self, events: &mut Vec<TurnEvent>) -> bool {
        if self.playing_count() > 1 {
            return false;
        }

        let seated: Vec<Color> = self.colors().collect();
        if let Some(last) = seated.iter().find(|c| self.is_playing(**c)) {
            self.ranking.push(*last);
        }
        for color in seated {
            if self.has_departed(color) && !self.is_ranked(color) {
                self.ranking.push(color);
            }
        }

        self.phase = TurnPhase::GameOver;
        self.movable.clear();
        events.push(TurnEvent::GameOver {
            ranking: self.ranking.clone(),
        });
        tracing::info!(ranking = ?self.ranking, "Game over");
        true
    }
}
