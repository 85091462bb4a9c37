//! Move resolution.
//!
//! Computes which tokens may move for a roll and the session that results
//! from moving one of them, including captures. Legality and application
//! share [`TokenLocation::destination`], so a move is applied exactly when
//! it was reported legal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{is_safe_cell, Color};
use super::session::GameSession;
use super::token::TokenLocation;

/// A token sent back home by a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub color: Color,
    pub token: u8,
    pub cell: u8,
}

/// What a single applied move did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub color: Color,
    pub token: u8,
    pub roll: u8,
    pub from: TokenLocation,
    pub to: TokenLocation,
    pub captures: Vec<Capture>,
}

impl MoveOutcome {
    pub fn captured(&self) -> bool {
        !self.captures.is_empty()
    }

    /// The moved token reached the goal with this move.
    pub fn finished(&self) -> bool {
        self.to.is_finished()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Color {0} is not seated in this game")]
    UnknownColor(Color),
    #[error("Token {0} does not exist")]
    UnknownToken(u8),
    #[error("Token {token} cannot move {roll}")]
    IllegalMove { token: u8, roll: u8 },
}

/// Ordinals of the tokens `color` may move with `roll`, ascending.
///
/// Empty when the color is not seated, has nothing out of home without a
/// six, or every remaining token would overshoot.
pub fn legal_moves(session: &GameSession, color: Color, roll: u8) -> Vec<u8> {
    let Some(tokens) = session.tokens(color) else {
        return Vec::new();
    };

    tokens
        .iter()
        .enumerate()
        .filter(|(_, location)| location.destination(roll).is_some())
        .map(|(ordinal, _)| ordinal as u8)
        .collect()
}

/// Move one token and resolve captures, returning the updated session.
pub fn apply_move(
    session: &GameSession,
    color: Color,
    token: u8,
    roll: u8,
) -> Result<(GameSession, MoveOutcome), MoveError> {
    let from = session
        .tokens(color)
        .ok_or(MoveError::UnknownColor(color))?
        .get(token as usize)
        .copied()
        .ok_or(MoveError::UnknownToken(token))?;

    let to = from
        .destination(roll)
        .ok_or(MoveError::IllegalMove { token, roll })?;

    let mut next = session.clone();
    if let Some(set) = next.tokens_mut(color) {
        set[token as usize] = to;
    }

    let captures = match to.absolute_cell(color) {
        Some(cell) => capture_at(&mut next, color, cell),
        None => Vec::new(),
    };

    let outcome = MoveOutcome {
        color,
        token,
        roll,
        from,
        to,
        captures,
    };
    Ok((next, outcome))
}

/// Send every opposing token on `cell` back home. Safe cells protect
/// everyone, and a mover never captures its own color.
fn capture_at(session: &mut GameSession, mover: Color, cell: u8) -> Vec<Capture> {
    if is_safe_cell(cell) {
        return Vec::new();
    }

    let opponents: Vec<Color> = session.colors().filter(|c| *c != mover).collect();
    let mut captures = Vec::new();

    for color in opponents {
        let Some(set) = session.tokens_mut(color) else {
            continue;
        };
        for (ordinal, location) in set.iter_mut().enumerate() {
            if location.absolute_cell(color) == Some(cell) {
                *location = TokenLocation::AtHome;
                captures.push(Capture {
                    color,
                    token: ordinal as u8,
                    cell,
                });
            }
        }
    }

    captures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::{absolute_cell, STRETCH_ENTRY_STEP};
    use pretty_assertions::assert_eq;

    fn four_players() -> GameSession {
        GameSession::new(["B", "R", "G", "Y"]).unwrap()
    }

    fn place(session: &mut GameSession, color: Color, token: u8, location: TokenLocation) {
        session.tokens_mut(color).unwrap()[token as usize] = location;
    }

    /// Relative step for `color` that sits on absolute `cell`.
    fn step_on(color: Color, cell: u8) -> u8 {
        (cell + 52 - color.start_offset()) % 52
    }

    #[test]
    fn test_home_tokens_need_six() {
        let session = GameSession::new(["Blue", "Green"]).unwrap();
        assert!(legal_moves(&session, Color::Blue, 5).is_empty());
        assert_eq!(legal_moves(&session, Color::Blue, 6), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_release_from_home() {
        let session = GameSession::new(["Blue", "Green"]).unwrap();
        let (next, outcome) = apply_move(&session, Color::Blue, 0, 6).unwrap();
        assert_eq!(
            next.token(Color::Blue, 0),
            Some(TokenLocation::OnMainPath { step: 0 })
        );
        assert!(!outcome.captured());
        assert!(!outcome.finished());
    }

    #[test]
    fn test_inactive_color_has_no_moves() {
        let session = GameSession::new(["Blue", "Green"]).unwrap();
        assert!(legal_moves(&session, Color::Red, 6).is_empty());
        assert_eq!(
            apply_move(&session, Color::Red, 0, 6).unwrap_err(),
            MoveError::UnknownColor(Color::Red)
        );
    }

    #[test]
    fn test_overshoot_is_illegal_everywhere() {
        let mut session = GameSession::new(["Blue", "Green"]).unwrap();
        for ordinal in 0..4 {
            place(&mut session, Color::Blue, ordinal, TokenLocation::Finished);
        }
        place(&mut session, Color::Blue, 3, TokenLocation::OnHomeStretch { index: 3 });

        assert_eq!(legal_moves(&session, Color::Blue, 2), vec![3]);
        assert!(legal_moves(&session, Color::Blue, 3).is_empty());
        assert_eq!(
            apply_move(&session, Color::Blue, 3, 3).unwrap_err(),
            MoveError::IllegalMove { token: 3, roll: 3 }
        );

        let (next, outcome) = apply_move(&session, Color::Blue, 3, 2).unwrap();
        assert!(outcome.finished());
        assert!(next.all_finished(Color::Blue));
    }

    #[test]
    fn test_out_of_range_roll_moves_nothing() {
        let mut session = GameSession::new(["Blue", "Green"]).unwrap();
        place(&mut session, Color::Blue, 0, TokenLocation::OnHomeStretch { index: 4 });
        place(&mut session, Color::Blue, 1, TokenLocation::OnMainPath { step: 20 });

        assert!(legal_moves(&session, Color::Blue, 252).is_empty());
        assert!(legal_moves(&session, Color::Blue, 0).is_empty());
        assert_eq!(
            apply_move(&session, Color::Blue, 0, 252).unwrap_err(),
            MoveError::IllegalMove { token: 0, roll: 252 }
        );
    }

    #[test]
    fn test_enter_home_stretch() {
        let mut session = GameSession::new(["Blue", "Green"]).unwrap();
        place(
            &mut session,
            Color::Green,
            1,
            TokenLocation::OnMainPath { step: STRETCH_ENTRY_STEP - 1 },
        );

        let (next, _) = apply_move(&session, Color::Green, 1, 3).unwrap();
        assert_eq!(
            next.token(Color::Green, 1),
            Some(TokenLocation::OnHomeStretch { index: 2 })
        );
    }

    #[test]
    fn test_capture_unprotected_token() {
        let mut session = four_players();
        let cell = 30;
        assert!(!is_safe_cell(cell));

        place(&mut session, Color::Yellow, 2, TokenLocation::OnMainPath { step: step_on(Color::Yellow, cell) });
        let red_step = step_on(Color::Red, cell) - 4;
        place(&mut session, Color::Red, 0, TokenLocation::OnMainPath { step: red_step });

        let (next, outcome) = apply_move(&session, Color::Red, 0, 4).unwrap();
        assert_eq!(next.token(Color::Yellow, 2), Some(TokenLocation::AtHome));
        assert_eq!(
            next.token(Color::Red, 0).and_then(|t| t.absolute_cell(Color::Red)),
            Some(cell)
        );
        assert_eq!(
            outcome.captures,
            vec![Capture { color: Color::Yellow, token: 2, cell }]
        );
    }

    #[test]
    fn test_capture_hits_every_opponent_on_cell() {
        let mut session = four_players();
        let cell = 30;
        place(&mut session, Color::Yellow, 0, TokenLocation::OnMainPath { step: step_on(Color::Yellow, cell) });
        place(&mut session, Color::Yellow, 1, TokenLocation::OnMainPath { step: step_on(Color::Yellow, cell) });
        place(&mut session, Color::Blue, 3, TokenLocation::OnMainPath { step: step_on(Color::Blue, cell) });
        place(&mut session, Color::Red, 0, TokenLocation::OnMainPath { step: step_on(Color::Red, cell) - 2 });

        let (next, outcome) = apply_move(&session, Color::Red, 0, 2).unwrap();
        assert_eq!(outcome.captures.len(), 3);
        assert_eq!(next.token(Color::Yellow, 0), Some(TokenLocation::AtHome));
        assert_eq!(next.token(Color::Yellow, 1), Some(TokenLocation::AtHome));
        assert_eq!(next.token(Color::Blue, 3), Some(TokenLocation::AtHome));
    }

    #[test]
    fn test_same_color_is_never_captured() {
        let mut session = four_players();
        let cell = 30;
        place(&mut session, Color::Red, 1, TokenLocation::OnMainPath { step: step_on(Color::Red, cell) });
        place(&mut session, Color::Red, 0, TokenLocation::OnMainPath { step: step_on(Color::Red, cell) - 1 });

        let (next, outcome) = apply_move(&session, Color::Red, 0, 1).unwrap();
        assert!(!outcome.captured());
        assert_eq!(next.token(Color::Red, 1), session.token(Color::Red, 1));
    }

    #[test]
    fn test_safe_cell_is_shared() {
        let mut session = four_players();
        let cell = 21;
        assert!(is_safe_cell(cell));
        place(&mut session, Color::Green, 0, TokenLocation::OnMainPath { step: step_on(Color::Green, cell) });
        place(&mut session, Color::Red, 0, TokenLocation::OnMainPath { step: step_on(Color::Red, cell) - 3 });

        let (next, outcome) = apply_move(&session, Color::Red, 0, 3).unwrap();
        assert!(!outcome.captured());
        assert_eq!(next.token(Color::Green, 0), session.token(Color::Green, 0));
    }

    #[test]
    fn test_release_onto_occupied_start_cell_captures_nothing() {
        let mut session = four_players();
        let start = Color::Red.start_offset();
        place(&mut session, Color::Blue, 0, TokenLocation::OnMainPath { step: start });
        assert_eq!(absolute_cell(Color::Blue, start), start);

        let (next, outcome) = apply_move(&session, Color::Red, 0, 6).unwrap();
        assert!(!outcome.captured());
        assert_eq!(next.token(Color::Blue, 0), Some(TokenLocation::OnMainPath { step: start }));
    }

    #[test]
    fn test_tokens_in_stretch_are_out_of_reach() {
        let mut session = four_players();
        // blue stretch index 0 would map past blue's entry cell; it has no shared cell
        place(&mut session, Color::Blue, 0, TokenLocation::OnHomeStretch { index: 0 });
        place(&mut session, Color::Red, 0, TokenLocation::OnMainPath { step: step_on(Color::Red, 51) - 1 });

        let (next, outcome) = apply_move(&session, Color::Red, 0, 1).unwrap();
        assert!(!outcome.captured());
        assert_eq!(next.token(Color::Blue, 0), Some(TokenLocation::OnHomeStretch { index: 0 }));
    }
}
