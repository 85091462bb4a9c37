//! Ludo rules engine.
//!
//! - `board` - Static path geometry, safe cells, seating table
//! - `token` - Token locations and path walking
//! - `moves` - Legal moves, move application, captures
//! - `session` - The owned game state value
//! - `turn` - Turn state machine: rolls, selections, bonus turns, ranking
//! - `dice` - Seedable die for the host
//!
//! # Control Flow
//!
//! ```text
//!  roll(color, value) ──▶ check turn ──▶ legal_moves ──▶ 0: pass turn
//!                                                     ├─▶ 1: apply_move
//!                                                     └─▶ n: AwaitingSelection
//!  select(color, token) ──▶ check turn ──▶ apply_move ──▶ win check ──▶ bonus / next color
//! ```
//!
//! The engine is pure. It never touches the network and never rolls dice
//! itself, so the host and a local hot-seat game drive exactly the same code.

pub mod board;
pub mod dice;
pub mod moves;
pub mod session;
pub mod token;
pub mod turn;

pub use board::{
    absolute_cell, active_colors, is_safe_cell, Color, DIE_FACES, MAX_COLORS, PATH_LENGTH, STRETCH_LENGTH,
    TOKENS_PER_COLOR,
};
pub use dice::Dice;
pub use moves::{apply_move, legal_moves, Capture, MoveError, MoveOutcome};
pub use session::{GameSession, PlayerSlot, TurnPhase};
pub use token::{TokenLocation, TokenSet};
pub use turn::{Transition, TurnError, TurnEvent};
