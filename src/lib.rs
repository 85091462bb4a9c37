//! Ludo with host-authoritative peer sync.
//!
//! # Overview
//!
//! - **Rules engine** (`engine`) - Board geometry, legal moves, captures,
//!   the turn state machine and final ranking. Pure: every command takes a
//!   session by reference and returns the next one, or an error with the
//!   original untouched.
//!
//! - **Sync** (`sync`) - One peer hosts. It owns the only authoritative
//!   session and rolls the die. Guests send requests, the host validates
//!   them against the sender's seat and broadcasts snapshots that guests
//!   apply verbatim.
//!
//! - **Rooms** (`sync::room`) - Lobby rosters, seat order and room codes.
//!
//! - **Config** (`config`) - Host settings loaded from JSON.
//!
//! # Design Principles
//!
//! 1. **One writer** - Only the host derives state; mirrors never run rules.
//!
//! 2. **Rejected means unchanged** - A failed command never alters state.
//!
//! 3. **No I/O** - Transports are a trait; an in-memory one ships for tests.
//!
//! # Example
//!
//! ```rust
//! use ludo_sync::engine::{Color, GameSession, TurnPhase};
//!
//! let mut game = GameSession::new(["Ana", "Ben"]).unwrap();
//! assert_eq!(game.current_color(), Some(Color::Blue));
//!
//! // Nothing can leave home on a 3, so the turn passes at once
//! game.roll_mut(Color::Blue, 3).unwrap();
//! assert_eq!(game.current_color(), Some(Color::Green));
//! assert_eq!(game.phase, TurnPhase::AwaitingRoll);
//!
//! // Out of turn is refused and changes nothing
//! assert!(game.roll_mut(Color::Blue, 6).is_err());
//! assert_eq!(game.current_color(), Some(Color::Green));
//! ```

pub mod config;
pub mod engine;
pub mod sync;

pub use config::HostConfig;
pub use engine::{Color, GameSession, TokenLocation, TurnError, TurnEvent, TurnPhase};
pub use sync::{GuestSession, HostSession, SyncError, SyncMessage};
