//! Host-authoritative synchronization.
//!
//! - `protocol` - Wire messages and sequenced envelopes
//! - `link` - Ordered per-peer links over a black-box transport
//! - `room` - Rooms, rosters, room codes
//! - `host` - The authoritative peer: runs the engine and relays
//! - `guest` - Mirrors the host's snapshots
//!
//! # Topology
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            │            Host              │
//!            │  Room ─ GameSession ─ Dice   │
//!            └───▲──────────▲──────────▲────┘
//!     requests   │          │          │   snapshots
//!                ▼          ▼          ▼
//!            ┌───────┐  ┌───────┐  ┌───────┐
//!            │ Guest │  │ Guest │  │ Guest │   (mirror only)
//!            └───────┘  └───────┘  └───────┘
//! ```
//!
//! Guests never talk to each other. Every frame a guest sends goes to the
//! host, which relays it verbatim to the other guests and, for requests,
//! runs the engine and broadcasts the committed snapshots.

pub mod guest;
pub mod host;
pub mod link;
pub mod protocol;
pub mod room;

use thiserror::Error;

use crate::engine::TurnError;

pub use guest::{GuestMirror, GuestSession, MalformedSnapshot, MirrorUpdate};
pub use host::HostSession;
pub use link::{LinkError, LinkStatus, Links, MemoryTransport, PeerId, PeerLink, Transport};
pub use protocol::{Envelope, SyncMessage};
pub use room::{LeaveOutcome, Room, RoomError, RoomManager, RoomMember, RoomPhase, MAX_ROOM_PLAYERS};

/// Anything that can go wrong while hosting or mirroring a game.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Rule violation; nothing changed
    #[error(transparent)]
    Turn(#[from] TurnError),
    /// Room lifecycle problem
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error(transparent)]
    Link(#[from] LinkError),
    /// The mirror was discarded; the player must rejoin
    #[error("Lost sync with host: {0}")]
    Malformed(#[from] MalformedSnapshot),
    #[error("No game is running")]
    NoGame,
}
