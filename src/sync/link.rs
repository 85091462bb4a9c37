//! Peer link tracking.
//!
//! One [`PeerLink`] per peer pair carries a single ordered stream of
//! [`Envelope`]s. The receiver accepts exactly the next sequence number,
//! drops replays, and treats a gap as fatal. Nothing is buffered or
//! reordered.
//!
//! The raw transport is a black box behind [`Transport`]: it only has to
//! deliver a text frame to a peer.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::protocol::{Envelope, SyncMessage};

/// Transport-level identity of a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

impl From<u64> for PeerId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Link status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    /// The transport reported the peer gone. There is no way back.
    Lost,
}

impl LinkStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Peer {0} is unreachable")]
    Unreachable(PeerId),
    #[error("No link to peer {0}")]
    UnknownPeer(PeerId),
    #[error("Link to peer {0} was lost")]
    Lost(PeerId),
    #[error("Frame {got} from peer {peer} arrived out of order, expected {expected}")]
    OutOfOrder { peer: PeerId, expected: u64, got: u64 },
    #[error("Bad frame from peer {peer}: {source}")]
    Codec {
        peer: PeerId,
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered stream state for one peer.
#[derive(Debug, Clone)]
pub struct PeerLink {
    pub peer_id: PeerId,

    pub status: LinkStatus,

    /// Sequence number of the last frame sent
    pub send_seq: u64,

    /// Sequence number of the last frame accepted
    pub recv_seq: u64,
}

impl PeerLink {
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            status: LinkStatus::Connected,
            send_seq: 0,
            recv_seq: 0,
        }
    }

    /// Stamp the next outgoing message.
    pub fn stamp(&mut self, message: SyncMessage) -> Envelope {
        self.send_seq += 1;
        Envelope {
            seq: self.send_seq,
            message,
        }
    }

    /// Accept an incoming envelope. `Ok(None)` means a replay was dropped.
    pub fn accept(&mut self, envelope: Envelope) -> Result<Option<SyncMessage>, LinkError> {
        if !self.status.is_connected() {
            return Err(LinkError::Lost(self.peer_id));
        }

        let expected = self.recv_seq + 1;
        if envelope.seq < expected {
            tracing::warn!(peer = %self.peer_id, seq = envelope.seq, "Dropping replayed frame");
            return Ok(None);
        }
        if envelope.seq > expected {
            return Err(LinkError::OutOfOrder {
                peer: self.peer_id,
                expected,
                got: envelope.seq,
            });
        }

        self.recv_seq = envelope.seq;
        Ok(Some(envelope.message))
    }

    pub fn lose(&mut self) {
        self.status = LinkStatus::Lost;
    }
}

/// Delivers text frames to peers. Connection setup, NAT traversal and
/// retransmission live on the other side of this trait.
pub trait Transport {
    fn deliver(&mut self, to: PeerId, frame: String) -> Result<(), LinkError>;
}

/// In-process transport that queues frames for the caller to hand over.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    outbox: VecDeque<(PeerId, String)>,
    unreachable: Vec<PeerId>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make further deliveries to `peer` fail.
    pub fn cut(&mut self, peer: PeerId) {
        if !self.unreachable.contains(&peer) {
            self.unreachable.push(peer);
        }
    }

    /// Take every queued frame in send order.
    pub fn drain(&mut self) -> Vec<(PeerId, String)> {
        self.outbox.drain(..).collect()
    }

    /// Take queued frames addressed to one peer, keeping the rest.
    pub fn drain_for(&mut self, peer: PeerId) -> Vec<String> {
        let mut taken = Vec::new();
        self.outbox.retain(|(to, frame)| {
            if *to == peer {
                taken.push(frame.clone());
                false
            } else {
                true
            }
        });
        taken
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }
}

impl Transport for MemoryTransport {
    fn deliver(&mut self, to: PeerId, frame: String) -> Result<(), LinkError> {
        if self.unreachable.contains(&to) {
            return Err(LinkError::Unreachable(to));
        }
        self.outbox.push_back((to, frame));
        Ok(())
    }
}

/// All links a peer holds, plus the transport they share.
#[derive(Debug)]
pub struct Links<T> {
    links: HashMap<PeerId, PeerLink>,
    transport: T,
}

impl<T: Transport> Links<T> {
    pub fn new(transport: T) -> Self {
        Self {
            links: HashMap::new(),
            transport,
        }
    }

    /// Open a link. Reopening an existing link is a no-op.
    pub fn open(&mut self, peer: PeerId) {
        self.links
            .entry(peer)
            .or_insert_with(|| PeerLink::new(peer));
    }

    pub fn get(&self, peer: PeerId) -> Option<&PeerLink> {
        self.links.get(&peer)
    }

    pub fn remove(&mut self, peer: PeerId) -> Option<PeerLink> {
        self.links.remove(&peer)
    }

    pub fn lose(&mut self, peer: PeerId) {
        if let Some(link) = self.links.get_mut(&peer) {
            link.lose();
        }
    }

    pub fn is_connected(&self, peer: PeerId) -> bool {
        self.links
            .get(&peer)
            .is_some_and(|l| l.status.is_connected())
    }

    /// Connected peers, ascending.
    pub fn connected_peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .links
            .values()
            .filter(|l| l.status.is_connected())
            .map(|l| l.peer_id)
            .collect();
        peers.sort();
        peers
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Point-to-point send. A failed delivery marks the link lost.
    pub fn send(&mut self, to: PeerId, message: &SyncMessage) -> Result<(), LinkError> {
        let link = self.links.get_mut(&to).ok_or(LinkError::UnknownPeer(to))?;
        if !link.status.is_connected() {
            return Err(LinkError::Lost(to));
        }

        let frame = link
            .stamp(message.clone())
            .encode()
            .map_err(|source| LinkError::Codec { peer: to, source })?;

        if let Err(e) = self.transport.deliver(to, frame) {
            link.lose();
            return Err(e);
        }
        Ok(())
    }

    /// Send to every connected peer except `except`. Returns the peers
    /// whose delivery failed; the rest still receive the message.
    pub fn broadcast_except(&mut self, except: Option<PeerId>, message: &SyncMessage) -> Vec<PeerId> {
        let mut failed = Vec::new();
        for peer in self.connected_peers() {
            if Some(peer) == except {
                continue;
            }
            if let Err(e) = self.send(peer, message) {
                tracing::warn!(%peer, error = %e, "Broadcast delivery failed");
                failed.push(peer);
            }
        }
        failed
    }

    /// Decode a frame from `from` and run it through that link's ordering.
    pub fn receive(&mut self, from: PeerId, frame: &str) -> Result<Option<SyncMessage>, LinkError> {
        let link = self
            .links
            .get_mut(&from)
            .ok_or(LinkError::UnknownPeer(from))?;
        let envelope =
            Envelope::decode(frame).map_err(|source| LinkError::Codec { peer: from, source })?;
        link.accept(envelope)
    }
}
