//! # Channels
//!
//! The sync core talks to two independent, best-effort streams: the world
//! channel (cells) and the roster channel (participants). Both are reached
//! through the [`Channel`] trait so the core never depends on a concrete
//! transport.
//!
//! ## Key Components
//! - `Channel`: send side of a connection plus its lifecycle state
//! - `ChannelEvent`: what a transport reports back to the event loop
//! - `LoopbackChannel`: in-memory channel that records sent messages
//! - `WebSocketChannel`: native WebSocket transport with an I/O worker thread
//!
//! ## Threading
//! Transports may do I/O on other threads, but they never touch replicas.
//! Inbound traffic is forwarded as [`ChannelEvent`]s over a single
//! `std::sync::mpsc` queue that only the event loop consumes, which keeps all
//! replica mutation on one logical thread.

use std::fmt;

use crate::core::error::SyncResult;

pub mod loopback;
pub mod websocket;

pub use loopback::LoopbackChannel;
pub use websocket::WebSocketChannel;

/// Which of the two streams a channel carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Cell additions/removals and world snapshots.
    World,
    /// Registration, local moves and roster snapshots.
    Roster,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::World => write!(f, "world"),
            ChannelKind::Roster => write!(f, "roster"),
        }
    }
}

/// Connection lifecycle of a channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelState {
    /// A connection attempt is in flight.
    Connecting,
    /// Sends are accepted.
    Open,
    /// Closed by either side or never connected.
    Closed,
}

/// Notifications a transport delivers to the event loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The connection is established.
    Opened(ChannelKind),
    /// One line of inbound text.
    Message(ChannelKind, String),
    /// The connection ended.
    Closed(ChannelKind),
}

/// The send side of one stream.
pub trait Channel {
    /// Current lifecycle state.
    fn state(&self) -> ChannelState;

    /// Whether sends are currently accepted.
    fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Queues one message for delivery without blocking.
    ///
    /// Fails with [`crate::core::SyncError::ChannelUnavailable`] unless the
    /// channel is open. Success means "handed to the transport", not
    /// "delivered".
    fn send_text(&self, text: String) -> SyncResult<()>;

    /// Starts a fresh connection attempt after the channel closed.
    fn reconnect(&mut self);

    /// Closes the connection. Further sends fail.
    fn close(&mut self);
}
