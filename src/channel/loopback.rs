//! In-memory [`Channel`] that records every accepted message.
//!
//! Clones share state, so a harness can hand one clone to the sync core and
//! keep another to open/close the channel and inspect what was sent.

use super::{Channel, ChannelKind, ChannelState};
use crate::core::{
    error::{SyncError, SyncResult},
    StResource,
};

/// A [`Channel`] backed by shared in-memory state.
#[derive(Clone)]
pub struct LoopbackChannel {
    kind: ChannelKind,
    state: StResource<ChannelState>,
    sent: StResource<Vec<String>>,
}

impl LoopbackChannel {
    /// Creates a channel in the `Connecting` state.
    pub fn new(kind: ChannelKind) -> Self {
        LoopbackChannel {
            kind,
            state: StResource::new(ChannelState::Connecting),
            sent: StResource::default(),
        }
    }

    /// Marks the channel open so sends are accepted.
    pub fn open(&self) {
        *self.state.get_mut() = ChannelState::Open;
    }

    /// Forces a lifecycle state.
    pub fn set_state(&self, state: ChannelState) {
        *self.state.get_mut() = state;
    }

    /// Copies of every message accepted so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.get().clone()
    }

    /// Drains the sent log.
    pub fn take_sent(&self) -> Vec<String> {
        self.sent.take()
    }
}

impl Channel for LoopbackChannel {
    fn state(&self) -> ChannelState {
        *self.state.get()
    }

    fn send_text(&self, text: String) -> SyncResult<()> {
        if !self.is_open() {
            return Err(SyncError::ChannelUnavailable { channel: self.kind });
        }
        self.sent.get_mut().push(text);
        Ok(())
    }

    fn reconnect(&mut self) {
        self.set_state(ChannelState::Connecting);
    }

    fn close(&mut self) {
        self.set_state(ChannelState::Closed);
    }
}
