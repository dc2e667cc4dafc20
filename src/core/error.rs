//! # Error Types
//!
//! Every fallible operation in the sync core returns a [`SyncError`]. None of
//! them are fatal: the caller decides whether to skip an entry, drop a message
//! or discard a send, and the next full snapshot repairs any divergence.

use thiserror::Error;

use crate::channel::ChannelKind;

/// Errors raised by the synchronization core and its transports.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A coordinate key string did not have the `[x,y,z]` integer shape.
    #[error("malformed cell key `{key}`")]
    MalformedKey {
        /// The offending key text, as received.
        key: String,
    },

    /// A top-level channel message could not be decoded into any known shape.
    #[error("malformed {channel} message: {reason}")]
    MalformedMessage {
        /// The channel the message arrived on.
        channel: ChannelKind,
        /// Decoder explanation.
        reason: String,
    },

    /// A send was attempted while the channel was closed or still connecting.
    #[error("{channel} channel is not open")]
    ChannelUnavailable {
        /// The channel that refused the send.
        channel: ChannelKind,
    },

    /// The remote endpoint tried to assign a second, different local identity.
    #[error("local identity already set to `{current}`, refusing `{requested}`")]
    IdentityAlreadySet {
        /// The identity that stays authoritative.
        current: String,
        /// The identity that was rejected.
        requested: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A console line did not match any known command.
    #[error("invalid command `{line}`: {reason}")]
    InvalidCommand {
        /// The line as typed.
        line: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The underlying socket failed to connect or broke mid-session.
    #[error("{channel} transport error: {reason}")]
    Transport {
        /// The channel whose socket failed.
        channel: ChannelKind,
        /// Transport-level explanation.
        reason: String,
    },
}

impl SyncError {
    /// Builds a [`SyncError::MalformedMessage`] from any displayable decode error.
    pub fn malformed_message(channel: ChannelKind, reason: impl std::fmt::Display) -> Self {
        SyncError::MalformedMessage {
            channel,
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used across the crate.
pub type SyncResult<T> = Result<T, SyncError>;
