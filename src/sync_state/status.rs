//! Connection summary shown to the user: which channels are open and which
//! identity the server assigned.

use std::fmt;

use crate::channel::ChannelState;

/// Overall health, from the number of open channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    /// Neither channel is open.
    Disconnected,
    /// Exactly one channel is open.
    Partial,
    /// Both channels are open.
    Connected,
}

/// Snapshot of both channel states and the local identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// State of the world channel.
    pub world: ChannelState,
    /// State of the roster channel.
    pub roster: ChannelState,
    /// Local identity, once assigned.
    pub identity: Option<String>,
}

impl ConnectionStatus {
    /// Overall health from the channel states.
    pub fn level(&self) -> StatusLevel {
        let open = [self.world, self.roster]
            .iter()
            .filter(|state| **state == ChannelState::Open)
            .count();
        match open {
            0 => StatusLevel::Disconnected,
            1 => StatusLevel::Partial,
            _ => StatusLevel::Connected,
        }
    }
}

/// `Players: Open | Cubes: Closed (UUID: N/A)`
impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |state: ChannelState| {
            if state == ChannelState::Open {
                "Open"
            } else {
                "Closed"
            }
        };
        write!(
            f,
            "Players: {} | Cubes: {} (UUID: {})",
            label(self.roster),
            label(self.world),
            self.identity.as_deref().unwrap_or("N/A")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_counts_open_channels() {
        let mut status = ConnectionStatus {
            world: ChannelState::Closed,
            roster: ChannelState::Connecting,
            identity: None,
        };
        assert_eq!(status.level(), StatusLevel::Disconnected);

        status.roster = ChannelState::Open;
        assert_eq!(status.level(), StatusLevel::Partial);

        status.world = ChannelState::Open;
        assert_eq!(status.level(), StatusLevel::Connected);
    }

    #[test]
    fn renders_status_line() {
        let status = ConnectionStatus {
            world: ChannelState::Closed,
            roster: ChannelState::Open,
            identity: Some("abc".to_string()),
        };
        assert_eq!(status.to_string(), "Players: Open | Cubes: Closed (UUID: abc)");
    }
}
