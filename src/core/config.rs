//! # Configuration
//!
//! Runtime settings for the sync client. Every field has a default, so an
//! empty JSON object (or no file at all) yields a working configuration.
//! Command-line flags override whatever the file provides.

use std::{fs, path::Path};

use serde::{Deserialize, Deserializer};
use web_time::Duration;

use super::error::{SyncError, SyncResult};
use crate::sync_state::world::cell::CellColor;

/// Default endpoint of the world (cube) channel.
pub const DEFAULT_WORLD_URL: &str = "ws://127.0.0.1:8080";
/// Default endpoint of the roster (player) channel.
pub const DEFAULT_ROSTER_URL: &str = "ws://127.0.0.1:8081";
/// Minimum spacing between two outbound position updates.
pub const DEFAULT_MOVE_SEND_INTERVAL_MS: u64 = 50;

/// Settings consumed by [`crate::sync_state::SyncCore`] and the runner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SyncConfig {
    /// WebSocket URL of the world channel.
    pub world_url: String,
    /// WebSocket URL of the roster channel.
    pub roster_url: String,
    /// Throttle window for `playerMove` messages, in milliseconds.
    pub move_send_interval_ms: u64,
    /// Substituted for out-of-range or non-numeric wire colors.
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub default_color: CellColor,
    /// Color used for locally placed cells.
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub cell_color: CellColor,
    /// How far in front of the eye a toggled cell lands.
    pub placement_distance: f32,
    /// Wait before reopening a closed channel, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Event-loop tick period, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            world_url: DEFAULT_WORLD_URL.to_string(),
            roster_url: DEFAULT_ROSTER_URL.to_string(),
            move_send_interval_ms: DEFAULT_MOVE_SEND_INTERVAL_MS,
            default_color: CellColor::WHITE,
            cell_color: CellColor::WHITE,
            placement_distance: 3.0,
            reconnect_delay_ms: 2000,
            tick_interval_ms: 16,
        }
    }
}

impl SyncConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> SyncResult<Self> {
        serde_json::from_str(text).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// The throttle window as a [`Duration`].
    pub fn move_send_interval(&self) -> Duration {
        Duration::from_millis(self.move_send_interval_ms)
    }

    /// The reconnect delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// The event-loop tick period as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

fn deserialize_hex_color<'de, D>(deserializer: D) -> Result<CellColor, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    CellColor::from_hex_str(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{text}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = SyncConfig::from_json("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.move_send_interval(), Duration::from_millis(50));
    }

    #[test]
    fn fields_override_defaults() {
        let config = SyncConfig::from_json(
            r##"{
                "world_url": "wss://example.net:9000",
                "cell_color": "#ff8800",
                "move_send_interval_ms": 100
            }"##,
        )
        .unwrap();
        assert_eq!(config.world_url, "wss://example.net:9000");
        assert_eq!(config.cell_color, CellColor::new(0xFF8800).unwrap());
        assert_eq!(config.move_send_interval_ms, 100);
        assert_eq!(config.roster_url, DEFAULT_ROSTER_URL);
    }

    #[test]
    fn bad_color_is_a_config_error() {
        let err = SyncConfig::from_json(r#"{"default_color": "teal"}"#).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
