//! # Channel Protocol
//!
//! Line-delimited JSON messages exchanged on the two channels.
//!
//! | Channel | Direction | Discriminator | Messages |
//! |---------|-----------|---------------|----------|
//! | world   | outbound  | `method`      | `addCube`, `removeCube` |
//! | world   | inbound   | `type`        | `stateUpdate` |
//! | roster  | outbound  | `method`      | `addPlayer`, `playerMove` |
//! | roster  | inbound   | `type`        | `playerCreated`, `playersUpdate` |
//!
//! Inbound messages decode into tagged enums with an explicit `Unknown`
//! variant: an unrecognised `type` is not an error, it is ignored by the
//! caller. A message that is not JSON, has no `type`, or whose known variant
//! has the wrong shape fails with [`SyncError::MalformedMessage`].
//!
//! Snapshot payloads are kept as raw JSON per entry so that one bad entry
//! can be skipped without losing the rest of the snapshot.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use cgmath::Vector3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::world::{cell::CellColor, cell_key::CellKey, CellIntent};
use crate::{
    channel::ChannelKind,
    core::error::{SyncError, SyncResult},
};

/// Messages the client sends on the world channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum WorldOutbound {
    /// A cell placed locally.
    AddCube {
        x: i32,
        y: i32,
        z: i32,
        #[serde(rename = "rgbColor")]
        rgb_color: u32,
    },
    /// A cell removed locally.
    RemoveCube { x: i32, y: i32, z: i32 },
}

impl From<CellIntent> for WorldOutbound {
    fn from(intent: CellIntent) -> Self {
        match intent {
            CellIntent::Add { key, color } => {
                let (x, y, z) = key.decode();
                WorldOutbound::AddCube {
                    x,
                    y,
                    z,
                    rgb_color: color.rgb(),
                }
            }
            CellIntent::Remove { key } => {
                let (x, y, z) = key.decode();
                WorldOutbound::RemoveCube { x, y, z }
            }
        }
    }
}

/// Messages the client sends on the roster channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum RosterOutbound {
    /// Registration request; the answer is `playerCreated`.
    AddPlayer,
    /// Position update for the local participant.
    PlayerMove {
        #[serde(rename = "playerUUID")]
        player_uuid: String,
        x: f32,
        y: f32,
        z: f32,
    },
}

/// Messages the client understands on the world channel.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorldInbound {
    /// Full replacement of the world.
    StateUpdate {
        /// Cell bodies keyed by `[x,y,z]`.
        cubes: HashMap<String, Value>,
    },
    /// Any other `type`; ignored.
    #[serde(other)]
    Unknown,
}

/// Messages the client understands on the roster channel.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RosterInbound {
    /// The server's answer to `addPlayer`.
    PlayerCreated {
        /// The assigned identity and spawn point.
        player: WirePlayer,
    },
    /// Full replacement of the roster.
    PlayersUpdate {
        /// Position bodies keyed by identity.
        players: HashMap<String, Value>,
    },
    /// Any other `type`; ignored.
    #[serde(other)]
    Unknown,
}

/// The `player` object of `playerCreated`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WirePlayer {
    /// Identity assigned to this client.
    pub uuid: String,
    /// Spawn position.
    pub x: f32,
    /// Spawn position.
    pub y: f32,
    /// Spawn position.
    pub z: f32,
}

#[derive(Deserialize)]
struct WireCell {
    x: i32,
    y: i32,
    z: i32,
    #[serde(default)]
    color: Value,
}

#[derive(Deserialize)]
struct WirePosition {
    x: f32,
    y: f32,
    z: f32,
}

/// Serializes an outbound message to its wire text.
pub fn encode<T: Serialize>(channel: ChannelKind, message: &T) -> SyncResult<String> {
    serde_json::to_string(message).map_err(|e| SyncError::malformed_message(channel, e))
}

/// Decodes one inbound world-channel message.
pub fn decode_world(text: &str) -> SyncResult<WorldInbound> {
    serde_json::from_str(text).map_err(|e| SyncError::malformed_message(ChannelKind::World, e))
}

/// Decodes one inbound roster-channel message.
pub fn decode_roster(text: &str) -> SyncResult<RosterInbound> {
    serde_json::from_str(text).map_err(|e| SyncError::malformed_message(ChannelKind::Roster, e))
}

/// A validated world snapshot: every entry that survived decoding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldSnapshot {
    /// Usable entries with their resolved colors.
    pub cells: BTreeMap<CellKey, CellColor>,
    /// Keys that parsed but whose body was unusable. They are still listed
    /// by the server, so an existing local cell at such a key is kept.
    pub unreadable: BTreeSet<CellKey>,
    /// Entries dropped because their key or body was malformed.
    pub skipped: usize,
}

impl WorldSnapshot {
    /// Validates the `cubes` map of a `stateUpdate`.
    ///
    /// An entry is skipped when its key is not `[x,y,z]`, its body lacks
    /// integer coordinates, or the body's coordinates disagree with the key.
    /// In the last two cases the key is recorded in `unreadable`.
    /// Colors outside `0..=0xFFFFFF` become `default_color`.
    pub fn from_wire(cubes: &HashMap<String, Value>, default_color: CellColor) -> Self {
        let mut snapshot = WorldSnapshot::default();

        for (raw_key, body) in cubes {
            let key = match CellKey::parse(raw_key) {
                Ok(key) => key,
                Err(e) => {
                    log::warn!("Skipping snapshot entry: {e}");
                    snapshot.skipped += 1;
                    continue;
                }
            };

            let cell = match WireCell::deserialize(body) {
                Ok(cell) => cell,
                Err(e) => {
                    log::warn!("Skipping snapshot entry {raw_key}: {e}");
                    snapshot.unreadable.insert(key);
                    snapshot.skipped += 1;
                    continue;
                }
            };

            if key.decode() != (cell.x, cell.y, cell.z) {
                log::warn!(
                    "Skipping snapshot entry {raw_key}: body names ({}, {}, {})",
                    cell.x,
                    cell.y,
                    cell.z
                );
                snapshot.unreadable.insert(key);
                snapshot.skipped += 1;
                continue;
            }

            let color = CellColor::from_wire_or(&cell.color, default_color);
            snapshot.cells.insert(key, color);
        }

        snapshot
    }
}

/// A validated roster snapshot.
///
/// Every identity in the message is present; the position is `None` when
/// the entry's body could not be read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RosterSnapshot {
    /// Every listed identity and its position, if readable.
    pub players: BTreeMap<String, Option<Vector3<f32>>>,
}

impl RosterSnapshot {
    /// Validates the `players` map of a `playersUpdate`.
    pub fn from_wire(players: &HashMap<String, Value>) -> Self {
        let players = players
            .iter()
            .map(|(id, body)| {
                let position = match WirePosition::deserialize(body) {
                    Ok(p) => Some(Vector3::new(p.x, p.y, p.z)),
                    Err(e) => {
                        log::warn!("Unreadable position for player {id}: {e}");
                        None
                    }
                };
                (id.clone(), position)
            })
            .collect();

        RosterSnapshot { players }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_world_messages_match_the_wire() {
        let add = WorldOutbound::from(CellIntent::Add {
            key: CellKey::encode(1, -2, 3),
            color: CellColor::new(0x00FF00).unwrap(),
        });
        let text = encode(ChannelKind::World, &add).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"method": "addCube", "x": 1, "y": -2, "z": 3, "rgbColor": 65280})
        );

        let remove = WorldOutbound::from(CellIntent::Remove {
            key: CellKey::encode(0, 0, 0),
        });
        let value: Value =
            serde_json::from_str(&encode(ChannelKind::World, &remove).unwrap()).unwrap();
        assert_eq!(value, json!({"method": "removeCube", "x": 0, "y": 0, "z": 0}));
    }

    #[test]
    fn outbound_roster_messages_match_the_wire() {
        let text = encode(ChannelKind::Roster, &RosterOutbound::AddPlayer).unwrap();
        assert_eq!(text, r#"{"method":"addPlayer"}"#);

        let moved = RosterOutbound::PlayerMove {
            player_uuid: "abc".to_string(),
            x: 1.5,
            y: 0.0,
            z: -2.0,
        };
        let value: Value =
            serde_json::from_str(&encode(ChannelKind::Roster, &moved).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"method": "playerMove", "playerUUID": "abc", "x": 1.5, "y": 0.0, "z": -2.0})
        );
    }

    #[test]
    fn unknown_types_decode_to_unknown() {
        let chat = decode_world(r#"{"type":"chat","text":"hi"}"#);
        assert!(matches!(chat, Ok(WorldInbound::Unknown)));
        assert!(matches!(decode_roster(r#"{"type":"ping"}"#), Ok(RosterInbound::Unknown)));
    }

    #[test]
    fn malformed_messages_are_errors() {
        for text in ["not json", "[]", r#"{"cubes":{}}"#, r#"{"type":"stateUpdate"}"#] {
            let err = decode_world(text).unwrap_err();
            assert!(matches!(err, SyncError::MalformedMessage { channel: ChannelKind::World, .. }));
        }
        let err = decode_roster(r#"{"type":"playerCreated","player":{"x":1}}"#).unwrap_err();
        assert!(matches!(err, SyncError::MalformedMessage { channel: ChannelKind::Roster, .. }));
    }

    #[test]
    fn world_snapshot_skips_only_bad_entries() {
        let message = decode_world(
            r#"{"type":"stateUpdate","cubes":{
                "[0,0,0]": {"x":0,"y":0,"z":0,"color":16777215},
                "[1, 0,0]": {"x":1,"y":0,"z":0,"color":"255"},
                "[2,0,0]": {"x":2,"y":0,"z":0,"color":-4},
                "garbage": {"x":3,"y":0,"z":0,"color":0},
                "[4,0,0]": {"x":5,"y":0,"z":0,"color":0},
                "[6,0,0]": {"color":0}
            }}"#,
        )
        .unwrap();
        let WorldInbound::StateUpdate { cubes } = message else {
            panic!("expected stateUpdate");
        };

        let snapshot = WorldSnapshot::from_wire(&cubes, CellColor::WHITE);
        assert_eq!(snapshot.skipped, 3);
        assert_eq!(snapshot.cells.len(), 3);
        assert_eq!(snapshot.cells[&CellKey::encode(1, 0, 0)], CellColor::new(255).unwrap());
        assert_eq!(snapshot.cells[&CellKey::encode(2, 0, 0)], CellColor::WHITE);
        assert_eq!(
            snapshot.unreadable,
            BTreeSet::from([CellKey::encode(4, 0, 0), CellKey::encode(6, 0, 0)])
        );
    }

    #[test]
    fn unreadable_body_keeps_listed_cell() {
        use crate::sync_state::{reconciliation::reconcile_world, world::WorldReplica};

        let mut world = WorldReplica::new();
        world.insert(1, 2, 3, CellColor::new(5).unwrap(), true);

        let cubes: HashMap<String, Value> =
            HashMap::from([("[1,2,3]".to_string(), json!({"color": 5}))]);
        let snapshot = WorldSnapshot::from_wire(&cubes, CellColor::WHITE);
        assert!(snapshot.cells.is_empty());

        let report = reconcile_world(&mut world, &snapshot);
        assert_eq!(report.removed, 0);
        assert_eq!(report.skipped, 1);
        assert!(world.has(1, 2, 3));

        let mut fresh = WorldReplica::new();
        let report = reconcile_world(&mut fresh, &snapshot);
        assert_eq!(report.added, 0);
        assert!(fresh.is_empty());
    }

    #[test]
    fn roster_snapshot_keeps_ids_with_bad_positions() {
        let message = decode_roster(
            r#"{"type":"playersUpdate","players":{"a":{"x":1,"y":2,"z":3},"b":{"x":"left"}}}"#,
        )
        .unwrap();
        let RosterInbound::PlayersUpdate { players } = message else {
            panic!("expected playersUpdate");
        };

        let snapshot = RosterSnapshot::from_wire(&players);
        assert_eq!(snapshot.players["a"], Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(snapshot.players["b"], None);
    }
}
