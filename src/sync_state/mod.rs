//! # Sync State Module
//!
//! The shared-state synchronization core. [`SyncCore`] owns everything that
//! must stay consistent with the two remote channels:
//!
//! * `world` - the [`WorldReplica`] of placed cells,
//! * `roster` - the [`RosterReplica`] of participants,
//! * `throttle` - the [`MoveThrottle`] gating local position updates,
//! * the world and roster [`Channel`] handles.
//!
//! ## Data Flow
//!
//! 1. Local actions (`place_cell`, `remove_cell`, `toggle_cell`,
//!    `move_local`) mutate a replica immediately. Cell edits queue intents
//!    that are flushed to the world channel right away; moves wait for
//!    `tick`.
//! 2. Inbound lines are decoded into tagged messages. Snapshots go through
//!    [`reconciliation`], which mutates replicas with emission suppressed.
//! 3. Sends on a closed channel are logged and dropped; the next snapshot
//!    repairs any divergence.
//!
//! ## Threading
//!
//! `SyncCore` is driven from a single event loop and is deliberately not
//! `Send`: transports forward their traffic as [`ChannelEvent`]s instead of
//! calling into the core.

pub mod protocol;
pub mod reconciliation;
pub mod roster;
pub mod status;
pub mod throttle;
pub mod world;

use cgmath::{Point3, Vector3};
use serde::Serialize;
use web_time::Instant;

use protocol::{
    RosterInbound, RosterOutbound, RosterSnapshot, WorldInbound, WorldOutbound, WorldSnapshot,
};
use reconciliation::{reconcile_roster, reconcile_world, ReconcileReport};
use roster::{RosterChange, RosterReplica};
use status::ConnectionStatus;
use throttle::MoveThrottle;
use world::{cell::CellColor, cell_key::CellKey, placement::target_cell, WorldReplica};

use crate::{
    channel::{Channel, ChannelEvent, ChannelKind},
    core::{error::SyncResult, SyncConfig, SyncError},
};

/// The synchronization core: replicas, throttle and channel handles.
///
/// # Examples
///
/// ```
/// use voxel_sync::channel::{ChannelKind, LoopbackChannel};
/// use voxel_sync::core::SyncConfig;
/// use voxel_sync::sync_state::SyncCore;
///
/// let world = LoopbackChannel::new(ChannelKind::World);
/// let roster = LoopbackChannel::new(ChannelKind::Roster);
/// let mut core = SyncCore::new(
///     SyncConfig::default(),
///     Box::new(world.clone()),
///     Box::new(roster.clone()),
/// );
///
/// core.handle_world_message(
///     r#"{"type":"stateUpdate","cubes":{"[0,0,0]":{"x":0,"y":0,"z":0,"color":16777215}}}"#,
/// )
/// .unwrap();
/// assert!(core.world().has(0, 0, 0));
/// assert!(world.sent().is_empty());
/// ```
pub struct SyncCore {
    config: SyncConfig,
    world: WorldReplica,
    roster: RosterReplica,
    throttle: MoveThrottle,
    world_channel: Box<dyn Channel>,
    roster_channel: Box<dyn Channel>,
}

impl SyncCore {
    /// Builds a core with empty replicas around the two channel handles.
    pub fn new(
        config: SyncConfig,
        world_channel: Box<dyn Channel>,
        roster_channel: Box<dyn Channel>,
    ) -> Self {
        let throttle = MoveThrottle::new(config.move_send_interval());
        SyncCore {
            config,
            world: WorldReplica::new(),
            roster: RosterReplica::new(),
            throttle,
            world_channel,
            roster_channel,
        }
    }

    /// The configuration this core was built with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Read access to the world replica.
    pub fn world(&self) -> &WorldReplica {
        &self.world
    }

    /// Read access to the roster replica.
    pub fn roster(&self) -> &RosterReplica {
        &self.roster
    }

    /// Drains remote avatar lifecycle events for the presentation layer.
    pub fn take_roster_changes(&mut self) -> Vec<RosterChange> {
        self.roster.take_changes()
    }

    /// Summary of both channels and the local identity.
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            world: self.world_channel.state(),
            roster: self.roster_channel.state(),
            identity: self.roster.local_identity().map(str::to_string),
        }
    }

    // ── Local actions ───────────────────────────────────────────

    /// Places a cell locally and broadcasts it.
    pub fn place_cell(&mut self, x: i32, y: i32, z: i32, color: CellColor) {
        self.world.insert(x, y, z, color, false);
        self.flush_cell_intents();
    }

    /// Removes a cell locally and broadcasts the removal.
    pub fn remove_cell(&mut self, x: i32, y: i32, z: i32) {
        self.world.remove(x, y, z, false);
        self.flush_cell_intents();
    }

    /// Removes the cell at `(x, y, z)` if there is one, otherwise places one.
    ///
    /// Returns `true` when a cell was placed.
    pub fn toggle_cell(&mut self, x: i32, y: i32, z: i32, color: CellColor) -> bool {
        if self.world.has(x, y, z) {
            self.remove_cell(x, y, z);
            false
        } else {
            self.place_cell(x, y, z, color);
            true
        }
    }

    /// Toggles the cell `placement_distance` units in front of the eye, using
    /// the configured cell color. Returns the targeted key.
    pub fn toggle_cell_in_front(&mut self, eye: Point3<f32>, direction: Vector3<f32>) -> CellKey {
        let key = target_cell(eye, direction, self.config.placement_distance);
        let (x, y, z) = key.decode();
        self.toggle_cell(x, y, z, self.config.cell_color);
        key
    }

    /// Moves the local avatar. The position goes out on a later [`tick`](Self::tick).
    pub fn move_local(&mut self, position: Vector3<f32>) {
        self.roster.set_local_position(position);
    }

    /// Periodic step: sends the local position if the throttle allows it.
    ///
    /// Returns `true` when a `playerMove` was handed to the roster channel.
    pub fn tick(&mut self, now: Instant) -> bool {
        let position = self.roster.local_position();
        let Some(identity) = self.roster.local_identity().map(str::to_string) else {
            return false;
        };
        if !self.throttle.should_send(true, position, now) {
            return false;
        }

        let message = RosterOutbound::PlayerMove {
            player_uuid: identity,
            x: position.x,
            y: position.y,
            z: position.z,
        };
        self.send(ChannelKind::Roster, &message)
    }

    // ── Inbound traffic ─────────────────────────────────────────

    /// Dispatches one transport event. Errors are logged, never propagated.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened(kind) => self.on_opened(kind),
            ChannelEvent::Closed(kind) => self.on_closed(kind),
            ChannelEvent::Message(ChannelKind::World, text) => {
                if let Err(e) = self.handle_world_message(&text) {
                    log::error!("Dropping world message: {e}");
                }
            }
            ChannelEvent::Message(ChannelKind::Roster, text) => {
                if let Err(e) = self.handle_roster_message(&text) {
                    log::error!("Dropping roster message: {e}");
                }
            }
        }
    }

    /// A channel finished connecting. Opening the roster channel registers
    /// the local participant.
    pub fn on_opened(&mut self, kind: ChannelKind) {
        log::info!("{}", self.status());
        if kind == ChannelKind::Roster {
            self.send(ChannelKind::Roster, &RosterOutbound::AddPlayer);
        }
    }

    /// A channel closed. Replicas are kept as they are; closing the roster
    /// channel ends the identity session.
    pub fn on_closed(&mut self, kind: ChannelKind) {
        if kind == ChannelKind::Roster {
            if let Some(identity) = self.roster.clear_local_identity() {
                log::info!("Roster session for {identity} ended");
            }
            self.throttle.reset();
        }
        log::info!("{}", self.status());
    }

    /// Decodes and applies one world-channel line.
    ///
    /// Returns the reconciliation report for snapshots and `None` for ignored
    /// message types.
    pub fn handle_world_message(&mut self, text: &str) -> SyncResult<Option<ReconcileReport>> {
        match protocol::decode_world(text)? {
            WorldInbound::StateUpdate { cubes } => {
                let snapshot = WorldSnapshot::from_wire(&cubes, self.config.default_color);
                let report = reconcile_world(&mut self.world, &snapshot);
                log::info!(
                    "Scene synchronized. Cubes on server: {}. Cubes now on client: {}.",
                    cubes.len(),
                    self.world.len()
                );
                log::debug!("World reconciliation: {report:?}");
                Ok(Some(report))
            }
            WorldInbound::Unknown => {
                log::info!("Received unknown world message type: {text}");
                Ok(None)
            }
        }
    }

    /// Decodes and applies one roster-channel line.
    ///
    /// Returns the reconciliation report for snapshots and `None` otherwise.
    /// A second `playerCreated` with a different identity fails with
    /// [`SyncError::IdentityAlreadySet`] and changes nothing.
    pub fn handle_roster_message(&mut self, text: &str) -> SyncResult<Option<ReconcileReport>> {
        match protocol::decode_roster(text)? {
            RosterInbound::PlayerCreated { player } => {
                self.roster.set_local_identity(&player.uuid)?;
                self.roster
                    .set_local_position(Vector3::new(player.x, player.y, player.z));
                self.throttle.reset();
                log::info!("My UUID is: {}", player.uuid);
                Ok(None)
            }
            RosterInbound::PlayersUpdate { players } => {
                let snapshot = RosterSnapshot::from_wire(&players);
                let report = reconcile_roster(&mut self.roster, &snapshot);
                if report.changed_membership() {
                    log::info!(
                        "Roster synchronized: {} remote players ({report:?})",
                        self.roster.remote_count()
                    );
                }
                Ok(Some(report))
            }
            RosterInbound::Unknown => {
                log::info!("Received unknown roster message type: {text}");
                Ok(None)
            }
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Asks a closed channel to connect again.
    pub fn reconnect(&mut self, kind: ChannelKind) {
        self.channel_mut(kind).reconnect();
    }

    /// Closes both channels and drops the core.
    pub fn shutdown(mut self) {
        self.world_channel.close();
        self.roster_channel.close();
        log::info!("Sync core shut down with {} cells", self.world.len());
    }

    fn flush_cell_intents(&mut self) {
        for intent in self.world.take_intents() {
            self.send(ChannelKind::World, &WorldOutbound::from(intent));
        }
    }

    /// Fire-and-forget send. Returns whether the channel accepted the message.
    fn send<T: Serialize>(&mut self, kind: ChannelKind, message: &T) -> bool {
        let result =
            protocol::encode(kind, message).and_then(|text| self.channel_mut(kind).send_text(text));
        match result {
            Ok(()) => true,
            Err(e @ SyncError::ChannelUnavailable { .. }) => {
                log::warn!("{e}; change not synchronized");
                false
            }
            Err(e) => {
                log::error!("{e}");
                false
            }
        }
    }

    fn channel_mut(&mut self, kind: ChannelKind) -> &mut Box<dyn Channel> {
        match kind {
            ChannelKind::World => &mut self.world_channel,
            ChannelKind::Roster => &mut self.roster_channel,
        }
    }
}
