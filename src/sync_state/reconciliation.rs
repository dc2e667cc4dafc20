//! # Reconciliation
//!
//! Converges a replica to a full snapshot received from its channel. Every
//! inbound snapshot is the complete truth, so reconciliation is a set diff:
//!
//! 1. keys in the replica but not in the snapshot are removed (a key the
//!    snapshot lists with an unusable body counts as present),
//! 2. keys in the snapshot but not in the replica are inserted,
//! 3. keys in both are left alone.
//!
//! Every mutation goes through the replica's ordinary primitives with
//! emission suppressed, so applying a snapshot can never produce outbound
//! traffic. Applying the same snapshot twice changes nothing the second time.
//!
//! Step 3 means a color change at an occupied coordinate is not picked up:
//! the protocol only models placement and removal, and peers recolor by
//! removing and re-adding.

use std::collections::BTreeSet;

use super::{
    protocol::{RosterSnapshot, WorldSnapshot},
    roster::RosterReplica,
    world::WorldReplica,
};

/// What a reconciliation pass changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries inserted.
    pub added: usize,
    /// Entries removed.
    pub removed: usize,
    /// Existing entries whose attributes were refreshed (roster positions).
    pub updated: usize,
    /// Snapshot entries that could not be applied.
    pub skipped: usize,
}

impl ReconcileReport {
    /// Whether the pass changed membership.
    pub fn changed_membership(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

/// Brings `world` to exactly the keyset of `snapshot`.
pub fn reconcile_world(world: &mut WorldReplica, snapshot: &WorldSnapshot) -> ReconcileReport {
    let current = world.snapshot_keys();
    let incoming: BTreeSet<_> = snapshot.cells.keys().copied().collect();

    let mut report = ReconcileReport {
        skipped: snapshot.skipped,
        ..ReconcileReport::default()
    };

    for key in current
        .difference(&incoming)
        .filter(|key| !snapshot.unreadable.contains(key))
    {
        let (x, y, z) = key.decode();
        log::debug!("Removing cell ({x}, {y}, {z}) absent from snapshot");
        if world.remove_key(key, true).is_some() {
            report.removed += 1;
        }
    }

    for key in incoming.difference(&current) {
        world.insert_key(*key, snapshot.cells[key], true);
        report.added += 1;
    }

    report
}

/// Brings the remote half of `roster` to exactly the identities of `snapshot`.
///
/// The local identity is excluded whether or not the message lists it. An
/// identity whose position could not be read keeps its current entry
/// untouched; if it is new, it is skipped until a readable snapshot arrives.
pub fn reconcile_roster(roster: &mut RosterReplica, snapshot: &RosterSnapshot) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for id in roster.remote_ids() {
        if !snapshot.players.contains_key(&id) {
            roster.remove_remote(&id);
            log::info!("Removed remote player: {id}");
            report.removed += 1;
        }
    }

    for (id, position) in &snapshot.players {
        if roster.is_local(id) {
            continue;
        }

        let known = roster.remote(id).is_some();
        match position {
            Some(p) => {
                roster.upsert_remote(id, p.x, p.y, p.z);
                if known {
                    report.updated += 1;
                } else {
                    report.added += 1;
                }
            }
            None => {
                if !known {
                    report.skipped += 1;
                }
            }
        }
    }

    report
}
