//! # World Replica
//!
//! In-memory copy of the shared voxel world: one [`Cell`] per [`CellKey`].
//!
//! ## Emission
//!
//! Local edits must reach the world channel, edits that came *from* the world
//! channel must not go back out. Both paths share the same `insert`/`remove`
//! primitives and differ only in the `suppress_emission` flag:
//!
//! * `suppress_emission == false` (local action): the mutation is applied and
//!   a [`CellIntent`] is queued in the replica's outbox.
//! * `suppress_emission == true` (reconciliation): the mutation is applied and
//!   nothing is queued.
//!
//! The outbox is drained by [`crate::sync_state::SyncCore`], which turns each
//! intent into an `addCube`/`removeCube` message. The replica itself never
//! touches a channel.
//!
//! ## Invariants
//!
//! * At most one cell per key; inserting over an existing key replaces it.
//! * A cell's role is derived from its color on every read.

pub mod cell;
pub mod cell_key;
pub mod placement;

use std::collections::{BTreeSet, HashMap};

use cell::{Cell, CellColor, CellRole};
use cell_key::CellKey;

/// An outbound request raised by a local world edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellIntent {
    /// A cell was placed locally.
    Add {
        /// Where the cell was placed.
        key: CellKey,
        /// Its color.
        color: CellColor,
    },
    /// A cell was removed locally.
    Remove {
        /// Which cell was removed.
        key: CellKey,
    },
}

/// The local replica of the world channel's state.
///
/// # Examples
///
/// ```
/// use voxel_sync::sync_state::world::{cell::CellColor, CellIntent, WorldReplica};
///
/// let mut world = WorldReplica::new();
/// world.insert(0, 1, 0, CellColor::WHITE, false);
/// assert!(world.has(0, 1, 0));
/// assert_eq!(world.take_intents().len(), 1);
///
/// world.remove(0, 1, 0, true);
/// assert!(world.is_empty());
/// assert!(world.take_intents().is_empty());
/// ```
#[derive(Default)]
pub struct WorldReplica {
    cells: HashMap<CellKey, Cell>,
    intents: Vec<CellIntent>,
}

impl WorldReplica {
    /// Creates an empty replica.
    pub fn new() -> Self {
        WorldReplica {
            cells: HashMap::new(),
            intents: Vec::new(),
        }
    }

    /// Whether a cell exists at `(x, y, z)`.
    pub fn has(&self, x: i32, y: i32, z: i32) -> bool {
        self.contains_key(&CellKey::encode(x, y, z))
    }

    /// Key-based form of [`has`](Self::has).
    pub fn contains_key(&self, key: &CellKey) -> bool {
        self.cells.contains_key(key)
    }

    /// The cell at `(x, y, z)`, if any.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<Cell> {
        self.get_key(&CellKey::encode(x, y, z))
    }

    /// Key-based form of [`get`](Self::get).
    pub fn get_key(&self, key: &CellKey) -> Option<Cell> {
        self.cells.get(key).copied()
    }

    /// Places a cell at `(x, y, z)`, replacing whatever was there.
    ///
    /// Unless `suppress_emission` is set, an [`CellIntent::Add`] is queued.
    pub fn insert(&mut self, x: i32, y: i32, z: i32, color: CellColor, suppress_emission: bool) {
        self.insert_key(CellKey::encode(x, y, z), color, suppress_emission);
    }

    /// Key-based form of [`insert`](Self::insert).
    pub fn insert_key(&mut self, key: CellKey, color: CellColor, suppress_emission: bool) {
        self.cells.insert(key, Cell::new(color));
        if !suppress_emission {
            self.intents.push(CellIntent::Add { key, color });
        }
    }

    /// Removes the cell at `(x, y, z)`.
    ///
    /// Removing an empty coordinate changes nothing and queues nothing.
    /// Returns the removed cell.
    pub fn remove(&mut self, x: i32, y: i32, z: i32, suppress_emission: bool) -> Option<Cell> {
        self.remove_key(&CellKey::encode(x, y, z), suppress_emission)
    }

    /// Key-based form of [`remove`](Self::remove).
    pub fn remove_key(&mut self, key: &CellKey, suppress_emission: bool) -> Option<Cell> {
        let removed = self.cells.remove(key);
        if removed.is_some() && !suppress_emission {
            self.intents.push(CellIntent::Remove { key: *key });
        }
        removed
    }

    /// The current keyset, ordered.
    pub fn snapshot_keys(&self) -> BTreeSet<CellKey> {
        self.cells.keys().copied().collect()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the replica holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over every cell, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (CellKey, Cell)> + '_ {
        self.cells.iter().map(|(key, cell)| (*key, *cell))
    }

    /// Keys of all cells currently classified as `role`.
    pub fn cells_with_role(&self, role: CellRole) -> BTreeSet<CellKey> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.role() == role)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Drains the emission outbox, oldest intent first.
    pub fn take_intents(&mut self) -> Vec<CellIntent> {
        std::mem::take(&mut self.intents)
    }

    /// Whether local edits are waiting to be flushed.
    pub fn has_pending_intents(&self) -> bool {
        !self.intents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::cell::{LOGIC_GATE_COLOR, SIGNAL_COLOR};
    use super::*;

    #[test]
    fn insert_is_idempotent_and_replaces() {
        let mut world = WorldReplica::new();
        world.insert(1, 2, 3, CellColor::WHITE, true);
        world.insert(1, 2, 3, SIGNAL_COLOR, true);

        assert_eq!(world.len(), 1);
        assert_eq!(world.get(1, 2, 3).unwrap().role(), CellRole::Signal);
    }

    #[test]
    fn removing_absent_cell_is_silent() {
        let mut world = WorldReplica::new();
        assert_eq!(world.remove(5, 5, 5, false), None);
        assert!(!world.has_pending_intents());
    }

    #[test]
    fn local_edits_queue_intents_in_order() {
        let mut world = WorldReplica::new();
        world.insert(0, 0, 0, CellColor::WHITE, false);
        world.remove(0, 0, 0, false);

        assert_eq!(
            world.take_intents(),
            vec![
                CellIntent::Add {
                    key: CellKey::encode(0, 0, 0),
                    color: CellColor::WHITE,
                },
                CellIntent::Remove {
                    key: CellKey::encode(0, 0, 0),
                },
            ]
        );
        assert!(world.take_intents().is_empty());
    }

    #[test]
    fn suppressed_edits_queue_nothing() {
        let mut world = WorldReplica::new();
        world.insert(0, 0, 0, CellColor::WHITE, true);
        world.remove(0, 0, 0, true);
        assert!(!world.has_pending_intents());
    }

    #[test]
    fn roles_are_derived_after_recolor() {
        let mut world = WorldReplica::new();
        world.insert(0, 0, 0, LOGIC_GATE_COLOR, true);
        world.insert(1, 0, 0, SIGNAL_COLOR, true);
        assert_eq!(world.cells_with_role(CellRole::LogicGate).len(), 1);

        world.remove(0, 0, 0, true);
        world.insert(0, 0, 0, CellColor::WHITE, true);
        assert!(world.cells_with_role(CellRole::LogicGate).is_empty());
        assert_eq!(
            world.cells_with_role(CellRole::Signal).into_iter().collect::<Vec<_>>(),
            vec![CellKey::encode(1, 0, 0)]
        );
    }
}
