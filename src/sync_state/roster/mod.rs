//! # Roster Replica
//!
//! Who else is in the world, and where. The roster keeps the local
//! participant apart from the remote ones:
//!
//! * The **local** participant always exists and always has a position (the
//!   avatar is visible before the server has named it). Its identity is
//!   `None` until the roster channel's `playerCreated` assigns one, and that
//!   assignment is final for the rest of the connection.
//! * Each **remote** participant owns a [`ProxyId`], the handle the
//!   presentation layer uses for its avatar. A proxy is allocated when the
//!   identity is first seen and released when it leaves; the replica reports
//!   both through [`RosterChange`] events.

use std::collections::{BTreeSet, HashMap};

use cgmath::Vector3;

use crate::core::error::{SyncError, SyncResult};

/// Handle of the renderable avatar owned by a remote roster entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u64);

/// Last-known state of a remote participant.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteParticipant {
    /// Last position reported by the server.
    pub position: Vector3<f32>,
    /// Avatar handle allocated on first sight.
    pub proxy: ProxyId,
}

/// Lifecycle notifications for remote avatars.
#[derive(Clone, Debug, PartialEq)]
pub enum RosterChange {
    /// A remote participant appeared and needs an avatar.
    Joined {
        /// Server identity of the participant.
        id: String,
        /// Newly allocated avatar handle.
        proxy: ProxyId,
        /// First known position.
        position: Vector3<f32>,
    },
    /// A remote participant is gone and its avatar must be dropped.
    Left {
        /// Server identity of the participant.
        id: String,
        /// Avatar handle to release.
        proxy: ProxyId,
    },
}

/// The local replica of the roster channel's state.
pub struct RosterReplica {
    local_identity: Option<String>,
    local_position: Vector3<f32>,
    remotes: HashMap<String, RemoteParticipant>,
    next_proxy: u64,
    changes: Vec<RosterChange>,
}

impl Default for RosterReplica {
    fn default() -> Self {
        Self::new()
    }
}

impl RosterReplica {
    /// Creates a roster with an anonymous local participant at the origin.
    pub fn new() -> Self {
        RosterReplica {
            local_identity: None,
            local_position: Vector3::new(0.0, 0.0, 0.0),
            remotes: HashMap::new(),
            next_proxy: 0,
            changes: Vec::new(),
        }
    }

    /// Records the identity the server assigned to the local participant.
    ///
    /// The first assignment wins. Repeating the same identity is accepted;
    /// a different one fails with [`SyncError::IdentityAlreadySet`] and
    /// leaves the current identity in place. If the identity was already
    /// present as a remote entry, that entry is dropped.
    pub fn set_local_identity(&mut self, id: &str) -> SyncResult<()> {
        match &self.local_identity {
            Some(current) if current == id => Ok(()),
            Some(current) => Err(SyncError::IdentityAlreadySet {
                current: current.clone(),
                requested: id.to_string(),
            }),
            None => {
                self.local_identity = Some(id.to_string());
                self.remove_remote(id);
                Ok(())
            }
        }
    }

    /// Forgets the local identity at the end of a roster connection.
    pub fn clear_local_identity(&mut self) -> Option<String> {
        self.local_identity.take()
    }

    /// The identity assigned by the roster server, if any.
    pub fn local_identity(&self) -> Option<&str> {
        self.local_identity.as_deref()
    }

    /// Current position of the local avatar.
    pub fn local_position(&self) -> Vector3<f32> {
        self.local_position
    }

    /// Moves the local avatar without emitting anything.
    pub fn set_local_position(&mut self, position: Vector3<f32>) {
        self.local_position = position;
    }

    /// Whether `id` names the local participant.
    pub fn is_local(&self, id: &str) -> bool {
        self.local_identity.as_deref() == Some(id)
    }

    /// Creates or moves a remote participant.
    ///
    /// The first sighting allocates a proxy and reports
    /// [`RosterChange::Joined`]; later calls only update the position. The
    /// local identity is never stored as a remote entry.
    pub fn upsert_remote(&mut self, id: &str, x: f32, y: f32, z: f32) {
        if self.is_local(id) {
            return;
        }

        let position = Vector3::new(x, y, z);
        if let Some(remote) = self.remotes.get_mut(id) {
            remote.position = position;
            return;
        }

        let proxy = ProxyId(self.next_proxy);
        self.next_proxy += 1;
        self.remotes
            .insert(id.to_string(), RemoteParticipant { position, proxy });
        self.changes.push(RosterChange::Joined {
            id: id.to_string(),
            proxy,
            position,
        });
    }

    /// Drops a remote participant and releases its proxy.
    pub fn remove_remote(&mut self, id: &str) -> Option<RemoteParticipant> {
        let removed = self.remotes.remove(id)?;
        self.changes.push(RosterChange::Left {
            id: id.to_string(),
            proxy: removed.proxy,
        });
        Some(removed)
    }

    /// Looks up a remote participant by identity.
    pub fn remote(&self, id: &str) -> Option<&RemoteParticipant> {
        self.remotes.get(id)
    }

    /// Identities of all remote participants, ordered.
    pub fn remote_ids(&self) -> BTreeSet<String> {
        self.remotes.keys().cloned().collect()
    }

    /// Number of remote participants.
    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }

    /// Drains pending avatar lifecycle events, oldest first.
    pub fn take_changes(&mut self) -> Vec<RosterChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_identity_is_rejected() {
        let mut roster = RosterReplica::new();
        roster.set_local_identity("A").unwrap();

        let err = roster.set_local_identity("B").unwrap_err();
        assert!(matches!(err, SyncError::IdentityAlreadySet { ref current, .. } if current == "A"));
        assert_eq!(roster.local_identity(), Some("A"));
    }

    #[test]
    fn repeating_the_same_identity_is_fine() {
        let mut roster = RosterReplica::new();
        roster.set_local_identity("A").unwrap();
        roster.set_local_identity("A").unwrap();
        assert_eq!(roster.local_identity(), Some("A"));
    }

    #[test]
    fn upsert_allocates_one_proxy_per_identity() {
        let mut roster = RosterReplica::new();
        roster.upsert_remote("p1", 1.0, 2.0, 3.0);
        roster.upsert_remote("p1", 4.0, 5.0, 6.0);

        let remote = roster.remote("p1").unwrap();
        assert_eq!(remote.position, Vector3::new(4.0, 5.0, 6.0));

        let changes = roster.take_changes();
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], RosterChange::Joined { id, .. } if id == "p1"));
    }

    #[test]
    fn local_identity_is_never_remote() {
        let mut roster = RosterReplica::new();
        roster.upsert_remote("me", 0.0, 0.0, 0.0);
        roster.set_local_identity("me").unwrap();
        assert!(roster.remote_ids().is_empty());

        roster.upsert_remote("me", 9.0, 9.0, 9.0);
        assert!(roster.remote_ids().is_empty());
    }

    #[test]
    fn removal_releases_the_proxy() {
        let mut roster = RosterReplica::new();
        roster.upsert_remote("p1", 0.0, 0.0, 0.0);
        let proxy = roster.remote("p1").unwrap().proxy;
        roster.take_changes();

        assert!(roster.remove_remote("p1").is_some());
        assert!(roster.remove_remote("p1").is_none());
        assert_eq!(
            roster.take_changes(),
            vec![RosterChange::Left {
                id: "p1".to_string(),
                proxy,
            }]
        );
    }

    #[test]
    fn cleared_identity_can_be_reassigned() {
        let mut roster = RosterReplica::new();
        roster.set_local_identity("A").unwrap();
        assert_eq!(roster.clear_local_identity(), Some("A".to_string()));
        roster.set_local_identity("B").unwrap();
        assert_eq!(roster.local_identity(), Some("B"));
    }
}
