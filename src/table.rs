//! Fixed-size per-node health storage.
//!
//! One [`Entry`] per unicast address, stored inline in an array indexed by
//! `id - 1`. The table never allocates and never grows.

use nodewatch_types::{HealthCode, NodeId, NodeStatus};

use crate::error::{fatal, PreconditionViolation};

/// Number of slots in the table, one per unicast address.
pub const TABLE_SIZE: usize = NodeId::MAX as usize;

/// Staleness value marking a node that was never observed.
pub(crate) const AGE_UNKNOWN: i32 = -1;

/// Monitoring state for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Time since the last heartbeat in 100 ms units, or -1 if never observed.
    pub(crate) age_ms100: i32,
    pub(crate) code: HealthCode,
}

impl Entry {
    /// Unknown entries hold [`HealthCode::Offline`], so the first heartbeat
    /// with any reported code is a change.
    pub(crate) const UNKNOWN: Entry = Entry {
        age_ms100: AGE_UNKNOWN,
        code: HealthCode::Offline,
    };

    /// A freshly observed node.
    pub(crate) const fn fresh(code: HealthCode) -> Self {
        Self { age_ms100: 0, code }
    }

    pub fn is_known(&self) -> bool {
        self.age_ms100 >= 0
    }

    /// Time since the last heartbeat in 100 ms units, `None` if never observed.
    pub fn age_ms100(&self) -> Option<u32> {
        u32::try_from(self.age_ms100).ok()
    }

    pub fn code(&self) -> HealthCode {
        self.code
    }

    pub fn status(&self) -> NodeStatus {
        if self.is_known() {
            NodeStatus::known(self.code)
        } else {
            NodeStatus::UNKNOWN
        }
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// Health state of every node on the bus.
///
/// Read access is public so that change hooks can inspect the table while an
/// event is being delivered; mutation is reserved to the monitor.
#[derive(Debug, Clone)]
pub struct HealthTable {
    entries: [Entry; TABLE_SIZE],
}

impl HealthTable {
    /// A table with every node unknown.
    pub const fn new() -> Self {
        Self {
            entries: [Entry::UNKNOWN; TABLE_SIZE],
        }
    }

    fn index(id: NodeId) -> usize {
        if !id.is_unicast() {
            fatal(PreconditionViolation::NodeIdOutOfRange(id));
        }
        usize::from(id.get()) - 1
    }

    /// Entry for a node.
    ///
    /// # Panics
    ///
    /// Raises a [`PreconditionViolation`] if `id` is not in `1..=127`.
    pub fn entry(&self, id: NodeId) -> &Entry {
        &self.entries[Self::index(id)]
    }

    pub(crate) fn entry_mut(&mut self, id: NodeId) -> &mut Entry {
        &mut self.entries[Self::index(id)]
    }

    /// Current status of a node.
    ///
    /// # Panics
    ///
    /// Raises a [`PreconditionViolation`] if `id` is not in `1..=127`.
    pub fn status(&self, id: NodeId) -> NodeStatus {
        self.entry(id).status()
    }

    /// The known node with the highest health code.
    ///
    /// Nodes are scanned in ascending id order and a later node only replaces
    /// the current candidate when its code is strictly worse, so the lowest
    /// id wins ties. Returns `None` when no node is known.
    pub fn worst(&self) -> Option<NodeId> {
        let mut worst: Option<(NodeId, HealthCode)> = None;
        for (id, entry) in self.iter() {
            if !entry.is_known() {
                continue;
            }
            match worst {
                Some((_, code)) if entry.code <= code => {}
                _ => worst = Some((id, entry.code)),
            }
        }
        worst.map(|(id, _)| id)
    }

    /// Iterate over every slot with its node id, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Entry)> + '_ {
        NodeId::unicast().zip(self.entries.iter())
    }

    /// Iterate over the nodes that have been observed.
    pub fn known_nodes(&self) -> impl Iterator<Item = (NodeId, NodeStatus)> + '_ {
        self.iter()
            .filter(|(_, entry)| entry.is_known())
            .map(|(id, entry)| (id, entry.status()))
    }

    /// Number of nodes that have been observed.
    pub fn known_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_known()).count()
    }
}

impl Default for HealthTable {
    fn default() -> Self {
        Self::new()
    }
}
