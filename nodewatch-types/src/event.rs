//! Messages flowing into and out of the monitor.

use crate::{HealthCode, NodeId, NodeStatus};

/// A decoded status heartbeat as delivered by the transport.
///
/// The transport is responsible for only handing over heartbeats whose
/// source is a unicast address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct Heartbeat {
    /// Sender of the heartbeat.
    #[cfg_attr(feature = "minicbor", n(0))]
    pub source: NodeId,

    /// Health reported by the sender.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub code: HealthCode,

    /// Sender uptime in seconds, if the transport provides it.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    #[cfg_attr(feature = "minicbor", n(2))]
    pub uptime_sec: Option<u32>,
}

impl Heartbeat {
    pub const fn new(source: NodeId, code: HealthCode) -> Self {
        Self {
            source,
            code,
            uptime_sec: None,
        }
    }

    /// Attach the sender uptime.
    pub const fn with_uptime(mut self, uptime_sec: u32) -> Self {
        self.uptime_sec = Some(uptime_sec);
        self
    }
}

/// Emitted by the monitor whenever a node's health code changes.
///
/// Repeated heartbeats carrying the same code do not produce events; only
/// transitions do, including the synthetic transition to
/// [`HealthCode::Offline`] when a node times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct NodeStatusChangeEvent {
    #[cfg_attr(feature = "minicbor", n(0))]
    pub node_id: NodeId,

    /// Status before the change. `known` is false for a first sighting.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub old_status: NodeStatus,

    /// Status after the change. Always known.
    #[cfg_attr(feature = "minicbor", n(2))]
    pub status: NodeStatus,
}

impl NodeStatusChangeEvent {
    /// True when the node was never seen before this event.
    pub fn is_first_sighting(&self) -> bool {
        !self.old_status.known
    }

    /// True when the node transitioned into [`HealthCode::Offline`].
    pub fn went_offline(&self) -> bool {
        self.status.code == HealthCode::Offline
    }

    /// True when an offline node started reporting again.
    pub fn came_back(&self) -> bool {
        self.old_status.known && self.old_status.code == HealthCode::Offline
    }
}
