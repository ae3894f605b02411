//! Node addressing on the bus.

use core::fmt;

use crate::InvalidValue;

/// Address of a participant on the bus.
///
/// Valid addresses are `0..=127`, where `0` is reserved for broadcast and
/// `1..=127` identify individual nodes. The monitor only ever tracks unicast
/// addresses; the wider range exists so that addresses decoded off the wire
/// can be represented before they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
#[cfg_attr(feature = "minicbor", cbor(transparent))]
pub struct NodeId(#[cfg_attr(feature = "minicbor", n(0))] u8);

impl NodeId {
    /// The broadcast address.
    pub const BROADCAST: NodeId = NodeId(0);

    /// Highest unicast address.
    pub const MAX: u8 = 127;

    /// Create a node id from a raw address, rejecting values above [`NodeId::MAX`].
    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= Self::MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Create a node id without range checking.
    ///
    /// Out-of-range ids are accepted so they can be handed to APIs that
    /// treat them as a caller error.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Get the raw address.
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// True for `1..=127`.
    pub const fn is_unicast(&self) -> bool {
        self.0 >= 1 && self.0 <= Self::MAX
    }

    pub const fn is_broadcast(&self) -> bool {
        self.0 == 0
    }

    /// True for any address in `0..=127`.
    pub const fn is_valid(&self) -> bool {
        self.0 <= Self::MAX
    }

    /// Iterate over every unicast address in ascending order.
    pub fn unicast() -> impl Iterator<Item = NodeId> {
        (1..=Self::MAX).map(NodeId)
    }
}

impl TryFrom<u8> for NodeId {
    type Error = InvalidValue;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(InvalidValue::NodeId(raw))
    }
}

impl From<NodeId> for u8 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
