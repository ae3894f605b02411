//! Health codes reported by nodes and the status view derived from them.

use core::fmt;

use crate::InvalidValue;

/// Health classification carried in a node heartbeat.
///
/// Variants are ordered by severity, so comparing two codes tells which one
/// is worse. [`HealthCode::Offline`] is never expected on the wire from a
/// healthy peer; the monitor assigns it when a node falls silent, and it
/// compares greater than every reported code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
#[cfg_attr(feature = "minicbor", cbor(index_only))]
#[repr(u8)]
pub enum HealthCode {
    #[default]
    #[cfg_attr(feature = "minicbor", n(0))]
    Ok = 0,
    #[cfg_attr(feature = "minicbor", n(1))]
    Warning = 1,
    #[cfg_attr(feature = "minicbor", n(2))]
    Error = 2,
    #[cfg_attr(feature = "minicbor", n(3))]
    Critical = 3,
    /// Synthetic code for nodes whose heartbeat timed out.
    #[cfg_attr(feature = "minicbor", n(15))]
    Offline = 15,
}

impl HealthCode {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthCode::Ok => "OK",
            HealthCode::Warning => "WARN",
            HealthCode::Error => "ERR",
            HealthCode::Critical => "CRIT",
            HealthCode::Offline => "OFFL",
        }
    }

    /// Raw protocol value.
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for HealthCode {
    type Error = InvalidValue;

    fn try_from(raw: u8) -> Result<Self, InvalidValue> {
        match raw {
            0 => Ok(HealthCode::Ok),
            1 => Ok(HealthCode::Warning),
            2 => Ok(HealthCode::Error),
            3 => Ok(HealthCode::Critical),
            15 => Ok(HealthCode::Offline),
            other => Err(InvalidValue::HealthCode(other)),
        }
    }
}

impl fmt::Display for HealthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Last known health of a node as seen by the monitor.
///
/// `code` is only meaningful when `known` is true; an unknown node reports
/// [`HealthCode::Offline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct NodeStatus {
    /// Whether a heartbeat from this node was ever observed.
    #[cfg_attr(feature = "minicbor", n(0))]
    pub known: bool,

    #[cfg_attr(feature = "minicbor", n(1))]
    pub code: HealthCode,
}

impl NodeStatus {
    /// Status of a node that has never been heard from.
    pub const UNKNOWN: NodeStatus = NodeStatus {
        known: false,
        code: HealthCode::Offline,
    };

    /// Status of an observed node.
    pub const fn known(code: HealthCode) -> Self {
        Self { known: true, code }
    }

    /// The code, if the node is known.
    pub fn code(&self) -> Option<HealthCode> {
        self.known.then_some(self.code)
    }
}

impl Default for NodeStatus {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.known {
            write!(f, "{}", self.code)
        } else {
            f.write_str("?")
        }
    }
}
