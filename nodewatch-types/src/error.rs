//! Conversion errors for raw protocol values.

use core::fmt;

/// A raw value could not be converted into one of the protocol types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidValue {
    /// The byte is not a unicast or broadcast node address.
    NodeId(u8),
    /// The byte is not a defined health code.
    HealthCode(u8),
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidValue::NodeId(raw) => write!(f, "invalid node id: {}", raw),
            InvalidValue::HealthCode(raw) => write!(f, "invalid health code: {}", raw),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidValue {}
