//! Error types for the monitor.
//!
//! Two classes of failure exist. Recoverable conditions (a transport that
//! refuses the subscription, a bad configuration) are returned as
//! [`MonitorError`]. Caller bugs such as looking up a node id outside the
//! unicast range are [`PreconditionViolation`]s: they are raised through
//! [`fatal`] and never returned.

use std::fmt;

use nodewatch_types::NodeId;
use thiserror::Error;

/// Errors that can be returned by the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The transport refused the heartbeat subscription.
    ///
    /// Carries the transport's own (negative) result code.
    #[error("heartbeat subscription failed with code {0}")]
    Subscribe(i32),

    /// The timing configuration is inconsistent.
    #[error("invalid monitor configuration: {0}")]
    Config(String),

    /// Configuration sources could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// A caller broke a documented precondition.
///
/// This is used as the panic payload raised by [`fatal`], so tests can
/// recover it with `std::panic::catch_unwind` and downcast the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionViolation {
    /// A node id outside `1..=127` was used to address the health table.
    NodeIdOutOfRange(NodeId),
}

impl fmt::Display for PreconditionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreconditionViolation::NodeIdOutOfRange(id) => {
                write!(f, "node id {} out of range 1..={}", id.get(), NodeId::MAX)
            }
        }
    }
}

impl std::error::Error for PreconditionViolation {}

/// Halt on a precondition violation.
///
/// Logs the violation and unwinds with the violation itself as payload.
/// Table state is never touched after this point.
#[track_caller]
pub fn fatal(violation: PreconditionViolation) -> ! {
    tracing::error!(%violation, "precondition violated");
    std::panic::panic_any(violation)
}
