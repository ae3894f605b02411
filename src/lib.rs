//! # nodewatch
//!
//! Heartbeat-driven health monitor for nodes on a field bus.
//!
//! Every node on the bus periodically broadcasts a status heartbeat. The
//! monitor remembers the last reported health of each node, turns a node
//! [`HealthCode::Offline`] when its heartbeat stops arriving, and tells its
//! hooks whenever a node's health code changes. All state lives in a fixed
//! array sized for the whole address space, so memory use is constant and
//! nothing is allocated on the heartbeat or sweep paths.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      NodeStatusMonitor                       │
//! │                                                              │
//! │  transport ──▶ on_heartbeat ──┐                              │
//! │                               ▼                              │
//! │                        change_status ──▶ MonitorHooks        │
//! │                               ▲          (change events)     │
//! │  timer ─────▶ on_timer_tick ──┘                              │
//! │                               │                              │
//! │                               ▼                              │
//! │                        HealthTable [Entry; 127]              │
//! │                               ▲                              │
//! │  get_status / find_worst_status / forget_node                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`table`]**: the fixed-size [`HealthTable`] and its queries
//! - **[`monitor`]**: [`NodeStatusMonitor`], the update and decay paths
//! - **[`hooks`]**: the [`MonitorHooks`] observer trait and adapters
//! - **[`bus`]**: [`Subscriber`] and [`PeriodicTimer`], the seams to the transport and timer
//! - **[`config`]**: validated timing configuration, loadable from file and environment
//! - **[`driver`]** (`tokio` feature): runs a monitor on a tokio task fed by channels
//!
//! ## Features
//!
//! - `tokio` (default): the [`driver`] module
//!
//! The re-exported message types always implement serde's `Serialize` and
//! `Deserialize`, so change events can be shipped as JSON as-is.
//!
//! ## Example
//!
//! ```
//! use nodewatch::{HealthCode, Heartbeat, NodeId, NodeStatusMonitor, Recorder};
//!
//! let mut monitor = NodeStatusMonitor::new(Recorder::default());
//! let node = NodeId::new(12).unwrap();
//!
//! monitor.on_heartbeat(&Heartbeat::new(node, HealthCode::Ok));
//! assert!(monitor.get_status(node).known);
//!
//! monitor.forget_node(node);
//! assert!(!monitor.get_status(node).known);
//! assert_eq!(monitor.find_worst_status(), None);
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod hooks;
pub mod monitor;
pub mod table;

#[cfg(feature = "tokio")]
pub mod driver;

pub use bus::{PeriodicTimer, Subscriber};
pub use config::MonitorConfig;
pub use error::{MonitorError, PreconditionViolation};
pub use hooks::{on_change, MonitorHooks, OnChange, Recorder};
pub use monitor::NodeStatusMonitor;
pub use table::{Entry, HealthTable};

// Re-export types for convenience
pub use nodewatch_types::{
    HealthCode, Heartbeat, InvalidValue, NodeId, NodeStatus, NodeStatusChangeEvent,
    OFFLINE_TIMEOUT_MS,
};
