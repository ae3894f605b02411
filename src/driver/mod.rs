//! Tokio driver for the monitor.
//!
//! Runs a [`NodeStatusMonitor`](crate::NodeStatusMonitor) on a single task
//! that multiplexes heartbeats from a channel, sweep ticks from an interval,
//! and a stop signal. The monitor lives behind a mutex so that the handle
//! can query it while the task is running.
//!
//! ```text
//!  mpsc::Sender<Heartbeat> ──▶ ChannelSubscriber ──┐
//!                                                  ▼
//!  IntervalTimer ─────────────────────▶ MonitorService task ──▶ ChannelHooks ──▶ events
//!                                                  ▲
//!  MonitorHandle (queries, stop) ──────────────────┘
//! ```

mod channel;
mod service;

pub use channel::{ChannelHooks, ChannelSubscriber, IntervalTimer};
pub use service::{MonitorHandle, MonitorService};
