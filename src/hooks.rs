//! Observer hooks invoked by the monitor.

use nodewatch_types::{Heartbeat, NodeStatusChangeEvent};

use crate::table::HealthTable;

/// Capabilities the monitor calls out to.
///
/// Both methods default to doing nothing, so an implementation only
/// overrides what it cares about. `()` is the hook set that ignores
/// everything.
///
/// # Example
///
/// ```rust
/// use nodewatch::{HealthTable, MonitorHooks, NodeStatusChangeEvent};
///
/// #[derive(Default)]
/// struct OfflineCounter {
///     offline: usize,
/// }
///
/// impl MonitorHooks for OfflineCounter {
///     fn on_status_change(&mut self, event: &NodeStatusChangeEvent, _table: &HealthTable) {
///         if event.went_offline() {
///             self.offline += 1;
///         }
///     }
/// }
/// ```
pub trait MonitorHooks {
    /// Called when a node's health code changes.
    ///
    /// Runs synchronously before the table is updated, so `table` still
    /// shows the previous status of `event.node_id`.
    fn on_status_change(&mut self, event: &NodeStatusChangeEvent, table: &HealthTable) {
        let _ = (event, table);
    }

    /// Called for every ingested heartbeat, after the table was updated.
    fn on_heartbeat(&mut self, heartbeat: &Heartbeat) {
        let _ = heartbeat;
    }
}

impl MonitorHooks for () {}

impl<H: MonitorHooks + ?Sized> MonitorHooks for Box<H> {
    fn on_status_change(&mut self, event: &NodeStatusChangeEvent, table: &HealthTable) {
        (**self).on_status_change(event, table)
    }

    fn on_heartbeat(&mut self, heartbeat: &Heartbeat) {
        (**self).on_heartbeat(heartbeat)
    }
}

/// Adapts a closure into a change hook.
///
/// ```rust
/// use nodewatch::{on_change, NodeStatusMonitor};
///
/// let monitor = NodeStatusMonitor::new(on_change(|event, _table| {
///     println!("node {} is now {}", event.node_id, event.status);
/// }));
/// ```
pub fn on_change<F>(f: F) -> OnChange<F>
where
    F: FnMut(&NodeStatusChangeEvent, &HealthTable),
{
    OnChange(f)
}

/// Change hook backed by a closure. Created by [`on_change`].
pub struct OnChange<F>(F);

impl<F> MonitorHooks for OnChange<F>
where
    F: FnMut(&NodeStatusChangeEvent, &HealthTable),
{
    fn on_status_change(&mut self, event: &NodeStatusChangeEvent, table: &HealthTable) {
        (self.0)(event, table)
    }
}

impl<F> std::fmt::Debug for OnChange<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnChange").finish_non_exhaustive()
    }
}

/// Hook set that records everything it sees. Handy in tests and demos.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub changes: Vec<NodeStatusChangeEvent>,
    pub heartbeats: Vec<Heartbeat>,
}

impl MonitorHooks for Recorder {
    fn on_status_change(&mut self, event: &NodeStatusChangeEvent, _table: &HealthTable) {
        self.changes.push(*event);
    }

    fn on_heartbeat(&mut self, heartbeat: &Heartbeat) {
        self.heartbeats.push(*heartbeat);
    }
}

impl Recorder {
    /// Take the recorded change events, leaving the recorder empty.
    pub fn take_changes(&mut self) -> Vec<NodeStatusChangeEvent> {
        std::mem::take(&mut self.changes)
    }
}
