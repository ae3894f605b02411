//! The node status monitor.
//!
//! Tracks the last reported health of every node, demotes silent nodes to
//! [`HealthCode::Offline`], and notifies its hooks on every change of health
//! code. Heartbeats and sweeps both funnel through a single state transition,
//! so change detection is identical no matter what triggered it.

use nodewatch_types::{HealthCode, Heartbeat, NodeId, NodeStatus, NodeStatusChangeEvent};
use tracing::{debug, trace, warn};

use crate::bus::{PeriodicTimer, Subscriber};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::hooks::MonitorHooks;
use crate::table::{Entry, HealthTable};

/// Heartbeat-driven health monitor for every node on the bus.
///
/// The monitor is single-threaded: every entry point takes `&mut self`, so
/// the host has to serialize heartbeat delivery, timer ticks and queries.
///
/// # Example
///
/// ```rust
/// use nodewatch::{HealthCode, Heartbeat, NodeId, NodeStatusMonitor, Recorder};
///
/// let mut monitor = NodeStatusMonitor::new(Recorder::default());
/// let node = NodeId::new(10).unwrap();
///
/// monitor.on_heartbeat(&Heartbeat::new(node, HealthCode::Warning));
///
/// assert_eq!(monitor.get_status(node).code(), Some(HealthCode::Warning));
/// assert_eq!(monitor.find_worst_status(), Some(node));
/// assert_eq!(monitor.hooks().changes.len(), 1);
/// ```
#[derive(Debug)]
pub struct NodeStatusMonitor<H = ()> {
    table: HealthTable,
    hooks: H,
    config: MonitorConfig,
    started: bool,
}

impl<H: MonitorHooks> NodeStatusMonitor<H> {
    /// Create a monitor with the protocol default timing.
    pub fn new(hooks: H) -> Self {
        Self::with_config(hooks, MonitorConfig::default())
    }

    /// Create a monitor with explicit timing.
    pub fn with_config(hooks: H, config: MonitorConfig) -> Self {
        Self {
            table: HealthTable::new(),
            hooks,
            config,
            started: false,
        }
    }

    /// Subscribe to heartbeats and, if that succeeds, arm the sweep timer.
    ///
    /// Returns the subscriber's non-negative result code on success. On
    /// failure the timer is left alone and the monitor stays inert; calling
    /// `start` again retries the subscription.
    pub fn start<S, T>(&mut self, subscriber: &mut S, timer: &mut T) -> Result<i32, MonitorError>
    where
        S: Subscriber + ?Sized,
        T: PeriodicTimer + ?Sized,
    {
        match subscriber.subscribe() {
            Ok(code) => {
                let period = self.config.timer_period();
                timer.start_periodic(period);
                self.started = true;
                debug!(?period, code, "node status monitor started");
                Ok(code)
            }
            Err(code) => {
                warn!(code, "heartbeat subscription failed, monitor not started");
                Err(MonitorError::Subscribe(code))
            }
        }
    }

    /// Whether [`start`](Self::start) has succeeded.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Ingest a heartbeat from the transport.
    ///
    /// The sender's entry is refreshed unconditionally; hooks see a change
    /// event only if the reported code differs from the stored one. The raw
    /// heartbeat is forwarded to [`MonitorHooks::on_heartbeat`] afterwards.
    pub fn on_heartbeat(&mut self, heartbeat: &Heartbeat) {
        self.change_status(heartbeat.source, Entry::fresh(heartbeat.code));
        self.hooks.on_heartbeat(heartbeat);
    }

    /// Age every live node by one timer period and take down the ones whose
    /// heartbeat is overdue.
    ///
    /// Offline nodes are not aged further; their staleness stays pinned at
    /// the timeout until a new heartbeat arrives.
    pub fn on_timer_tick(&mut self) {
        if !self.started {
            warn!("timer tick before the monitor was started, ignoring");
            return;
        }

        let period = self.config.period_ms100();
        let timeout = self.config.offline_timeout_ms100();

        for id in NodeId::unicast() {
            let entry = self.table.entry_mut(id);
            if !entry.is_known() || entry.code == HealthCode::Offline {
                continue;
            }
            entry.age_ms100 += period;
            if entry.age_ms100 >= timeout {
                self.change_status(
                    id,
                    Entry {
                        age_ms100: timeout,
                        code: HealthCode::Offline,
                    },
                );
            }
        }
    }

    /// Forget everything known about a node, as if it was never seen.
    ///
    /// No change event is emitted.
    ///
    /// # Panics
    ///
    /// Raises a [`PreconditionViolation`](crate::PreconditionViolation) if
    /// `id` is not in `1..=127`.
    pub fn forget_node(&mut self, id: NodeId) {
        *self.table.entry_mut(id) = Entry::UNKNOWN;
        debug!(node = id.get(), "node forgotten");
    }

    /// Last known status of a node.
    ///
    /// # Panics
    ///
    /// Raises a [`PreconditionViolation`](crate::PreconditionViolation) if
    /// `id` is not in `1..=127`.
    pub fn get_status(&self, id: NodeId) -> NodeStatus {
        self.table.status(id)
    }

    /// The known node with the worst health, lowest id first on ties.
    pub fn find_worst_status(&self) -> Option<NodeId> {
        self.table.worst()
    }

    /// Read-only view of the health table.
    pub fn table(&self) -> &HealthTable {
        &self.table
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Consume the monitor and return its hooks.
    pub fn into_hooks(self) -> H {
        self.hooks
    }

    fn change_status(&mut self, id: NodeId, new_entry: Entry) {
        let current = *self.table.entry(id);
        if current.code != new_entry.code {
            let event = NodeStatusChangeEvent {
                node_id: id,
                old_status: NodeStatus {
                    known: current.is_known(),
                    code: current.code,
                },
                status: NodeStatus::known(new_entry.code),
            };
            let state = if event.old_status.known { "known" } else { "new" };
            trace!(
                node = id.get(),
                state,
                old = %event.old_status.code,
                new = %event.status.code,
                "node status change"
            );
            self.hooks.on_status_change(&event, &self.table);
        }
        *self.table.entry_mut(id) = new_entry;
    }
}

impl Default for NodeStatusMonitor<()> {
    fn default() -> Self {
        Self::new(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreconditionViolation;
    use crate::hooks::{on_change, Recorder};
    use std::panic::{self, AssertUnwindSafe};
    use std::time::Duration;

    struct MockSubscriber {
        result: Result<i32, i32>,
        calls: usize,
    }

    impl MockSubscriber {
        fn accepting() -> Self {
            Self {
                result: Ok(0),
                calls: 0,
            }
        }

        fn refusing(code: i32) -> Self {
            Self {
                result: Err(code),
                calls: 0,
            }
        }
    }

    impl Subscriber for MockSubscriber {
        fn subscribe(&mut self) -> Result<i32, i32> {
            self.calls += 1;
            self.result
        }
    }

    #[derive(Default)]
    struct MockTimer {
        armed: Option<Duration>,
    }

    impl PeriodicTimer for MockTimer {
        fn start_periodic(&mut self, period: Duration) {
            self.armed = Some(period);
        }
    }

    fn node(raw: u8) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    fn started_monitor() -> NodeStatusMonitor<Recorder> {
        let mut monitor = NodeStatusMonitor::new(Recorder::default());
        monitor
            .start(&mut MockSubscriber::accepting(), &mut MockTimer::default())
            .unwrap();
        monitor
    }

    fn beat(monitor: &mut NodeStatusMonitor<Recorder>, raw: u8, code: HealthCode) {
        monitor.on_heartbeat(&Heartbeat::new(node(raw), code));
    }

    fn tick(monitor: &mut NodeStatusMonitor<Recorder>, times: u32) {
        for _ in 0..times {
            monitor.on_timer_tick();
        }
    }

    fn assert_violation<R>(f: impl FnOnce() -> R) -> PreconditionViolation {
        let payload = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(_) => panic!("expected a precondition violation"),
            Err(payload) => payload,
        };
        *payload
            .downcast_ref::<PreconditionViolation>()
            .expect("panic payload should be a PreconditionViolation")
    }

    // ========================================================================
    // Startup
    // ========================================================================

    #[test]
    fn start_arms_timer_with_configured_period() {
        let config = MonitorConfig::new(500, 3000).unwrap();
        let mut monitor = NodeStatusMonitor::with_config((), config);
        let mut subscriber = MockSubscriber::accepting();
        let mut timer = MockTimer::default();

        assert_eq!(monitor.start(&mut subscriber, &mut timer).unwrap(), 0);
        assert!(monitor.is_started());
        assert_eq!(timer.armed, Some(Duration::from_millis(500)));
    }

    #[test]
    fn start_passes_through_positive_codes() {
        let mut monitor = NodeStatusMonitor::new(());
        let mut subscriber = MockSubscriber {
            result: Ok(3),
            calls: 0,
        };
        let code = monitor
            .start(&mut subscriber, &mut MockTimer::default())
            .unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn failed_subscription_leaves_timer_unarmed() {
        let mut monitor = NodeStatusMonitor::new(());
        let mut subscriber = MockSubscriber::refusing(-2);
        let mut timer = MockTimer::default();

        let err = monitor.start(&mut subscriber, &mut timer).unwrap_err();
        assert!(matches!(err, MonitorError::Subscribe(-2)));
        assert!(!monitor.is_started());
        assert_eq!(timer.armed, None);
    }

    #[test]
    fn start_can_be_retried_after_failure() {
        let mut monitor = NodeStatusMonitor::new(());
        let mut subscriber = MockSubscriber::refusing(-1);
        let mut timer = MockTimer::default();

        assert!(monitor.start(&mut subscriber, &mut timer).is_err());
        subscriber.result = Ok(0);
        assert!(monitor.start(&mut subscriber, &mut timer).is_ok());
        assert_eq!(subscriber.calls, 2);
        assert!(timer.armed.is_some());
    }

    #[test]
    fn ticks_before_start_do_not_decay() {
        let mut monitor = NodeStatusMonitor::new(Recorder::default());
        beat(&mut monitor, 4, HealthCode::Ok);
        tick(&mut monitor, 100);
        assert_eq!(monitor.get_status(node(4)), NodeStatus::known(HealthCode::Ok));
        assert_eq!(monitor.hooks().changes.len(), 1);
    }

    // ========================================================================
    // Heartbeats
    // ========================================================================

    #[test]
    fn never_observed_nodes_are_unknown() {
        let monitor = started_monitor();
        for id in NodeId::unicast() {
            assert!(!monitor.get_status(id).known);
        }
        assert_eq!(monitor.find_worst_status(), None);
    }

    #[test]
    fn first_heartbeat_emits_one_event() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 7, HealthCode::Error);

        assert_eq!(monitor.get_status(node(7)), NodeStatus::known(HealthCode::Error));
        let changes = &monitor.hooks().changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].node_id, node(7));
        assert!(!changes[0].old_status.known);
        assert_eq!(changes[0].status, NodeStatus::known(HealthCode::Error));
    }

    #[test]
    fn first_heartbeat_reporting_ok_fires() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 7, HealthCode::Ok);
        assert!(monitor.get_status(node(7)).known);

        let changes = &monitor.hooks().changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_status, NodeStatus::UNKNOWN);
    }

    #[test]
    fn repeated_code_is_silent() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 3, HealthCode::Warning);
        beat(&mut monitor, 3, HealthCode::Warning);
        beat(&mut monitor, 3, HealthCode::Warning);

        assert_eq!(monitor.hooks().changes.len(), 1);
        assert_eq!(monitor.hooks().heartbeats.len(), 3);
    }

    #[test]
    fn code_change_reports_previous_code() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 3, HealthCode::Warning);
        beat(&mut monitor, 3, HealthCode::Critical);

        let last = monitor.hooks().changes.last().copied().unwrap();
        assert_eq!(last.old_status, NodeStatus::known(HealthCode::Warning));
        assert_eq!(last.status, NodeStatus::known(HealthCode::Critical));
    }

    #[test]
    fn every_heartbeat_is_forwarded() {
        let mut monitor = started_monitor();
        let hb = Heartbeat::new(node(8), HealthCode::Ok).with_uptime(42);
        monitor.on_heartbeat(&hb);
        monitor.on_heartbeat(&hb);
        assert_eq!(monitor.hooks().heartbeats, vec![hb, hb]);
    }

    #[test]
    fn hook_sees_table_before_overwrite() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut monitor = NodeStatusMonitor::new(on_change(move |event, table| {
            sink.borrow_mut().push(table.status(event.node_id));
        }));

        let id = node(11);
        monitor.on_heartbeat(&Heartbeat::new(id, HealthCode::Warning));
        monitor.on_heartbeat(&Heartbeat::new(id, HealthCode::Critical));

        assert_eq!(
            *seen.borrow(),
            vec![NodeStatus::UNKNOWN, NodeStatus::known(HealthCode::Warning)]
        );
        assert_eq!(monitor.get_status(id), NodeStatus::known(HealthCode::Critical));
    }

    // ========================================================================
    // Decay
    // ========================================================================

    #[test]
    fn silent_node_goes_offline_once() {
        let mut monitor = started_monitor();
        let sweeps = monitor.config().sweeps_to_offline();
        beat(&mut monitor, 5, HealthCode::Warning);
        monitor.hooks_mut().take_changes();

        tick(&mut monitor, sweeps - 1);
        assert_eq!(monitor.get_status(node(5)).code, HealthCode::Warning);
        assert!(monitor.hooks().changes.is_empty());

        tick(&mut monitor, 1);
        assert_eq!(monitor.get_status(node(5)), NodeStatus::known(HealthCode::Offline));
        let changes = monitor.hooks_mut().take_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_status, NodeStatus::known(HealthCode::Warning));
        assert!(changes[0].went_offline());

        tick(&mut monitor, 50);
        assert!(monitor.hooks().changes.is_empty());
    }

    #[test]
    fn offline_staleness_is_pinned_at_timeout() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 5, HealthCode::Ok);
        tick(&mut monitor, 1000);

        let entry = monitor.table().entry(node(5));
        assert_eq!(entry.code(), HealthCode::Offline);
        assert_eq!(entry.age_ms100(), Some(20));
    }

    #[test]
    fn staleness_accumulates_per_period() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 5, HealthCode::Ok);
        tick(&mut monitor, 2);
        assert_eq!(monitor.table().entry(node(5)).age_ms100(), Some(8));
    }

    #[test]
    fn repeated_heartbeat_resets_staleness() {
        let mut monitor = started_monitor();
        let sweeps = monitor.config().sweeps_to_offline();
        beat(&mut monitor, 1, HealthCode::Error);
        beat(&mut monitor, 2, HealthCode::Error);

        tick(&mut monitor, sweeps - 1);
        beat(&mut monitor, 2, HealthCode::Error);
        monitor.hooks_mut().take_changes();

        tick(&mut monitor, 1);
        assert_eq!(monitor.get_status(node(1)).code, HealthCode::Offline);
        assert_eq!(monitor.get_status(node(2)).code, HealthCode::Error);

        tick(&mut monitor, sweeps - 2);
        assert_eq!(monitor.get_status(node(2)).code, HealthCode::Error);

        tick(&mut monitor, 1);
        assert_eq!(monitor.get_status(node(2)).code, HealthCode::Offline);

        let offline: Vec<_> = monitor
            .hooks()
            .changes
            .iter()
            .map(|e| e.node_id.get())
            .collect();
        assert_eq!(offline, vec![1, 2]);
    }

    #[test]
    fn heartbeat_revives_offline_node() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 9, HealthCode::Ok);
        tick(&mut monitor, 10);
        monitor.hooks_mut().take_changes();

        beat(&mut monitor, 9, HealthCode::Warning);
        let changes = monitor.hooks_mut().take_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_status, NodeStatus::known(HealthCode::Offline));
        assert_eq!(changes[0].status, NodeStatus::known(HealthCode::Warning));
        assert!(changes[0].came_back());
        assert_eq!(monitor.table().entry(node(9)).age_ms100(), Some(0));
    }

    #[test]
    fn reported_offline_code_stops_decay_without_timeout_event() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 6, HealthCode::Offline);
        monitor.hooks_mut().take_changes();

        tick(&mut monitor, 20);
        assert!(monitor.hooks().changes.is_empty());
        assert_eq!(monitor.table().entry(node(6)).age_ms100(), Some(0));
    }

    #[test]
    fn unknown_nodes_never_decay() {
        let mut monitor = started_monitor();
        tick(&mut monitor, 100);
        assert_eq!(monitor.table().known_count(), 0);
        assert!(monitor.hooks().changes.is_empty());
    }

    #[test]
    fn single_sweep_timeout() {
        let config = MonitorConfig::new(1000, 1000).unwrap();
        let mut monitor = NodeStatusMonitor::with_config(Recorder::default(), config);
        monitor
            .start(&mut MockSubscriber::accepting(), &mut MockTimer::default())
            .unwrap();

        beat(&mut monitor, 2, HealthCode::Ok);
        tick(&mut monitor, 1);
        assert_eq!(monitor.get_status(node(2)).code, HealthCode::Offline);
        assert_eq!(monitor.table().entry(node(2)).age_ms100(), Some(10));
    }

    // ========================================================================
    // Queries and forget
    // ========================================================================

    #[test]
    fn worst_status_scenarios() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 1, HealthCode::Ok);
        beat(&mut monitor, 2, HealthCode::Critical);
        assert_eq!(monitor.find_worst_status(), Some(node(2)));

        let mut monitor = started_monitor();
        beat(&mut monitor, 1, HealthCode::Warning);
        beat(&mut monitor, 2, HealthCode::Warning);
        assert_eq!(monitor.find_worst_status(), Some(node(1)));
    }

    #[test]
    fn worst_status_tracks_timeouts() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 30, HealthCode::Critical);
        beat(&mut monitor, 60, HealthCode::Ok);
        tick(&mut monitor, 3);
        beat(&mut monitor, 30, HealthCode::Critical);
        tick(&mut monitor, 2);

        // 60 timed out while 30 kept reporting.
        assert_eq!(monitor.find_worst_status(), Some(node(60)));
    }

    #[test]
    fn forget_resets_without_event() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 12, HealthCode::Critical);
        monitor.hooks_mut().take_changes();

        monitor.forget_node(node(12));
        assert!(!monitor.get_status(node(12)).known);
        assert!(monitor.hooks().changes.is_empty());
        assert_eq!(monitor.find_worst_status(), None);
    }

    #[test]
    fn forgotten_node_reappears_as_new() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 12, HealthCode::Warning);
        monitor.forget_node(node(12));
        monitor.hooks_mut().take_changes();

        beat(&mut monitor, 12, HealthCode::Warning);
        let changes = monitor.hooks_mut().take_changes();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].is_first_sighting());
    }

    #[test]
    fn forgotten_node_does_not_decay() {
        let mut monitor = started_monitor();
        beat(&mut monitor, 12, HealthCode::Warning);
        monitor.forget_node(node(12));
        monitor.hooks_mut().take_changes();

        tick(&mut monitor, 20);
        assert!(monitor.hooks().changes.is_empty());
    }

    #[test]
    fn out_of_range_ids_are_precondition_violations() {
        let mut monitor = started_monitor();

        let violation = assert_violation(|| monitor.get_status(NodeId::from_raw(0)));
        assert_eq!(
            violation,
            PreconditionViolation::NodeIdOutOfRange(NodeId::BROADCAST)
        );

        let violation = assert_violation(|| monitor.forget_node(NodeId::from_raw(128)));
        assert_eq!(
            violation,
            PreconditionViolation::NodeIdOutOfRange(NodeId::from_raw(128))
        );

        let violation = assert_violation(|| {
            monitor.on_heartbeat(&Heartbeat::new(NodeId::from_raw(255), HealthCode::Ok))
        });
        assert_eq!(
            violation,
            PreconditionViolation::NodeIdOutOfRange(NodeId::from_raw(255))
        );

        assert_eq!(monitor.table().known_count(), 0);
        assert!(monitor.hooks().heartbeats.is_empty());
    }
}
