//! Background task that drives a monitor.

use std::sync::Arc;

use nodewatch_types::{NodeId, NodeStatus};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::channel::{ChannelSubscriber, IntervalTimer};
use crate::error::MonitorError;
use crate::hooks::MonitorHooks;
use crate::monitor::NodeStatusMonitor;

/// Entry point for running a monitor on the tokio runtime.
///
/// # Example
///
/// ```rust,no_run
/// use nodewatch::driver::{ChannelHooks, ChannelSubscriber, IntervalTimer, MonitorService};
/// use nodewatch::{HealthCode, Heartbeat, NodeId, NodeStatusMonitor};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (hooks, mut changes) = ChannelHooks::create(64);
///     let (heartbeats, subscriber) = ChannelSubscriber::create(64);
///
///     let handle = MonitorService::spawn(
///         NodeStatusMonitor::new(hooks),
///         subscriber,
///         IntervalTimer::new(),
///     )?;
///
///     heartbeats
///         .send(Heartbeat::new(NodeId::new(5).unwrap(), HealthCode::Ok))
///         .await?;
///
///     while let Some(event) = changes.recv().await {
///         println!("node {}: {} -> {}", event.node_id, event.old_status, event.status);
///     }
///
///     handle.stop().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MonitorService;

impl MonitorService {
    /// Start the monitor and spawn the task that feeds it.
    ///
    /// Fails without spawning anything if the subscription is refused.
    /// Must be called from within a tokio runtime.
    pub fn spawn<H>(
        mut monitor: NodeStatusMonitor<H>,
        mut subscriber: ChannelSubscriber,
        mut timer: IntervalTimer,
    ) -> Result<MonitorHandle<H>, MonitorError>
    where
        H: MonitorHooks + Send + 'static,
    {
        monitor.start(&mut subscriber, &mut timer)?;

        let mut heartbeats = subscriber
            .take_receiver()
            .ok_or(MonitorError::Subscribe(ChannelSubscriber::ERR_TAKEN))?;
        let period = monitor.config().timer_period();

        let monitor = Arc::new(Mutex::new(monitor));
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task_monitor = monitor.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        task_monitor.lock().on_timer_tick();
                    }
                    received = heartbeats.recv() => match received {
                        Some(heartbeat) if heartbeat.source.is_unicast() => {
                            task_monitor.lock().on_heartbeat(&heartbeat);
                        }
                        Some(heartbeat) => {
                            warn!(source = heartbeat.source.get(), "dropping heartbeat from non-unicast source");
                        }
                        None => {
                            info!("heartbeat channel closed, stopping monitor");
                            break;
                        }
                    },
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(MonitorHandle {
            monitor,
            stop_tx,
            task,
        })
    }
}

/// Handle to a running monitor.
///
/// Queries take the monitor lock briefly. Dropping the handle stops the
/// task; call [`stop`](Self::stop) to wait for it to finish.
#[derive(Debug)]
pub struct MonitorHandle<H> {
    monitor: Arc<Mutex<NodeStatusMonitor<H>>>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<H: MonitorHooks> MonitorHandle<H> {
    /// See [`NodeStatusMonitor::get_status`].
    pub fn status(&self, id: NodeId) -> NodeStatus {
        self.monitor.lock().get_status(id)
    }

    /// See [`NodeStatusMonitor::find_worst_status`].
    pub fn worst(&self) -> Option<NodeId> {
        self.monitor.lock().find_worst_status()
    }

    /// See [`NodeStatusMonitor::forget_node`].
    pub fn forget(&self, id: NodeId) {
        self.monitor.lock().forget_node(id)
    }

    /// Run a closure against the monitor under its lock.
    ///
    /// The closure must not call back into this handle.
    pub fn with_monitor<R>(&self, f: impl FnOnce(&mut NodeStatusMonitor<H>) -> R) -> R {
        let mut guard = self.monitor.lock();
        f(&mut *guard)
    }

    /// True until the task has exited.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the task and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }

    /// Wait for the task to exit on its own, i.e. when every heartbeat
    /// sender has been dropped.
    pub async fn closed(self) {
        let _ = self.task.await;
    }
}
