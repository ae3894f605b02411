//! Channel-backed transport, timer and hooks.

use std::time::Duration;

use nodewatch_types::{Heartbeat, NodeStatusChangeEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{trace, warn};

use crate::bus::{PeriodicTimer, Subscriber};
use crate::hooks::MonitorHooks;
use crate::table::HealthTable;

/// Heartbeat subscription over a tokio mpsc channel.
///
/// Whatever decodes heartbeats off the bus pushes them into the sending half;
/// the [`MonitorService`](super::MonitorService) drains the receiving half.
#[derive(Debug)]
pub struct ChannelSubscriber {
    receiver: Option<mpsc::Receiver<Heartbeat>>,
}

impl ChannelSubscriber {
    /// Result code when every sender was already dropped.
    pub const ERR_CLOSED: i32 = -1;
    /// Result code when the receiver was already handed to a running service.
    pub const ERR_TAKEN: i32 = -2;

    pub fn new(receiver: mpsc::Receiver<Heartbeat>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Create a channel pair.
    ///
    /// Returns (sender, subscriber) where the sender is handed to the code
    /// that receives heartbeats from the bus.
    pub fn create(buffer: usize) -> (mpsc::Sender<Heartbeat>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }

    pub(crate) fn take_receiver(&mut self) -> Option<mpsc::Receiver<Heartbeat>> {
        self.receiver.take()
    }
}

impl Subscriber for ChannelSubscriber {
    fn subscribe(&mut self) -> Result<i32, i32> {
        match &self.receiver {
            Some(rx) if rx.is_closed() => Err(Self::ERR_CLOSED),
            Some(_) => Ok(0),
            None => Err(Self::ERR_TAKEN),
        }
    }
}

/// Timer seam for the service. Remembers the period it was armed with.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalTimer {
    period: Option<Duration>,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The armed period, if any.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl PeriodicTimer for IntervalTimer {
    fn start_periodic(&mut self, period: Duration) {
        self.period = Some(period);
    }
}

/// Hooks that forward change events, and optionally heartbeats, into
/// bounded channels.
///
/// Sends never block, so forwarding is safe while the monitor lock is held.
/// When a receiver falls behind and its buffer is full, further messages are
/// dropped with a warning; once a receiver is gone they are dropped silently.
#[derive(Debug, Clone)]
pub struct ChannelHooks {
    changes: mpsc::Sender<NodeStatusChangeEvent>,
    heartbeats: Option<mpsc::Sender<Heartbeat>>,
}

impl ChannelHooks {
    /// Create hooks and the receiver for change events, buffering at most
    /// `buffer` undelivered events.
    pub fn create(buffer: usize) -> (Self, mpsc::Receiver<NodeStatusChangeEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                changes: tx,
                heartbeats: None,
            },
            rx,
        )
    }

    /// Also forward every heartbeat, buffering at most `buffer` of them.
    /// Returns the heartbeat receiver.
    pub fn forward_heartbeats(&mut self, buffer: usize) -> mpsc::Receiver<Heartbeat> {
        let (tx, rx) = mpsc::channel(buffer);
        self.heartbeats = Some(tx);
        rx
    }
}

impl MonitorHooks for ChannelHooks {
    fn on_status_change(&mut self, event: &NodeStatusChangeEvent, _table: &HealthTable) {
        match self.changes.try_send(*event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(node = event.node_id.get(), "change buffer full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                trace!(node = event.node_id.get(), "change receiver dropped");
            }
        }
    }

    fn on_heartbeat(&mut self, heartbeat: &Heartbeat) {
        if let Some(tx) = &self.heartbeats {
            match tx.try_send(*heartbeat) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    trace!(source = heartbeat.source.get(), "heartbeat buffer full, dropping");
                }
                Err(TrySendError::Closed(_)) => {
                    // Receiver dropped, stop forwarding
                    self.heartbeats = None;
                }
            }
        }
    }
}
