//! Seams to the transport and timer that drive the monitor.
//!
//! The monitor never performs I/O itself. At startup it asks a
//! [`Subscriber`] to start delivering heartbeats and a [`PeriodicTimer`] to
//! start ticking; afterwards the host feeds it through
//! [`NodeStatusMonitor::on_heartbeat`](crate::NodeStatusMonitor::on_heartbeat)
//! and [`NodeStatusMonitor::on_timer_tick`](crate::NodeStatusMonitor::on_timer_tick).

use std::time::Duration;

/// Transport-side subscription to node heartbeats.
pub trait Subscriber {
    /// Start delivering heartbeats.
    ///
    /// Follows the transport convention of a signed result code: `Ok` carries
    /// a non-negative code, `Err` a negative one.
    fn subscribe(&mut self) -> Result<i32, i32>;
}

/// A timer that calls back at a fixed period.
pub trait PeriodicTimer {
    fn start_periodic(&mut self, period: Duration);
}

impl<S: Subscriber + ?Sized> Subscriber for &mut S {
    fn subscribe(&mut self) -> Result<i32, i32> {
        (**self).subscribe()
    }
}

impl<T: PeriodicTimer + ?Sized> PeriodicTimer for &mut T {
    fn start_periodic(&mut self, period: Duration) {
        (**self).start_periodic(period)
    }
}
