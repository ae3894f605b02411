//! Example: Simulated bus
//!
//! Runs a monitor against three simulated nodes:
//! - node 10 reports OK the whole time
//! - node 20 degrades from OK to WARNING to CRITICAL
//! - node 30 goes silent after two seconds and is taken offline
//!
//! Timing can be overridden with a config file or `NODEWATCH_*` variables.
//! Set `NODEWATCH_JSON=1` to print change events as JSON lines.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=nodewatch=trace cargo run --example bus_simulation
//! cargo run --example bus_simulation -- monitor.toml
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use nodewatch::driver::{ChannelHooks, ChannelSubscriber, IntervalTimer, MonitorService};
use nodewatch::{HealthCode, Heartbeat, MonitorConfig, NodeId, NodeStatusMonitor};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const PUBLISH_PERIOD: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = MonitorConfig::load(config_path.as_deref())?;
    println!(
        "Sweeping every {}ms, offline after {}ms of silence\n",
        config.timer_period_ms(),
        config.offline_timeout_ms()
    );

    let (hooks, mut changes) = ChannelHooks::create(64);
    let (tx, subscriber) = ChannelSubscriber::create(64);
    let handle = MonitorService::spawn(
        NodeStatusMonitor::with_config(hooks, config),
        subscriber,
        IntervalTimer::new(),
    )?;

    spawn_node(tx.clone(), 10, |_| Some(HealthCode::Ok));
    spawn_node(tx.clone(), 20, |round| {
        Some(match round {
            0..=3 => HealthCode::Ok,
            4..=7 => HealthCode::Warning,
            _ => HealthCode::Critical,
        })
    });
    spawn_node(tx, 30, |round| (round < 4).then_some(HealthCode::Ok));

    let json = std::env::var_os("NODEWATCH_JSON").is_some();
    let deadline = tokio::time::sleep(Duration::from_secs(8));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            Some(event) = changes.recv() => {
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    println!(
                        "node {:>3}: {:>4} -> {:<4}",
                        event.node_id, event.old_status, event.status
                    );
                }
            }
            _ = &mut deadline => break,
        }
    }

    if let Some(worst) = handle.worst() {
        println!("\nWorst node: {} ({})", worst, handle.status(worst));
    }
    handle.stop().await;
    Ok(())
}

/// Publish heartbeats for one node until `script` returns `None`.
fn spawn_node(
    tx: mpsc::Sender<Heartbeat>,
    raw_id: u8,
    script: impl Fn(u32) -> Option<HealthCode> + Send + 'static,
) {
    let Some(id) = NodeId::new(raw_id) else {
        return;
    };
    tokio::spawn(async move {
        let mut round = 0;
        while let Some(code) = script(round) {
            let heartbeat = Heartbeat::new(id, code).with_uptime(round / 2);
            if tx.send(heartbeat).await.is_err() {
                break;
            }
            round += 1;
            tokio::time::sleep(PUBLISH_PERIOD).await;
        }
    });
}
