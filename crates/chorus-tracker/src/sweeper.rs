//! Background eviction of records that expired without firing.

use crate::tracker::Tracker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Handle to the periodic sweep task.
///
/// Dropping the handle also stops the task at its next wake-up.
pub struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep loop on the current tokio runtime.
    ///
    /// The first sweep runs one `period` after spawning.
    pub fn spawn(tracker: Arc<Tracker>, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(sweep_loop(tracker, period, rx));
        info!("sweeper started (every {}s)", period.as_secs_f64());
        Self { shutdown, handle }
    }

    /// Stop scheduling sweeps and wait for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("sweeper task ended abnormally: {e}");
        }
    }
}

async fn sweep_loop(tracker: Arc<Tracker>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = tracker.sweep(chrono::Utc::now());
                let stats = tracker.stats();
                if removed > 0 {
                    info!(
                        "sweeper: removed {removed} expired records ({} left in {} chats)",
                        stats.records, stats.chats
                    );
                } else {
                    debug!("sweeper: nothing expired ({} records)", stats.records);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("sweeper stopped");
}
