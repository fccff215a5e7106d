//! Background reconciliation of sessions that ran past their end time.

use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::manager::AttendanceSessionManager;

/// Run `expire_due` every `period` until `shutdown` is cancelled.
pub fn spawn_expiry_sweeper(
    manager: AttendanceSessionManager,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "Expiry sweeper started");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(err) = manager.expire_due(Utc::now()).await {
                        warn!(error = %err, "Expiry sweep failed");
                    }
                }
            }
        }
        info!("Expiry sweeper stopped");
    })
}
