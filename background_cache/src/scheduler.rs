//! Periodic sweep loop
//!
//! Runs one sweep per period on a single task, so sweeps never overlap.
//! The period is re-read before every wait, picking up a re-`init`.

use crate::manager::{BackgroundCacheManager, DEFAULT_PERIOD_MINUTES};
use cache_system::TrackingIds;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

impl BackgroundCacheManager {
    /// Spawn the sweep loop on the current tokio runtime until `cancel` fires
    pub fn spawn_scheduler(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                let period = sweep_interval(manager.period_minutes());

                tokio::select! {
                    () = tokio::time::sleep(period) => {}
                    () = cancel.cancelled() => break,
                }

                let tracking = TrackingIds::new();
                let report = manager.recache(&tracking, &cancel).await;
                if report.failed > 0 {
                    tracing::warn!(%tracking, ?report, "background sweep completed with failures");
                } else if report.due > 0 {
                    tracing::info!(%tracking, recached = report.recached, "background sweep completed");
                }
            }

            tracing::info!("background cache scheduler stopped");
        })
    }
}

fn sweep_interval(period_minutes: Option<i64>) -> Duration {
    let minutes = period_minutes
        .filter(|minutes| *minutes > 0)
        .unwrap_or(DEFAULT_PERIOD_MINUTES);
    Duration::from_secs(u64::try_from(minutes).unwrap_or(1).saturating_mul(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_interval_follows_period() {
        assert_eq!(sweep_interval(Some(1)), Duration::from_secs(60));
        assert_eq!(sweep_interval(Some(30)), Duration::from_secs(1800));
        assert_eq!(sweep_interval(None), Duration::from_secs(300));
        assert_eq!(sweep_interval(Some(0)), Duration::from_secs(300));
    }
}
