//! Background sync scheduler.
//!
//! A single tokio task that waits for a poll tick, a manual trigger or
//! shutdown, then checks which syncs are due and runs them on the blocking
//! pool. Nothing runs before the first wake-up.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use spots::{SchedulerConfig, Spots, SyncScheduler};
//! # async fn example() -> spots::Result<()> {
//! let spots = Arc::new(Spots::builder().build()?);
//! let handle = SyncScheduler::new(spots, SchedulerConfig::default()).spawn();
//! handle.trigger();
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config;
use crate::error::{Result, SpotsError};
use crate::models::SyncReport;
use crate::Spots;

pub const CARD_SYNC_STATUS: &str = "Syncing card data...";
pub const PRICE_SYNC_STATUS: &str = "Syncing prices...";

/// Timing of the scheduler loop.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Sleep between due-checks when nothing triggers the scheduler.
    pub poll_interval: Duration,
    /// Pause after a failed sync before checking again.
    pub error_cooldown: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: config::POLL_INTERVAL,
            error_cooldown: config::ERROR_COOLDOWN,
        }
    }
}

// ---------------------------------------------------------------------------
// SchedulerHandle
// ---------------------------------------------------------------------------

/// Control side of a running scheduler.
pub struct SchedulerHandle {
    notify: Arc<Notify>,
    force: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Wake the scheduler to run whatever syncs are due. Triggers that arrive
    /// before the scheduler gets to them collapse into one wake-up.
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    /// Wake the scheduler and run both syncs regardless of their schedule.
    pub fn force(&self) {
        self.force.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop and wait for it. An import that is already running is
    /// finished first; remaining sets are skipped.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| SpotsError::Join(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// SyncScheduler
// ---------------------------------------------------------------------------

pub struct SyncScheduler {
    spots: Arc<Spots>,
    config: SchedulerConfig,
}

impl SyncScheduler {
    pub fn new(spots: Arc<Spots>, config: SchedulerConfig) -> Self {
        Self { spots, config }
    }

    /// Start the loop on the current tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let notify = Arc::new(Notify::new());
        let force = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(notify.clone(), force.clone(), cancel.clone()));
        SchedulerHandle {
            notify,
            force,
            cancel,
            task,
        }
    }

    async fn run(self, notify: Arc<Notify>, force: Arc<AtomicBool>, cancel: CancellationToken) {
        match blocking(&self.spots, |s| s.sync_state().clear_stale()).await {
            Ok(true) => tracing::warn!("Cleared a sync flag left by an interrupted run"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Could not clear stale sync flag"),
        }
        tracing::info!(
            poll_secs = self.config.poll_interval.as_secs(),
            "Sync scheduler started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = notify.notified() => tracing::debug!("Sync triggered"),
                _ = cancel.cancelled() => break,
            }

            let forced = force.swap(false, Ordering::SeqCst);
            if let Err(e) = self.run_due_syncs(forced, &cancel).await {
                tracing::error!(error = %e, "Sync failed");
                let message = format!("Sync failed: {}", e);
                if let Err(e) = blocking(&self.spots, move |s| s.sync_state().fail(&message)).await {
                    tracing::error!(error = %e, "Could not record sync failure");
                }
                tokio::select! {
                    _ = tokio::time::sleep(self.config.error_cooldown) => {}
                    _ = cancel.cancelled() => break,
                }
            }
        }

        tracing::info!("Sync scheduler stopped");
    }

    async fn run_due_syncs(&self, forced: bool, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let state = blocking(&self.spots, |s| s.sync_state().load()).await?;
        let now = Utc::now();

        if forced || state.card_sync_due(now) {
            let months = state.recent_months;
            let token = cancel.clone();
            blocking(&self.spots, move |s| {
                s.sync_state().mark_syncing(CARD_SYNC_STATUS)?;
                let report = s.reconciler().sync_recent_sets(months, Some(&token))?;
                finish(s, &report, |s, summary| {
                    s.sync_state().finish_card_sync(Utc::now(), summary)
                })
            })
            .await?;
        }

        if cancel.is_cancelled() {
            return Ok(());
        }

        if forced || state.price_sync_due(now) {
            let token = cancel.clone();
            blocking(&self.spots, move |s| {
                s.sync_state().mark_syncing(PRICE_SYNC_STATUS)?;
                let report = s.reconciler().sync_prices(Some(&token))?;
                finish(s, &report, |s, summary| {
                    s.sync_state().finish_price_sync(Utc::now(), summary)
                })
            })
            .await?;
        }

        Ok(())
    }
}

/// Record the end of a sync. A run cut short by shutdown clears the flag
/// without stamping the timestamp, so it is due again on the next start.
fn finish<F>(spots: &Spots, report: &SyncReport, stamp: F) -> Result<()>
where
    F: FnOnce(&Spots, Option<&str>) -> Result<()>,
{
    let summary = report.summary();
    tracing::info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed.len(),
        incomplete = report.incomplete.len(),
        "Sync finished"
    );
    if report.cancelled {
        spots
            .sync_state()
            .fail(summary.as_deref().unwrap_or("Sync interrupted"))
    } else {
        stamp(spots, summary.as_deref())
    }
}

/// Run a store/catalog operation on the blocking pool.
async fn blocking<T, F>(spots: &Arc<Spots>, f: F) -> Result<T>
where
    F: FnOnce(&Spots) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let spots = spots.clone();
    tokio::task::spawn_blocking(move || f(&spots))
        .await
        .map_err(|e| SpotsError::Join(e.to_string()))?
}
