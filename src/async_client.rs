//! Async wrapper around [`Spots`] for use in tokio applications.
//!
//! Runs all operations on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free, and
//! owns the background [`SyncScheduler`](crate::SyncScheduler).
//!
//! # Example
//!
//! ```no_run
//! use spots::{AsyncSpots, SchedulerConfig, Spots};
//!
//! #[tokio::main]
//! async fn main() {
//!     let spots = AsyncSpots::open(Spots::builder()).await.unwrap();
//!     spots.start_scheduler(SchedulerConfig::default()).await;
//!
//!     let dashboard = spots.run(|s| s.get_dashboard()).await.unwrap();
//!     println!("{} cards owned", dashboard.totals.total_cards);
//!
//!     spots.shutdown().await.unwrap();
//! }
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Result, SpotsError};
use crate::models::SyncStatus;
use crate::scheduler::{SchedulerConfig, SchedulerHandle, SyncScheduler};
use crate::{Spots, SpotsBuilder};

// ---------------------------------------------------------------------------
// AsyncSpots
// ---------------------------------------------------------------------------

/// Async facade over a shared [`Spots`].
///
/// Cloning is cheap; clones share the instance and the scheduler.
#[derive(Clone)]
pub struct AsyncSpots {
    inner: Arc<Spots>,
    scheduler: Arc<Mutex<Option<SchedulerHandle>>>,
}

impl AsyncSpots {
    pub fn new(spots: Spots) -> Self {
        Self {
            inner: Arc::new(spots),
            scheduler: Arc::new(Mutex::new(None)),
        }
    }

    /// Build the instance on the blocking pool (opening the database does
    /// file I/O) and wrap it.
    pub async fn open(builder: SpotsBuilder) -> Result<Self> {
        let spots = tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(|e| SpotsError::Join(e.to_string()))??;
        Ok(Self::new(spots))
    }

    /// The shared synchronous instance.
    pub fn spots(&self) -> Arc<Spots> {
        self.inner.clone()
    }

    /// Run a sync operation on the blocking thread pool.
    ///
    /// ```no_run
    /// # use spots::{AsyncSpots, Spots};
    /// # async fn example() -> spots::Result<()> {
    /// # let spots = AsyncSpots::open(Spots::builder()).await?;
    /// let report = spots.run(|s| s.import_set("mh3")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Spots) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let spots = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&spots))
            .await
            .map_err(|e| SpotsError::Join(e.to_string()))?
    }

    // -- Scheduler ---------------------------------------------------------

    /// Start the background scheduler. Does nothing if it already runs.
    pub async fn start_scheduler(&self, config: SchedulerConfig) {
        let mut slot = self.scheduler.lock().await;
        if slot.as_ref().is_some_and(|h| h.is_running()) {
            return;
        }
        *slot = Some(SyncScheduler::new(self.inner.clone(), config).spawn());
    }

    /// Ask the scheduler to run the due syncs now.
    ///
    /// Returns `false` without doing anything when a sync is already in
    /// progress. Fails with `InvalidArgument` when no scheduler is running.
    pub async fn trigger_manual_sync(&self) -> Result<bool> {
        if self.get_sync_status().await?.is_syncing {
            return Ok(false);
        }
        let slot = self.scheduler.lock().await;
        let handle = slot
            .as_ref()
            .ok_or_else(|| SpotsError::InvalidArgument("Sync scheduler is not running".into()))?;
        handle.trigger();
        Ok(true)
    }

    /// Run card and price sync now, whether due or not. Same return
    /// semantics as [`trigger_manual_sync`](Self::trigger_manual_sync).
    pub async fn force_sync(&self) -> Result<bool> {
        if self.get_sync_status().await?.is_syncing {
            return Ok(false);
        }
        let slot = self.scheduler.lock().await;
        let handle = slot
            .as_ref()
            .ok_or_else(|| SpotsError::InvalidArgument("Sync scheduler is not running".into()))?;
        handle.force();
        Ok(true)
    }

    pub async fn get_sync_status(&self) -> Result<SyncStatus> {
        self.run(|s| s.get_sync_status()).await
    }

    /// Stop the scheduler, if any, and wait for it to finish.
    pub async fn shutdown(&self) -> Result<()> {
        let handle = self.scheduler.lock().await.take();
        match handle {
            Some(handle) => handle.shutdown().await,
            None => Ok(()),
        }
    }
}
