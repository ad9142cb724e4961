//! PeriodicDriver - background service that keeps the archive fresh.
//!
//! On every tick (the first one fires immediately at startup):
//! 1. Start a harvest lineage seeded at "now", unless the previous one is still running
//! 2. Sweep stale converted artifacts, if auto cleanup is enabled
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 15min | Time between ticks |
//! | `auto_cleanup` | true | Run the eviction sweep on each tick |
//! | `cleanup_threshold_days` | 1 | Age past which artifacts are evicted |
//!
//! ## Graceful Shutdown
//!
//! The loop exits when the shutdown signal flips to `true`. A lineage that is
//! already running is left to finish on its own task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::application::{
    EvictStaleCommand, EvictStaleHandler, EvictionReport, RunHarvestCommand, RunHarvestHandler,
};

/// Configuration for the PeriodicDriver service.
#[derive(Debug, Clone)]
pub struct PeriodicDriverConfig {
    /// Time between ticks.
    pub poll_interval: Duration,

    /// Whether each tick also evicts stale artifacts.
    pub auto_cleanup: bool,

    /// Eviction age threshold in days.
    pub cleanup_threshold_days: u32,
}

impl Default for PeriodicDriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15 * 60),
            auto_cleanup: true,
            cleanup_threshold_days: 1,
        }
    }
}

impl PeriodicDriverConfig {
    /// Create config with custom poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Create config with auto cleanup toggled.
    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    /// Create config with custom cleanup threshold.
    pub fn with_cleanup_threshold_days(mut self, days: u32) -> Self {
        self.cleanup_threshold_days = days;
        self
    }
}

/// What a single tick did.
#[derive(Debug)]
pub struct TickOutcome {
    /// Handle to the lineage started by this tick; `None` if one was still running.
    pub harvest: Option<JoinHandle<()>>,
    /// Eviction result; `None` when cleanup is disabled or the sweep failed.
    pub eviction: Option<EvictionReport>,
}

/// Clears the in-flight flag when the lineage task ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Background service that triggers harvest and eviction on a timer.
pub struct PeriodicDriver {
    harvest: Arc<RunHarvestHandler>,
    evict: Arc<EvictStaleHandler>,
    config: PeriodicDriverConfig,
    in_flight: Arc<AtomicBool>,
}

impl PeriodicDriver {
    pub fn new(
        harvest: Arc<RunHarvestHandler>,
        evict: Arc<EvictStaleHandler>,
        config: PeriodicDriverConfig,
    ) -> Self {
        Self {
            harvest,
            evict,
            config,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a lineage started by this driver is running.
    pub fn harvest_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run the driver loop until shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            auto_cleanup = self.config.auto_cleanup,
            "Periodic driver started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("Periodic driver stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    /// Run exactly one tick.
    pub async fn poll_once(&self) -> TickOutcome {
        let harvest = self.start_harvest();
        let eviction = if self.config.auto_cleanup {
            self.evict().await
        } else {
            None
        };
        TickOutcome { harvest, eviction }
    }

    fn start_harvest(&self) -> Option<JoinHandle<()>> {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::warn!("Previous harvest still running, skipping this tick");
            return None;
        };

        let handler = self.harvest.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = handler.handle(RunHarvestCommand::default()).await {
                tracing::error!(error = %e, code = %e.code(), "Harvest aborted");
            }
        }))
    }

    async fn evict(&self) -> Option<EvictionReport> {
        let cmd = EvictStaleCommand {
            threshold_days: self.config.cleanup_threshold_days,
        };
        match self.evict.handle(cmd).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "Cleanup failed");
                None
            }
        }
    }
}
