//! Recurring metering cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::application::metering::MeteringEngine;

/// Runs [`MeteringEngine::run_cycle`] on a fixed interval.
pub struct Scheduler {
    engine: Arc<MeteringEngine>,
    interval: Duration,
}

/// A scheduler running on its own task.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the loop to exit. Returns the number of
    /// cycles run; a cycle in progress completes first.
    pub async fn shutdown(self) -> u64 {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(cycles) => cycles,
            Err(e) => {
                error!(error = %e, "Scheduler task failed");
                0
            }
        }
    }
}

impl Scheduler {
    #[must_use]
    pub fn new(engine: Arc<MeteringEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Scheduler using the engine's configured interval.
    #[must_use]
    pub fn from_engine(engine: Arc<MeteringEngine>) -> Self {
        let interval = engine.config().interval();
        Self::new(engine, interval)
    }

    /// Run cycles until `shutdown` turns true or its sender is dropped.
    ///
    /// The first cycle starts immediately. Returns the number of cycles run.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!(interval_secs = self.interval.as_secs(), "Metering scheduler started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut cycles = 0;

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                info!("Shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            info!("Shutdown channel closed");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    cycles += 1;
                    match self.engine.run_cycle().await {
                        Ok(reports) => info!(cycle = cycles, campaigns = reports.len(), "Cycle complete"),
                        Err(e) => error!(cycle = cycles, error = %e, "Metering cycle failed"),
                    }
                }
            }
        }
        cycles
    }

    /// Run on a spawned task.
    #[must_use]
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(rx).await });
        SchedulerHandle { shutdown, task }
    }
}
