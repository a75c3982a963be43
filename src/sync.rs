//! Poll-cycle orchestration for the station fleet
//!
//! This module contains the sync coordinator that drives one full poll
//! cycle per station: it orders the resource calls, merges their results
//! into immutable snapshots, applies the fallback rules on partial failure,
//! and publishes the assembled fleet snapshot to consumers.

use crate::api::CloudApi;
use crate::config::Config;
use crate::error::{Result, StratusError};
use crate::logging::get_logger;
use crate::model::FleetSnapshot;
use cycle::StationOutcome;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{Duration, MissedTickBehavior, interval};

pub mod commit;
mod cycle;
pub mod identity;
mod meter;
pub mod phase;

pub use commit::{CommitGateway, CommitResult, CommitState, WRITABLE_KEYS};
pub use identity::IdentityResolver;


/// Handle for asking a running coordinator to stop
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }
}

/// Drives the poll loop and owns the published snapshot.
///
/// All collaborators are constructor-injected; there is no global registry.
/// The snapshot is the only shared state, published atomically once per
/// completed cycle through a watch channel. A cycle that aborts publishes
/// nothing, so consumers keep seeing the previous snapshot.
pub struct SyncCoordinator {
    config: Config,
    api: Arc<dyn CloudApi>,
    logger: crate::logging::StructuredLogger,
    snapshot_tx: watch::Sender<Arc<FleetSnapshot>>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
    total_cycles: u64,
}

impl SyncCoordinator {
    /// Create a new coordinator around an already validated configuration
    pub fn new(config: Config, api: Arc<dyn CloudApi>) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(FleetSnapshot::default()));
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        Self {
            config,
            api,
            logger: get_logger("sync"),
            snapshot_tx,
            shutdown_tx,
            shutdown_rx,
            total_cycles: 0,
        }
    }

    /// Subscribe to published fleet snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<FleetSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Handle for stopping the poll loop from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Gateway for configuration writes, sharing this coordinator's API
    /// client
    pub fn commit_gateway(&self) -> CommitGateway {
        CommitGateway::new(Arc::clone(&self.api), self.config.commit.clone())
    }

    /// Run poll cycles at the configured interval until shutdown
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info(&format!(
            "starting poll loop, interval {}s",
            self.config.poll_interval_seconds
        ));

        let mut ticker = interval(Duration::from_secs(self.config.poll_interval_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll_cycle().await {
                        Ok(snapshot) => {
                            self.logger.info(&format!(
                                "cycle complete: {} stations synced, {} skipped",
                                snapshot.stations.len(),
                                snapshot.skipped.len()
                            ));
                        }
                        Err(e) => {
                            // Previous snapshot stays published
                            self.logger.error(&format!("poll cycle aborted: {}", e));
                        }
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("shutdown requested, stopping poll loop");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Execute one poll cycle and publish the resulting snapshot.
    ///
    /// Station pipelines run concurrently; a failure of one never aborts a
    /// sibling. Only globally fatal errors (invalid credentials, an
    /// unreadable station list) abort the cycle, in which case nothing is
    /// published.
    pub async fn poll_cycle(&mut self) -> Result<Arc<FleetSnapshot>> {
        self.total_cycles += 1;
        let records = self.api.list_stations().await?;
        let station_count = records.len();
        self.logger.debug(&format!(
            "cycle {}: {} stations listed",
            self.total_cycles, station_count
        ));

        let mut pipelines = JoinSet::new();
        for record in records {
            // Load interfaces are aggregation points with no telemetry of
            // their own and are not polled.
            if record.is_load_interface() {
                continue;
            }
            let api = Arc::clone(&self.api);
            let meter_config = self.config.meter.clone();
            pipelines.spawn(cycle::sync_station(api, record, meter_config));
        }

        let mut stations = BTreeMap::new();
        let mut skipped = BTreeMap::new();
        let mut fatal: Option<StratusError> = None;

        while let Some(joined) = pipelines.join_next().await {
            match joined {
                Ok(StationOutcome::Synced(snapshot)) => {
                    stations.insert(snapshot.station.id.clone(), *snapshot);
                }
                Ok(StationOutcome::Skipped { id, reason }) => {
                    skipped.insert(id, reason);
                }
                Ok(StationOutcome::Fatal(e)) => {
                    fatal.get_or_insert(e);
                }
                Err(e) => {
                    self.logger.error(&format!("station pipeline died: {}", e));
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }

        let snapshot = Arc::new(FleetSnapshot {
            stations,
            skipped,
            station_count,
        });
        self.snapshot_tx.send_replace(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
