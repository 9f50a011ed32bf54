//! Periodic maintenance: entity refreshes, guild roster updates and the
//! data cache retention sweep.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as Ttl;
use leaderview_core::clock::Clock;
use leaderview_core::error::DomainError;
use leaderview_core::repository::DataCacheRepository;
use leaderview_lol::LolEntityUpdater;
use leaderview_views::application::guild_roster_updater::GuildRosterUpdater;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// One unit of periodic work.
#[async_trait]
pub trait MaintenanceJob: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the job once. Returns the number of items that failed but did
    /// not stop the job.
    async fn run(&self) -> Result<usize, DomainError>;
}

#[async_trait]
impl MaintenanceJob for LolEntityUpdater {
    fn name(&self) -> &'static str {
        "lol-entity-update"
    }

    async fn run(&self) -> Result<usize, DomainError> {
        Ok(self.update_all().await?.len())
    }
}

#[async_trait]
impl MaintenanceJob for GuildRosterUpdater {
    fn name(&self) -> &'static str {
        "guild-roster-update"
    }

    async fn run(&self) -> Result<usize, DomainError> {
        Ok(self.update_all().await?.len())
    }
}

/// Deletes expired snapshots of every game, keeping the newest snapshot of
/// each entity.
pub struct DataCacheSweep {
    cache: Arc<dyn DataCacheRepository>,
    clock: Arc<dyn Clock>,
    ttl: Ttl,
}

impl DataCacheSweep {
    /// Creates a new `DataCacheSweep`.
    #[must_use]
    pub fn new(cache: Arc<dyn DataCacheRepository>, clock: Arc<dyn Clock>, ttl: Ttl) -> Self {
        Self { cache, clock, ttl }
    }
}

#[async_trait]
impl MaintenanceJob for DataCacheSweep {
    fn name(&self) -> &'static str {
        "data-cache-sweep"
    }

    async fn run(&self) -> Result<usize, DomainError> {
        let deleted = self
            .cache
            .delete_expired_records(self.ttl, None, true, self.clock.now())
            .await?;
        info!(deleted, "expired snapshots deleted");
        Ok(0)
    }
}

/// Runs every job in order. A failing job is logged and does not stop the
/// jobs after it.
pub async fn run_jobs(jobs: &[Arc<dyn MaintenanceJob>]) {
    for job in jobs {
        match job.run().await {
            Ok(0) => info!(job = job.name(), "maintenance job finished"),
            Ok(failed) => warn!(job = job.name(), failed, "maintenance job finished with failures"),
            Err(err) => error!(job = job.name(), error = %err, "maintenance job failed"),
        }
    }
}

/// Handle of the background maintenance task.
pub struct MaintenanceRunner {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl MaintenanceRunner {
    /// Spawns a task that runs `jobs` every `interval`, the first time
    /// immediately. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(jobs: Vec<Arc<dyn MaintenanceJob>>, interval: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop.changed() => break,
                }
                run_jobs(&jobs).await;
            }
            info!("maintenance stopped");
        });
        Self { shutdown, handle }
    }

    /// Signals the task to stop and waits for a running pass to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            error!(error = %err, "maintenance task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use leaderview_core::entity::{DataCache, Game};
    use leaderview_test_support::{FixedClock, InMemoryDataCacheRepository};

    use super::*;

    struct ScriptedJob {
        name: &'static str,
        /// `None` makes the job fail.
        failed: Option<usize>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl MaintenanceJob for ScriptedJob {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self) -> Result<usize, DomainError> {
            self.log.lock().unwrap().push(self.name);
            self.failed
                .ok_or_else(|| DomainError::Infrastructure("db down".into()))
        }
    }

    fn snapshot(entity_id: i64, age_days: i64) -> DataCache {
        DataCache {
            entity_id,
            data: "{}".to_owned(),
            inserted: FixedClock::default().0 - Ttl::days(age_days),
            game: Game::Lol,
        }
    }

    #[tokio::test]
    async fn test_sweep_keeps_newest_snapshot_per_entity() {
        // Arrange
        let cache = Arc::new(InMemoryDataCacheRepository::with_records(vec![
            snapshot(1, 40),
            snapshot(1, 35),
            snapshot(1, 1),
            snapshot(2, 50),
        ]));
        let sweep = DataCacheSweep::new(cache.clone(), Arc::new(FixedClock::default()), Ttl::days(30));

        // Act
        let failed = sweep.run().await.unwrap();

        // Assert
        assert_eq!(failed, 0);
        let mut remaining: Vec<(i64, i64)> = cache
            .records()
            .iter()
            .map(|r| (r.entity_id, (FixedClock::default().0 - r.inserted).num_days()))
            .collect();
        remaining.sort_unstable();
        assert_eq!(remaining, vec![(1, 1), (2, 50)]);
    }

    #[tokio::test]
    async fn test_failing_job_does_not_stop_later_jobs() {
        // Arrange
        let log = Arc::new(Mutex::new(Vec::new()));
        let jobs: Vec<Arc<dyn MaintenanceJob>> = vec![
            Arc::new(ScriptedJob {
                name: "first",
                failed: None,
                log: log.clone(),
            }),
            Arc::new(ScriptedJob {
                name: "second",
                failed: Some(2),
                log: log.clone(),
            }),
        ];

        // Act
        run_jobs(&jobs).await;

        // Assert
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_runner_runs_immediately_and_stops_on_shutdown() {
        // Arrange
        let log = Arc::new(Mutex::new(Vec::new()));
        let jobs: Vec<Arc<dyn MaintenanceJob>> = vec![Arc::new(ScriptedJob {
            name: "only",
            failed: Some(0),
            log: log.clone(),
        })];

        // Act
        let runner = MaintenanceRunner::start(jobs, Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        runner.shutdown().await;

        // Assert
        assert_eq!(*log.lock().unwrap(), vec!["only"]);
    }
}
