use super::sync::{check_releases, sync_watchlists};
use super::{load_config, Services};
use crate::output::Output;
use color_eyre::Result;
use movie_sync_config::{default_scheduler_config, Config, LoggingConfig, PathManager, SchedulerConfig};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// One scheduled pass: Trakt sync, then the predb check
struct PassRunner {
    services: Services,
    // Held for the length of a pass so ticks never overlap
    running: Mutex<()>,
}

impl PassRunner {
    async fn run(&self, trigger: &str) {
        let Ok(_guard) = self.running.try_lock() else {
            warn!(operation = "scheduled_sync", trigger, "Previous pass still running, skipping");
            return;
        };

        info!(operation = "scheduled_sync_start", trigger, "Starting sync pass");
        if let Some(watchlist) = &self.services.watchlist {
            match sync_watchlists(watchlist).await {
                Ok(report) => info!(
                    operation = "scheduled_sync_complete",
                    added = report.added.len(),
                    failed_sources = report.failed_sources.len(),
                    "Trakt sync completed"
                ),
                Err(e) => error!(operation = "scheduled_sync_error", error = %e, "Trakt sync failed"),
            }
        }
        if let Some(matcher) = &self.services.feed_matcher {
            match check_releases(matcher).await {
                Ok(report) => info!(
                    operation = "scheduled_predb_complete",
                    found = report.found.len(),
                    backlog_failed = report.backlog_failed,
                    "Predb check completed"
                ),
                Err(e) => error!(operation = "scheduled_predb_error", error = %e, "Predb check failed"),
            }
        }
    }
}

pub struct Scheduler {
    scheduler: JobScheduler,
    runner: Arc<PassRunner>,
    config: SchedulerConfig,
}

impl Scheduler {
    async fn new(services: Services, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create scheduler: {:?}", e))?;

        Ok(Self {
            scheduler,
            runner: Arc::new(PassRunner {
                services,
                running: Mutex::new(()),
            }),
            config,
        })
    }

    async fn start(&mut self) -> Result<()> {
        if self.config.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial sync on startup");
            self.runner.run("startup").await;
        }

        let runner = self.runner.clone();
        let job = Job::new_async(self.config.schedule.as_str(), move |_id, _scheduler| {
            let runner = runner.clone();
            Box::pin(async move {
                runner.run("schedule").await;
            })
        })
        .map_err(|e| color_eyre::eyre::eyre!("Invalid schedule '{}': {:?}", self.config.schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to add sync job: {:?}", e))?;
        self.scheduler
            .start()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to start scheduler: {:?}", e))?;

        info!(operation = "scheduler_started", schedule = %self.config.schedule, "Scheduler started");
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to stop scheduler: {:?}", e))
    }
}

/// Effective scheduler settings after command line overrides
fn scheduler_config(
    from_file: Option<&SchedulerConfig>,
    schedule_override: Option<String>,
    no_startup_sync: bool,
) -> SchedulerConfig {
    let defaults = default_scheduler_config();
    let from_file = from_file.unwrap_or(&defaults);

    SchedulerConfig {
        schedule: schedule_override.unwrap_or_else(|| from_file.schedule.clone()),
        run_on_startup: !no_startup_sync && from_file.run_on_startup,
    }
}

/// The `[logging]` section of the config file, defaults when it cannot be read
pub fn logging_config() -> LoggingConfig {
    let config_file = PathManager::default().config_file();
    Config::load_from_file(&config_file)
        .map(|config| config.logging)
        .unwrap_or_default()
}

pub async fn run_daemon(schedule_override: Option<String>, no_startup_sync: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;

    if let Some(file) = &config.logging.file {
        output.info(format!("Logs are being written to: {}", file.display()));
    }

    let services = Services::build(&config, &path_manager)?;
    if services.watchlist.is_none() && services.feed_matcher.is_none() {
        output.warn("Neither Trakt nor predb is enabled; the daemon has nothing to do.");
        return Ok(());
    }

    let scheduler_config = scheduler_config(config.scheduler.as_ref(), schedule_override, no_startup_sync);
    let mut scheduler = Scheduler::new(services, scheduler_config).await?;
    scheduler.start().await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to listen for shutdown signal: {}", e))?;
    info!(operation = "scheduler_shutdown", "Shutdown signal received");
    scheduler.shutdown().await
}
