use super::{load_config, Services};
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use movie_sync_config::PathManager;
use movie_sync_core::{FeedMatcher, PredbReport, SyncReport, WatchlistSync};
use serde_json::json;
use std::time::Instant;

pub async fn run_sync(output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let services = Services::build(&config, &path_manager)?;

    let Some(watchlist) = services.watchlist.as_ref() else {
        output.warn("Trakt is not configured: enable a list or add an RSS url under [trakt].");
        return Ok(());
    };

    let started = Instant::now();
    let report = sync_watchlists(watchlist).await?;
    print_sync_report(&report, started, output);
    Ok(())
}

pub async fn run_predb(output: &Output) -> Result<()> {
    tracing::debug!("Predb command started");

    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let services = Services::build(&config, &path_manager)?;

    let Some(matcher) = services.feed_matcher.as_ref() else {
        output.warn("Predb checks are disabled ([predb] enabled = false).");
        return Ok(());
    };

    let started = Instant::now();
    let report = check_releases(matcher).await?;
    print_predb_report(&report, started, output);
    Ok(())
}

pub async fn sync_watchlists(watchlist: &WatchlistSync) -> Result<SyncReport> {
    watchlist
        .sync()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Trakt sync failed: {}", e))
}

pub async fn check_releases(matcher: &FeedMatcher) -> Result<PredbReport> {
    matcher
        .check_all()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Predb check failed: {}", e))
}

fn print_sync_report(report: &SyncReport, started: Instant, output: &Output) {
    let duration = started.elapsed();
    match output.format() {
        OutputFormat::Human => {
            for source in &report.failed_sources {
                output.warn(format!("Could not read {}", source));
            }
            if !report.added.is_empty() {
                output.human(crate::output::movie_table(&report.added).to_string());
            }
            output.success(format!(
                "Sync completed: {} added, {} skipped, {} failed in {:?}",
                report.added.len(),
                report.skipped,
                report.failed_entries,
                duration
            ));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "success": report.failed_sources.is_empty(),
                "report": report,
                "duration_seconds": duration.as_secs_f64(),
            }));
        }
    }
}

fn print_predb_report(report: &PredbReport, started: Instant, output: &Output) {
    let duration = started.elapsed();
    match output.format() {
        OutputFormat::Human => {
            if report.backlog_failed > 0 {
                output.warn(format!("{} backlog queries failed and will be retried", report.backlog_failed));
            }
            for imdb_id in &report.found {
                output.info(format!("Release found for {}", imdb_id));
            }
            output.success(format!(
                "Predb check completed: {} backlog, {} rolling, {} found in {:?}",
                report.backlog_checked,
                report.rolling_checked,
                report.found.len(),
                duration
            ));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "success": report.backlog_failed == 0,
                "report": report,
                "duration_seconds": duration.as_secs_f64(),
            }));
        }
    }
}
