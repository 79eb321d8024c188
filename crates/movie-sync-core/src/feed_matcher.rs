//! Release availability checks against the predb feed.
//!
//! Each tracked title gets one backlog query scoped to its title and year.
//! Once that query went through, the title is only looked for in the rolling
//! (unscoped) feed until it is found or its status becomes terminal.

use crate::fuzzy::fuzzy_match;
use crate::library::LibraryStore;
use anyhow::Result;
use movie_sync_models::{MovieUpdate, PredbStatus, TrackedTitle};
use movie_sync_sources::predb::parse_feed_titles;
use movie_sync_sources::{FeedBackend, SourceResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogResult {
    Matched,
    Unmatched,
    /// Fetch or parse failed; flags were left alone so the next pass retries
    FetchFailed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PredbReport {
    pub backlog_checked: usize,
    pub backlog_failed: usize,
    pub rolling_checked: usize,
    /// IMDB ids newly marked as found, from either mode
    pub found: Vec<String>,
}

pub struct FeedMatcher {
    feed: Arc<dyn FeedBackend>,
    library: Arc<dyn LibraryStore>,
}

impl FeedMatcher {
    pub fn new(feed: Arc<dyn FeedBackend>, library: Arc<dyn LibraryStore>) -> Self {
        Self { feed, library }
    }

    /// Backlog-check new titles one by one, then scan the rolling feed for the rest
    pub async fn check_all(&self) -> Result<PredbReport> {
        info!(operation = "predb_check", "Checking predb for new available releases");

        let titles = self.library.tracked_titles().await?;
        let mut report = PredbReport::default();

        let (backlog, rolling): (Vec<&TrackedTitle>, Vec<&TrackedTitle>) = (
            titles.iter().filter(|t| t.needs_backlog_check()).collect(),
            titles.iter().filter(|t| t.needs_rolling_check()).collect(),
        );

        if !backlog.is_empty() {
            info!(operation = "predb_backlog", count = backlog.len(), "Performing predb backlog search");
        }
        for title in backlog {
            report.backlog_checked += 1;
            match self.backlog_search(title).await {
                Ok(BacklogResult::Matched) => report.found.push(title.imdb_id.clone()),
                Ok(BacklogResult::Unmatched) => {}
                Ok(BacklogResult::FetchFailed) => report.backlog_failed += 1,
                Err(e) => {
                    error!(operation = "predb_backlog", imdb_id = %title.imdb_id, error = %e, "Failed to store predb result");
                    report.backlog_failed += 1;
                }
            }
        }

        if !rolling.is_empty() {
            report.rolling_checked = rolling.len();
            let owned: Vec<TrackedTitle> = rolling.into_iter().cloned().collect();
            report.found.extend(self.rolling_search(&owned).await?);
        }

        info!(
            operation = "predb_check",
            backlog = report.backlog_checked,
            rolling = report.rolling_checked,
            found = report.found.len(),
            "predb check complete"
        );
        Ok(report)
    }

    /// One scoped query for `title`
    ///
    /// `predb_backlog` is set after any structurally valid response, `predb`
    /// only on a match. Library write failures are returned.
    pub async fn backlog_search(&self, title: &TrackedTitle) -> Result<BacklogResult> {
        let Some(year) = title.year else {
            // Nothing to match against; still counts as checked
            warn!(operation = "predb_backlog", imdb_id = %title.imdb_id, "Title has no year, skipping predb match");
            self.library
                .update_movie(&title.imdb_id, MovieUpdate { predb_backlog: Some(true), ..MovieUpdate::default() })
                .await?;
            return Ok(BacklogResult::Unmatched);
        };

        let query = format!("{} {}", title.title, year);
        debug!(operation = "predb_backlog", query = %query, "Checking predb for verified releases");

        let releases = match self.fetch_titles(Some(&query)).await {
            Ok(releases) => releases,
            Err(e) => {
                warn!(operation = "predb_backlog", query = %query, error = %e, "predb search failed");
                return Ok(BacklogResult::FetchFailed);
            }
        };

        let matched = fuzzy_match(&releases, &title.title, year);
        let mut update = MovieUpdate {
            predb_backlog: Some(true),
            ..MovieUpdate::default()
        };
        if matched {
            info!(operation = "predb_backlog", title = %title.title, year = year, "Found on predb");
            update.predb = Some(PredbStatus::Found);
        }

        self.library.update_movie(&title.imdb_id, update).await?;
        Ok(if matched { BacklogResult::Matched } else { BacklogResult::Unmatched })
    }

    /// Scan the unscoped feed once for all `titles`; returns the IMDB ids marked found
    ///
    /// A failed fetch is logged and reported as no matches.
    pub async fn rolling_search(&self, titles: &[TrackedTitle]) -> Result<Vec<String>> {
        debug!(operation = "predb_rss", count = titles.len(), "Checking predb rss");

        let releases = match self.fetch_titles(None).await {
            Ok(releases) => releases,
            Err(e) => {
                warn!(operation = "predb_rss", error = %e, "Unable to read predb rss");
                return Ok(Vec::new());
            }
        };

        let mut found = Vec::new();
        for title in titles {
            let Some(year) = title.year else { continue };
            if fuzzy_match(&releases, &title.title, year) {
                info!(operation = "predb_rss", title = %title.title, year = year, "Found on predb rss");
                let update = MovieUpdate {
                    predb: Some(PredbStatus::Found),
                    ..MovieUpdate::default()
                };
                self.library.update_movie(&title.imdb_id, update).await?;
                found.push(title.imdb_id.clone());
            }
        }
        Ok(found)
    }

    async fn fetch_titles(&self, query: Option<&str>) -> SourceResult<Vec<String>> {
        let document = self.feed.fetch_feed(query).await?;
        parse_feed_titles(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::AddOutcome;
    use async_trait::async_trait;
    use movie_sync_models::{MovieRecord, MovieStatus};
    use movie_sync_sources::SourceError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn rss(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .map(|t| format!("<item><title>{}</title></item>", t))
            .collect();
        format!("<rss><channel>{}</channel></rss>", items)
    }

    /// Answers scoped queries from `scoped`, the rolling feed from `rolling`
    struct FakeFeed {
        scoped: HashMap<String, String>,
        rolling: Option<String>,
        queries: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl FeedBackend for FakeFeed {
        async fn fetch_feed(&self, query: Option<&str>) -> SourceResult<String> {
            self.queries.lock().unwrap().push(query.map(str::to_string));
            let document = match query {
                Some(q) => self.scoped.get(q).cloned(),
                None => self.rolling.clone(),
            };
            document.ok_or_else(|| SourceError::Status { status: 503, body: String::new() })
        }
    }

    #[derive(Default)]
    struct FakeLibrary {
        titles: Mutex<Vec<TrackedTitle>>,
    }

    impl FakeLibrary {
        fn get(&self, imdb_id: &str) -> TrackedTitle {
            self.titles.lock().unwrap().iter().find(|t| t.imdb_id == imdb_id).cloned().unwrap()
        }
    }

    #[async_trait]
    impl LibraryStore for FakeLibrary {
        async fn tracked_titles(&self) -> Result<Vec<TrackedTitle>> {
            Ok(self.titles.lock().unwrap().clone())
        }

        async fn imdb_ids(&self) -> Result<HashSet<String>> {
            Ok(self.titles.lock().unwrap().iter().map(|t| t.imdb_id.clone()).collect())
        }

        async fn add_movie(&self, _movie: MovieRecord) -> Result<AddOutcome> {
            Ok(AddOutcome { added: false })
        }

        async fn update_movie(&self, imdb_id: &str, update: MovieUpdate) -> Result<()> {
            let mut titles = self.titles.lock().unwrap();
            let title = titles
                .iter_mut()
                .find(|t| t.imdb_id == imdb_id)
                .ok_or_else(|| anyhow::anyhow!("missing {}", imdb_id))?;
            if let Some(backlog) = update.predb_backlog {
                title.predb_backlog = backlog;
            }
            if let Some(predb) = update.predb {
                title.predb = predb;
            }
            if let Some(status) = update.status {
                title.status = status;
            }
            Ok(())
        }
    }

    fn tracked(imdb_id: &str, title: &str, year: u32) -> TrackedTitle {
        TrackedTitle {
            imdb_id: imdb_id.to_string(),
            title: title.to_string(),
            year: Some(year),
            status: MovieStatus::Waiting,
            predb: PredbStatus::Unknown,
            predb_backlog: false,
        }
    }

    fn matcher(feed: FakeFeed, titles: Vec<TrackedTitle>) -> (FeedMatcher, Arc<FakeLibrary>, Arc<FakeFeed>) {
        let library = Arc::new(FakeLibrary { titles: Mutex::new(titles) });
        let feed = Arc::new(feed);
        (FeedMatcher::new(feed.clone(), library.clone()), library, feed)
    }

    #[tokio::test]
    async fn test_backlog_match_sets_both_flags() {
        let feed = FakeFeed {
            scoped: HashMap::from([(
                "Black Swan 2010".to_string(),
                rss(&["Black.Swan.2010.1080p.BluRay", "Some.Other.Movie.2010"]),
            )]),
            rolling: None,
            queries: Mutex::new(Vec::new()),
        };
        let (matcher, library, _) = matcher(feed, vec![tracked("tt0947798", "Black Swan", 2010)]);

        let result = matcher.backlog_search(&library.get("tt0947798")).await.unwrap();
        assert_eq!(result, BacklogResult::Matched);

        let title = library.get("tt0947798");
        assert!(title.predb_backlog);
        assert_eq!(title.predb, PredbStatus::Found);
    }

    #[tokio::test]
    async fn test_backlog_without_match_only_sets_backlog() {
        let feed = FakeFeed {
            scoped: HashMap::from([("Black Swan 2010".to_string(), rss(&["Black.Swan.2011.x264"]))]),
            rolling: None,
            queries: Mutex::new(Vec::new()),
        };
        let (matcher, library, _) = matcher(feed, vec![tracked("tt0947798", "Black Swan", 2010)]);

        let result = matcher.backlog_search(&library.get("tt0947798")).await.unwrap();
        assert_eq!(result, BacklogResult::Unmatched);

        let title = library.get("tt0947798");
        assert!(title.predb_backlog);
        assert_eq!(title.predb, PredbStatus::Unknown);
    }

    #[tokio::test]
    async fn test_backlog_fetch_failure_leaves_flags_untouched() {
        let feed = FakeFeed {
            scoped: HashMap::from([("Black Swan 2010".to_string(), "<html>oops</html>".to_string())]),
            rolling: None,
            queries: Mutex::new(Vec::new()),
        };
        let (matcher, library, _) = matcher(
            feed,
            vec![tracked("tt0947798", "Black Swan", 2010), tracked("tt1375666", "Inception", 2010)],
        );

        // Malformed document
        let result = matcher.backlog_search(&library.get("tt0947798")).await.unwrap();
        assert_eq!(result, BacklogResult::FetchFailed);
        assert!(!library.get("tt0947798").predb_backlog);

        // Transport failure
        let result = matcher.backlog_search(&library.get("tt1375666")).await.unwrap();
        assert_eq!(result, BacklogResult::FetchFailed);
        assert!(!library.get("tt1375666").predb_backlog);
    }

    #[tokio::test]
    async fn test_check_all_partitions_titles() {
        let mut rolling_title = tracked("tt0000002", "Inception", 2010);
        rolling_title.predb_backlog = true;
        let mut found_title = tracked("tt0000003", "Avatar", 2009);
        found_title.predb_backlog = true;
        found_title.predb = PredbStatus::Found;
        let mut disabled = tracked("tt0000004", "Heat", 1995);
        disabled.status = MovieStatus::Disabled;
        let mut finished = tracked("tt0000005", "Alien", 1979);
        finished.status = MovieStatus::Finished;
        finished.predb_backlog = true;

        let feed = FakeFeed {
            scoped: HashMap::from([("Black Swan 2010".to_string(), rss(&[]))]),
            rolling: Some(rss(&["Inception.2010.720p.BluRay", "Alien.1979.Directors.Cut"])),
            queries: Mutex::new(Vec::new()),
        };
        let (matcher, library, feed) = matcher(
            feed,
            vec![tracked("tt0000001", "Black Swan", 2010), rolling_title, found_title, disabled, finished],
        );

        let report = matcher.check_all().await.unwrap();
        assert_eq!(report.backlog_checked, 1);
        assert_eq!(report.rolling_checked, 1);
        assert_eq!(report.found, vec!["tt0000002".to_string()]);

        assert!(library.get("tt0000001").predb_backlog);
        assert_eq!(library.get("tt0000002").predb, PredbStatus::Found);
        // Terminal titles are never checked, even when the feed lists them
        assert_eq!(library.get("tt0000005").predb, PredbStatus::Unknown);
        assert!(!library.get("tt0000004").predb_backlog);

        let queries = feed.queries.lock().unwrap().clone();
        assert_eq!(queries, vec![Some("Black Swan 2010".to_string()), None]);
    }

    #[tokio::test]
    async fn test_rolling_failure_marks_nothing() {
        let mut title = tracked("tt0000002", "Inception", 2010);
        title.predb_backlog = true;
        let feed = FakeFeed {
            scoped: HashMap::new(),
            rolling: None,
            queries: Mutex::new(Vec::new()),
        };
        let (matcher, library, _) = matcher(feed, vec![title.clone()]);

        let found = matcher.rolling_search(&[title]).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(library.get("tt0000002").predb, PredbStatus::Unknown);
    }
}
