//! Trakt watchlist synchronization.
//!
//! Two kinds of sources feed the library:
//! - ranked lists (trending, popular, ...), read in full on every pass
//! - personal Atom feeds, read incrementally behind a per-feed cursor
//!
//! A feed's cursor moves to the feed's own `updated` timestamp once all of its
//! new entries were processed, and all cursors are persisted together at the
//! end of the pass. A feed that could not be fetched or parsed keeps its old
//! cursor, so its entries are seen again next time.

use crate::library::{CursorStore, LibraryStore, SearchTrigger};
use anyhow::Result;
use chrono::{DateTime, Utc};
use movie_sync_config::{SyncOptions, TraktConfig};
use movie_sync_models::{default_last_synced, MovieRecord, RankedList, RemoteListEntry, SyncCursor};
use movie_sync_sources::trakt::{parse_watchlist_feed, source_id_from_url, split_title_year};
use movie_sync_sources::{ListBackend, MetadataClient, WatchlistFeed};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};


/// Origin tag of movies added by this sync
pub const TRAKT_ORIGIN: &str = "Trakt";

#[derive(Debug, Clone, Default)]
pub struct WatchlistOptions {
    /// Enabled ranked list names, validated when the pass runs
    pub lists: Vec<String>,
    pub min_score: f64,
    pub length: usize,
    pub rss_urls: Vec<String>,
    pub search_after_add: bool,
}

impl WatchlistOptions {
    pub fn from_config(trakt: &TraktConfig, sync: &SyncOptions) -> Self {
        Self {
            lists: trakt.enabled_lists().into_iter().map(str::to_string).collect(),
            min_score: trakt.min_score,
            length: trakt.length,
            rss_urls: trakt.rss_urls.clone(),
            search_after_add: sync.search_after_add,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub added: Vec<MovieRecord>,
    /// Entries dropped as duplicates, below the score or without an IMDB id
    pub skipped: usize,
    /// Entries that failed to parse or resolve
    pub failed_entries: usize,
    /// Lists and feeds that could not be read at all
    pub failed_sources: Vec<String>,
    /// Cursors written at the end of the pass
    pub cursors: Vec<SyncCursor>,
}

/// State shared by both halves of one pass
struct Pass {
    library_ids: HashSet<String>,
    added_ids: HashSet<String>,
    report: SyncReport,
}

impl Pass {
    fn is_known(&self, imdb_id: &str) -> bool {
        self.library_ids.contains(imdb_id) || self.added_ids.contains(imdb_id)
    }
}

pub struct WatchlistSync {
    lists: Arc<dyn ListBackend>,
    metadata: Arc<MetadataClient>,
    library: Arc<dyn LibraryStore>,
    cursors: Arc<dyn CursorStore>,
    search: Option<Arc<dyn SearchTrigger>>,
    options: WatchlistOptions,
}

impl WatchlistSync {
    pub fn new(
        lists: Arc<dyn ListBackend>,
        metadata: Arc<MetadataClient>,
        library: Arc<dyn LibraryStore>,
        cursors: Arc<dyn CursorStore>,
        options: WatchlistOptions,
    ) -> Self {
        Self {
            lists,
            metadata,
            library,
            cursors,
            search: None,
            options,
        }
    }

    /// Search to trigger after adds when `search_after_add` is on
    pub fn with_search_trigger(mut self, search: Arc<dyn SearchTrigger>) -> Self {
        self.search = Some(search);
        self
    }

    /// Run one full pass: watchlist feeds first, then ranked lists
    ///
    /// Only library and cursor store failures are returned; remote failures
    /// end up in the report.
    pub async fn sync(&self) -> Result<SyncReport> {
        info!(operation = "trakt_sync", "Syncing Trakt lists");

        let mut pass = Pass {
            library_ids: self.library.imdb_ids().await?,
            added_ids: HashSet::new(),
            report: SyncReport::default(),
        };

        if !self.options.rss_urls.is_empty() {
            self.sync_feeds(&mut pass).await?;
        }
        if !self.options.lists.is_empty() {
            self.sync_ranked_lists(&mut pass).await?;
        }

        info!(
            operation = "trakt_sync",
            added = pass.report.added.len(),
            skipped = pass.report.skipped,
            failed_sources = pass.report.failed_sources.len(),
            "Trakt sync complete"
        );
        Ok(pass.report)
    }

    async fn sync_ranked_lists(&self, pass: &mut Pass) -> Result<()> {
        let mut collected: Vec<RemoteListEntry> = Vec::new();

        for name in &self.options.lists {
            let list: RankedList = match name.parse() {
                Ok(list) => list,
                Err(e) => {
                    error!(operation = "trakt_list", list = %name, error = %e, "Invalid list name");
                    pass.report.failed_sources.push(name.clone());
                    continue;
                }
            };

            let entries = match self.lists.ranked_list(list, self.options.length).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(operation = "trakt_list", list = %list, error = %e, "Unable to get Trakt list");
                    pass.report.failed_sources.push(list.to_string());
                    continue;
                }
            };

            for entry in entries.into_iter().take(self.options.length) {
                if !entry.meets_score(self.options.min_score) {
                    pass.report.skipped += 1;
                } else if !collected.contains(&entry) {
                    collected.push(entry);
                }
            }
        }

        info!(operation = "trakt_list", count = collected.len(), "Collected movies from Trakt lists");

        for entry in collected {
            let record = MovieRecord {
                tmdb_id: entry.ids.tmdb,
                imdb_id: entry.ids.imdb,
                title: entry.title,
                year: entry.year,
                ..MovieRecord::default()
            };
            self.add_to_library(record, pass).await?;
        }
        Ok(())
    }

    async fn sync_feeds(&self, pass: &mut Pass) -> Result<()> {
        let mut advanced: HashMap<String, DateTime<Utc>> = HashMap::new();

        for url in &self.options.rss_urls {
            let source_id = source_id_from_url(url);
            let last_synced = self.cursors.read(&source_id).await?.unwrap_or_else(default_last_synced);
            info!(operation = "trakt_rss", source = %source_id, last_synced = %last_synced, "Syncing Trakt RSS watchlist");

            let feed = match self.fetch_feed(url).await {
                Ok(feed) => feed,
                Err(e) => {
                    error!(operation = "trakt_rss", source = %source_id, error = %e, "Trakt RSS request failed");
                    pass.report.failed_sources.push(source_id);
                    continue;
                }
            };

            self.process_feed(&feed, last_synced, pass).await?;
            advanced.insert(source_id, feed.updated.max(last_synced));
        }

        if !advanced.is_empty() {
            info!(operation = "trakt_rss", count = advanced.len(), "Storing last synced dates");
            self.cursors.write(&advanced).await?;
            pass.report.cursors = advanced
                .into_iter()
                .map(|(source_id, last_synced)| SyncCursor { source_id, last_synced })
                .collect();
            pass.report.cursors.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        }
        Ok(())
    }

    async fn fetch_feed(&self, url: &str) -> movie_sync_sources::SourceResult<WatchlistFeed> {
        let document = self.lists.fetch_watchlist_feed(url).await?;
        parse_watchlist_feed(&document)
    }

    /// Walk entries newest first, stopping at the first one not newer than `last_synced`
    async fn process_feed(&self, feed: &WatchlistFeed, last_synced: DateTime<Utc>, pass: &mut Pass) -> Result<()> {
        for entry in &feed.entries {
            let Some(published) = entry.published else {
                warn!(operation = "trakt_rss", title = ?entry.title, "Unable to parse Trakt RSS entry date");
                pass.report.failed_entries += 1;
                continue;
            };
            if last_synced >= published {
                break;
            }
            let Some(text) = entry.title.as_deref() else {
                warn!(operation = "trakt_rss", "Trakt RSS entry has no title");
                pass.report.failed_entries += 1;
                continue;
            };

            let Some((title, year)) = split_title_year(text) else {
                warn!(operation = "trakt_rss", title = %text, "Trakt RSS entry title has no year");
                pass.report.failed_entries += 1;
                continue;
            };
            match self.resolve(&title, year).await {
                Some(record) => {
                    info!(operation = "trakt_rss", title = %title, year, "Found new watchlist movie");
                    self.add_to_library(record, pass).await?;
                }
                None => {
                    warn!(operation = "trakt_rss", title = %title, year, "Unable to find movie on TheMovieDatabase");
                    pass.report.failed_entries += 1;
                }
            }
        }
        Ok(())
    }

    /// First search hit, completed with detail data so it carries an IMDB id
    async fn resolve(&self, title: &str, year: u32) -> Option<MovieRecord> {
        let term = format!("{} {}", title, year);
        debug!(operation = "trakt_rss", term = %term, "Searching TheMovieDatabase");

        let found = self.metadata.search(&term, true).await.into_iter().next()?;
        if found.library_key().is_some() {
            return Some(found);
        }
        self.metadata.lookup_by_tmdb_id(found.tmdb_id?, None).await
    }

    /// Add unless the IMDB id is unusable or already known to the library or this pass
    async fn add_to_library(&self, record: MovieRecord, pass: &mut Pass) -> Result<()> {
        let Some(imdb_id) = record.library_key().map(str::to_string) else {
            debug!(operation = "trakt_add", title = %record.title, "Skipping movie without IMDB id");
            pass.report.skipped += 1;
            return Ok(());
        };
        if pass.is_known(&imdb_id) {
            debug!(operation = "trakt_add", imdb_id = %imdb_id, "Already in library");
            pass.report.skipped += 1;
            return Ok(());
        }

        info!(operation = "trakt_add", title = %record.title, imdb_id = %imdb_id, "Adding movie from Trakt");
        let movie = record.into_library_entry(TRAKT_ORIGIN);
        let outcome = self.library.add_movie(movie.clone()).await?;
        pass.added_ids.insert(imdb_id);
        if !outcome.added {
            pass.report.skipped += 1;
            return Ok(());
        }

        if self.options.search_after_add && movie.year.is_some() {
            if let Some(search) = &self.search {
                if let Err(e) = search.search(&movie).await {
                    error!(operation = "trakt_add", title = %movie.title, error = %e, "Search after add failed");
                }
            }
        }
        pass.report.added.push(movie);
        Ok(())
    }
}
