//! Collaborators the sync engine reads from and writes to.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use movie_sync_models::{MovieRecord, MovieUpdate, TrackedTitle};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: bool,
}

/// The local movie library, keyed by IMDB id
#[async_trait]
pub trait LibraryStore: Send + Sync {
    async fn tracked_titles(&self) -> Result<Vec<TrackedTitle>>;

    /// IMDB ids of every movie in the library
    async fn imdb_ids(&self) -> Result<HashSet<String>>;

    /// Add a movie; `added` is false when the IMDB id is already present or unusable
    async fn add_movie(&self, movie: MovieRecord) -> Result<AddOutcome>;

    async fn update_movie(&self, imdb_id: &str, update: MovieUpdate) -> Result<()>;
}

/// Persisted last-synced markers of incremental sources
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn read(&self, source_id: &str) -> Result<Option<DateTime<Utc>>>;

    /// Insert or update every cursor in `cursors`, leaving others untouched
    async fn write(&self, cursors: &HashMap<String, DateTime<Utc>>) -> Result<()>;
}

/// Downstream release search, triggered for freshly added movies
#[async_trait]
pub trait SearchTrigger: Send + Sync {
    async fn search(&self, movie: &MovieRecord) -> Result<()>;
}
