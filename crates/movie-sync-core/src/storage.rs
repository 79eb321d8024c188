//! JSON file backed library and cursor stores.

use crate::library::{AddOutcome, CursorStore, LibraryStore};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use movie_sync_models::{MovieRecord, MovieUpdate, PredbStatus, TrackedTitle};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A library movie plus its release tracking flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryEntry {
    #[serde(flatten)]
    pub movie: MovieRecord,
    #[serde(default)]
    pub predb: PredbStatus,
    #[serde(default)]
    pub predb_backlog: bool,
}

impl LibraryEntry {
    fn tracked(&self) -> Option<TrackedTitle> {
        Some(TrackedTitle {
            imdb_id: self.movie.library_key()?.to_string(),
            title: self.movie.title.clone(),
            year: self.movie.year,
            status: self.movie.status.unwrap_or_default(),
            predb: self.predb,
            predb_backlog: self.predb_backlog,
        })
    }
}

async fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Atomic write: write to temp file, then rename
async fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, content).await?;
    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Library stored as a JSON array of [`LibraryEntry`]
pub struct JsonLibraryStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonLibraryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, lock: Mutex::new(()) }
    }

    pub async fn entries(&self) -> Result<Vec<LibraryEntry>> {
        load_json(&self.path).await
    }
}

#[async_trait]
impl LibraryStore for JsonLibraryStore {
    async fn tracked_titles(&self) -> Result<Vec<TrackedTitle>> {
        Ok(self.entries().await?.iter().filter_map(LibraryEntry::tracked).collect())
    }

    async fn imdb_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .entries()
            .await?
            .iter()
            .filter_map(|e| e.movie.library_key().map(str::to_string))
            .collect())
    }

    async fn add_movie(&self, movie: MovieRecord) -> Result<AddOutcome> {
        let Some(imdb_id) = movie.library_key().map(str::to_string) else {
            warn!(operation = "library_add", title = %movie.title, "Refusing movie without IMDB id");
            return Ok(AddOutcome { added: false });
        };

        let _guard = self.lock.lock().await;
        let mut entries = self.entries().await?;
        if entries.iter().any(|e| e.movie.library_key() == Some(imdb_id.as_str())) {
            debug!(operation = "library_add", imdb_id = %imdb_id, "Movie already in library");
            return Ok(AddOutcome { added: false });
        }

        entries.push(LibraryEntry {
            movie,
            predb: PredbStatus::Unknown,
            predb_backlog: false,
        });
        save_json(&self.path, &entries).await?;
        Ok(AddOutcome { added: true })
    }

    async fn update_movie(&self, imdb_id: &str, update: MovieUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let _guard = self.lock.lock().await;
        let mut entries = self.entries().await?;
        let entry = entries
            .iter_mut()
            .find(|e| e.movie.library_key() == Some(imdb_id))
            .ok_or_else(|| anyhow!("Movie {} is not in the library", imdb_id))?;

        if let Some(backlog) = update.predb_backlog {
            entry.predb_backlog = backlog;
        }
        if let Some(predb) = update.predb {
            entry.predb = predb;
        }
        if let Some(status) = update.status {
            entry.movie.status = Some(status);
        }
        save_json(&self.path, &entries).await
    }
}

/// Cursors stored as `{source_id: RFC 3339 timestamp}`
pub struct JsonCursorStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonCursorStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, lock: Mutex::new(()) }
    }

    pub async fn all(&self) -> Result<BTreeMap<String, DateTime<Utc>>> {
        load_json(&self.path).await
    }
}

#[async_trait]
impl CursorStore for JsonCursorStore {
    async fn read(&self, source_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.all().await?.get(source_id).copied())
    }

    async fn write(&self, cursors: &HashMap<String, DateTime<Utc>>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut stored = self.all().await?;
        for (source_id, last_synced) in cursors {
            stored.insert(source_id.clone(), *last_synced);
        }
        save_json(&self.path, &stored).await
    }
}
