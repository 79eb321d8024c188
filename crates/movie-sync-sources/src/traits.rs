use async_trait::async_trait;
use movie_sync_models::{RankedList, RemoteListEntry};
use crate::error::SourceResult;
use crate::tmdb::{MovieCategory, TmdbMovie};

/// Raw access to the movie metadata service
///
/// Implementations report every failure as a typed `SourceError`; deciding
/// whether a failure means "not found" is left to `MetadataClient`.
#[async_trait]
pub trait MetadataBackend: Send + Sync {
    /// Free-text title search, optionally filtered by release year
    async fn search_by_text(
        &self,
        query: &str,
        year: Option<u32>,
        include_adult: bool,
    ) -> SourceResult<Vec<TmdbMovie>>;

    /// Look up a movie by its IMDB id
    async fn search_by_imdb_id(&self, imdb_id: &str) -> SourceResult<Option<TmdbMovie>>;

    /// Full detail record, with translations appended when `with_translations` is set
    async fn get_detail(&self, tmdb_id: u64, with_translations: bool) -> SourceResult<Option<TmdbMovie>>;

    /// Movies in a fixed category; `Similar` carries its reference movie
    async fn get_category_list(&self, category: MovieCategory) -> SourceResult<Vec<TmdbMovie>>;
}

/// Release feed (predb style RSS)
#[async_trait]
pub trait FeedBackend: Send + Sync {
    /// Fetch the raw feed document; `None` fetches the unscoped rolling feed
    async fn fetch_feed(&self, query: Option<&str>) -> SourceResult<String>;
}

/// Remote watchlist service offering ranked lists and personal Atom feeds
#[async_trait]
pub trait ListBackend: Send + Sync {
    /// The first `length` entries of a ranked list, unfiltered
    async fn ranked_list(&self, list: RankedList, length: usize) -> SourceResult<Vec<RemoteListEntry>>;

    /// Raw Atom document behind a personal watchlist feed url
    async fn fetch_watchlist_feed(&self, url: &str) -> SourceResult<String>;
}
