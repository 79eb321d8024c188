use crate::error::{SourceError, SourceResult};
use crate::traits::ListBackend;
use async_trait::async_trait;
use movie_sync_models::{RankedList, RemoteIds, RemoteListEntry};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const TRAKT_API_URL: &str = "https://api.trakt.tv";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraktIds {
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
    pub trakt: Option<u64>,
    pub slug: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TraktMovie {
    title: String,
    year: Option<u32>,
    #[serde(default)]
    ids: TraktIds,
    rating: Option<f64>,
}

/// Every ranked list except `popular` wraps the movie with list statistics
#[derive(Debug, Serialize, Deserialize)]
struct TraktListItem {
    movie: TraktMovie,
}

/// Remove slashes from IMDB ID (Trakt sometimes includes them)
fn remove_slashes(s: Option<String>) -> Option<String> {
    s.map(|id| id.replace('/', "")).filter(|id| !id.is_empty())
}

impl From<TraktMovie> for RemoteListEntry {
    fn from(movie: TraktMovie) -> Self {
        RemoteListEntry {
            title: movie.title,
            year: movie.year,
            ids: RemoteIds {
                imdb: remove_slashes(movie.ids.imdb),
                tmdb: movie.ids.tmdb,
                trakt: movie.ids.trakt,
                slug: movie.ids.slug,
            },
            rating: movie.rating,
        }
    }
}

/// Decode a ranked list response, keeping the first `length` movies
pub fn parse_ranked_list(list: RankedList, body: &str, length: usize) -> SourceResult<Vec<RemoteListEntry>> {
    let movies: Vec<TraktMovie> = match list {
        RankedList::Popular => serde_json::from_str(body)?,
        _ => serde_json::from_str::<Vec<TraktListItem>>(body)?
            .into_iter()
            .map(|item| item.movie)
            .collect(),
    };

    Ok(movies.into_iter().take(length).map(RemoteListEntry::from).collect())
}

/// Public Trakt endpoints used for watchlist syncing
pub struct TraktApi {
    client: Client,
    client_id: String,
    base_url: String,
}

impl TraktApi {
    pub fn new(client: Client, client_id: String) -> Self {
        Self {
            client,
            client_id,
            base_url: TRAKT_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get_text(&self, url: &str, with_api_headers: bool) -> SourceResult<String> {
        let mut request = self.client.get(url);
        if with_api_headers {
            request = request
                .header("Content-Type", "application/json")
                .header("trakt-api-version", "2")
                .header("trakt-api-key", &self.client_id);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation = "trakt_request", url = %url, status = status.as_u16(), "Trakt request failed");
            return Err(SourceError::Status { status: status.as_u16(), body });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ListBackend for TraktApi {
    async fn ranked_list(&self, list: RankedList, length: usize) -> SourceResult<Vec<RemoteListEntry>> {
        let url = format!("{}/movies/{}/?extended=full&limit={}", self.base_url, list, length);
        debug!(operation = "trakt_ranked_list", list = %list, length = length, "Fetching Trakt list");

        let body = self.get_text(&url, true).await?;
        parse_ranked_list(list, &body, length)
    }

    async fn fetch_watchlist_feed(&self, url: &str) -> SourceResult<String> {
        debug!(operation = "trakt_rss", url = %url, "Fetching Trakt watchlist feed");
        self.get_text(url, false).await
    }
}
