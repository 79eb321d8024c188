use super::client::MovieCategory;
use super::models::{FindResponse, SearchResponse, TmdbMovie};
use crate::error::{SourceError, SourceResult};
use crate::traits::MetadataBackend;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

const DETAIL_APPEND: &str = "alternative_titles,external_ids,release_dates";

/// HTTP access to the TMDB v3 API
pub struct TmdbApi {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbApi {
    pub fn new(client: Client, api_key: String) -> Self {
        Self::with_base_url(client, api_key, TMDB_BASE_URL.to_string())
    }

    pub fn with_base_url(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET `path` with `params`; `Ok(None)` on 404
    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> SourceResult<Option<T>> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(operation = "tmdb_request", path = %path, "Requesting TMDB");

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation = "tmdb_request", path = %path, status = status.as_u16(), "TMDB request failed");
            return Err(SourceError::Status { status: status.as_u16(), body });
        }

        let text = response.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn check_search(response: SearchResponse) -> SourceResult<Vec<TmdbMovie>> {
        if response.success == Some(false) {
            return Err(SourceError::InvalidRequest("TMDB rejected the request".to_string()));
        }
        Ok(response.results)
    }
}

#[async_trait]
impl MetadataBackend for TmdbApi {
    async fn search_by_text(&self, query: &str, year: Option<u32>, include_adult: bool) -> SourceResult<Vec<TmdbMovie>> {
        let mut params = vec![
            ("page", "1".to_string()),
            ("include_adult", include_adult.to_string()),
            ("query", query.to_string()),
        ];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        match self.get_json::<SearchResponse>("search/movie", &params).await? {
            Some(response) => Self::check_search(response),
            None => Ok(Vec::new()),
        }
    }

    async fn search_by_imdb_id(&self, imdb_id: &str) -> SourceResult<Option<TmdbMovie>> {
        let params = [
            ("language", "en-US".to_string()),
            ("external_source", "imdb_id".to_string()),
            ("append_to_response", DETAIL_APPEND.to_string()),
        ];

        let response = self
            .get_json::<FindResponse>(&format!("find/{}", imdb_id), &params)
            .await?;

        Ok(response.and_then(|r| r.movie_results.into_iter().next()).map(|mut movie| {
            // `find` results carry no imdb_id of their own
            movie.imdb_id = Some(imdb_id.to_string());
            movie
        }))
    }

    async fn get_detail(&self, tmdb_id: u64, with_translations: bool) -> SourceResult<Option<TmdbMovie>> {
        let mut append = DETAIL_APPEND.to_string();
        if with_translations {
            append.push_str(",translations");
        }
        let params = [("language", "en-US".to_string()), ("append_to_response", append)];

        self.get_json::<TmdbMovie>(&format!("movie/{}", tmdb_id), &params).await
    }

    async fn get_category_list(&self, category: MovieCategory) -> SourceResult<Vec<TmdbMovie>> {
        let params = [("language", "en-US".to_string()), ("page", "1".to_string())];

        match self.get_json::<SearchResponse>(&category.path(), &params).await? {
            Some(response) => Self::check_search(response),
            None => Err(SourceError::NotFound(format!("category {}", category))),
        }
    }
}
