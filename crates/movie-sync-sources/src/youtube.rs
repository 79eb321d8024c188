use crate::error::{SourceError, SourceResult};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use tracing::{error, info, warn};

pub const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

/// Trailer search is flaky enough to retry; metadata calls are not
const TRAILER_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
}

#[derive(Debug, Deserialize)]
struct VideoId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

/// Video id of the first search hit
pub fn parse_video_id(body: &str) -> SourceResult<Option<String>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.items.into_iter().find_map(|item| item.id.video_id))
}

/// Run `attempt` up to `attempts` times, stopping at the first success
pub async fn with_retries<T, F, Fut>(attempts: u32, mut attempt: F) -> SourceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SourceResult<T>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if tries < attempts => {
                warn!(operation = "retry", attempt = tries, error = %e, "Attempt failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

/// YouTube trailer lookup
pub struct TrailerClient {
    client: Client,
    api_key: String,
    search_url: String,
}

impl TrailerClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            search_url: YOUTUBE_SEARCH_URL.to_string(),
        }
    }

    async fn search_once(&self, query: &str) -> SourceResult<Option<String>> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("maxResults", "1"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status: status.as_u16(), body });
        }

        parse_video_id(&response.text().await?)
    }

    /// Embed id of the trailer for `title_date` (e.g. "Black Swan 2010")
    pub async fn trailer(&self, title_date: &str) -> Option<String> {
        info!(operation = "trailer", title = %title_date, "Getting trailer from YouTube");
        let query = format!("{} trailer", title_date);

        match with_retries(TRAILER_ATTEMPTS, || self.search_once(&query)).await {
            Ok(video_id) => video_id,
            Err(e) => {
                error!(operation = "trailer", title = %title_date, error = %e, "Unable to get trailer from YouTube");
                None
            }
        }
    }
}
