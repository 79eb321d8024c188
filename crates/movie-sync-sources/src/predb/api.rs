use crate::error::{SourceError, SourceResult};
use crate::traits::FeedBackend;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

pub const PREDB_BASE_URL: &str = "https://predb.me/";

/// predb.me release RSS
pub struct PredbApi {
    client: Client,
    base_url: String,
    include_unknown: bool,
}

impl PredbApi {
    pub fn new(client: Client, include_unknown: bool) -> Self {
        Self {
            client,
            base_url: PREDB_BASE_URL.to_string(),
            include_unknown,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// `cats` parameter; `unknown` catches mislabelled movie releases
    pub fn categories(&self) -> &'static str {
        if self.include_unknown {
            "movies,unknown"
        } else {
            "movies"
        }
    }
}

#[async_trait]
impl FeedBackend for PredbApi {
    async fn fetch_feed(&self, query: Option<&str>) -> SourceResult<String> {
        let mut params = vec![("cats", self.categories().to_string())];
        if let Some(query) = query {
            let ascii: String = query.chars().filter(char::is_ascii).collect();
            params.push(("search", ascii));
        }
        params.push(("rss", "1".to_string()));

        debug!(operation = "predb_fetch", query = ?query, "Requesting predb feed");
        let response = self.client.get(&self.base_url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation = "predb_fetch", status = status.as_u16(), "predb request failed");
            return Err(SourceError::Status { status: status.as_u16(), body });
        }

        Ok(response.text().await?)
    }
}
