//! Construction of the external service clients from configuration.

use crate::predb::PredbApi;
use crate::rate_limiter::RateLimiter;
use crate::tmdb::{MetadataClient, TmdbApi};
use crate::trakt::TraktApi;
use crate::youtube::TrailerClient;
use anyhow::{Context, Result};
use movie_sync_config::Config;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client; every request is bounded by a timeout
pub fn create_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Metadata client with its own token bucket
pub fn build_metadata_client(config: &Config, client: Client) -> MetadataClient {
    let backend = TmdbApi::new(client, config.tmdb.api_key.clone());
    let limiter = RateLimiter::from_config(&config.tmdb.rate_limit);
    MetadataClient::new(Arc::new(backend), Arc::new(limiter), config.tmdb.include_adult)
}

/// `None` when release checking is disabled
pub fn build_predb_api(config: &Config, client: Client) -> Option<PredbApi> {
    config
        .predb
        .enabled
        .then(|| PredbApi::new(client, config.predb.include_unknown))
}

/// `None` when no Trakt section is configured
pub fn build_trakt_api(config: &Config, client: Client) -> Option<TraktApi> {
    config
        .trakt
        .as_ref()
        .map(|trakt| TraktApi::new(client, trakt.client_id.clone()))
}

/// `None` without a YouTube API key
pub fn build_trailer_client(config: &Config, client: Client) -> Option<TrailerClient> {
    config
        .youtube
        .as_ref()
        .filter(|youtube| !youtube.api_key.is_empty())
        .map(|youtube| TrailerClient::new(client, youtube.api_key.clone()))
}
