pub mod config;
pub mod daemon;
pub mod lookup;
pub mod sync;

use async_trait::async_trait;
use color_eyre::Result;
use movie_sync_config::{Config, PathManager};
use movie_sync_core::{FeedMatcher, JsonCursorStore, JsonLibraryStore, SearchTrigger, WatchlistOptions, WatchlistSync};
use movie_sync_models::MovieRecord;
use movie_sync_sources::{build_metadata_client, build_predb_api, build_trakt_api, create_http_client, MetadataClient};
use std::sync::Arc;
use tracing::info;

/// Load and validate the config file
pub fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        return Err(color_eyre::eyre::eyre!(
            "Configuration file not found at {}. Run 'marquee config init' first.",
            config_file.display()
        ));
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Configuration validation failed: {}", e))?;
    Ok(config)
}

/// Records that a release search was requested for a freshly added movie
pub struct LoggedSearch;

#[async_trait]
impl SearchTrigger for LoggedSearch {
    async fn search(&self, movie: &MovieRecord) -> anyhow::Result<()> {
        info!(
            operation = "search_after_add",
            title = %movie.title,
            year = ?movie.year,
            imdb_id = ?movie.imdb_id,
            "Queued release search"
        );
        Ok(())
    }
}

/// Every long-lived component, wired from one config
pub struct Services {
    pub metadata: Arc<MetadataClient>,
    pub watchlist: Option<WatchlistSync>,
    pub feed_matcher: Option<FeedMatcher>,
}

impl Services {
    pub fn build(config: &Config, path_manager: &PathManager) -> Result<Self> {
        path_manager
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;

        let client = create_http_client().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
        let library = Arc::new(JsonLibraryStore::new(path_manager.library_file()));
        let cursors = Arc::new(JsonCursorStore::new(path_manager.sync_record_file()));
        let metadata = Arc::new(build_metadata_client(config, client.clone()));

        let watchlist = match (config.is_trakt_configured(), &config.trakt) {
            (true, Some(trakt)) => build_trakt_api(config, client.clone()).map(|api| {
                let options = WatchlistOptions::from_config(trakt, &config.sync);
                WatchlistSync::new(Arc::new(api), metadata.clone(), library.clone(), cursors.clone(), options)
                    .with_search_trigger(Arc::new(LoggedSearch))
            }),
            _ => None,
        };

        let feed_matcher = build_predb_api(config, client).map(|api| FeedMatcher::new(Arc::new(api), library.clone()));

        Ok(Self {
            metadata,
            watchlist,
            feed_matcher,
        })
    }
}
