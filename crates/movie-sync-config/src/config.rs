use movie_sync_models::RankedList;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub predb: PredbConfig,
    #[serde(default)]
    pub trakt: Option<TraktConfig>,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub youtube: Option<YoutubeConfig>,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    #[serde(default)]
    pub include_adult: bool,
    /// Requested display language as `language-COUNTRY`, e.g. `de-DE`
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Token bucket limits for the metadata API
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_refill_interval_secs")]
    pub refill_interval_secs: u64,
    #[serde(default = "default_reserve")]
    pub reserve: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_interval_secs: default_refill_interval_secs(),
            reserve: default_reserve(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PredbConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Also query the `unknown` category, which catches mislabelled movie releases
    #[serde(default)]
    pub include_unknown: bool,
}

impl Default for PredbConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_unknown: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TraktConfig {
    pub client_id: String,
    /// Minimum rating (0-10) a ranked list entry needs to be added
    #[serde(default)]
    pub min_score: f64,
    /// How many entries to read from each ranked list
    #[serde(default = "default_list_length")]
    pub length: usize,
    /// Ranked list name -> enabled
    #[serde(default)]
    pub lists: BTreeMap<String, bool>,
    /// Personal watchlist Atom feeds
    #[serde(default)]
    pub rss_urls: Vec<String>,
}

impl TraktConfig {
    /// Enabled list names, sorted by name
    pub fn enabled_lists(&self) -> Vec<&str> {
        self.lists
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SyncOptions {
    /// Trigger a release search right after a synced movie is added
    #[serde(default)]
    pub search_after_add: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct YoutubeConfig {
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Force JSON output; detected from the terminal when unset
    #[serde(default)]
    pub json: Option<bool>,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: None,
            file: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> u32 {
    30
}

fn default_refill_interval_secs() -> u64 {
    10
}

fn default_reserve() -> u32 {
    3
}

fn default_poll_interval_ms() -> u64 {
    300
}

fn default_list_length() -> usize {
    10
}

fn default_schedule() -> String {
    // tokio-cron-scheduler expressions carry a seconds field
    "0 0 */6 * * *".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        schedule: default_schedule(),
        run_on_startup: default_true(),
    }
}

impl Config {
    /// A config with every optional feature off, written by `config init`
    pub fn template() -> Self {
        let lists = RankedList::ALL
            .iter()
            .map(|list| (list.as_str().to_string(), false))
            .collect();

        Self {
            tmdb: TmdbConfig {
                api_key: "YOUR_TMDB_API_KEY".to_string(),
                include_adult: false,
                language: None,
                rate_limit: RateLimitConfig::default(),
            },
            predb: PredbConfig::default(),
            trakt: Some(TraktConfig {
                client_id: "YOUR_CLIENT_ID".to_string(),
                min_score: 0.0,
                length: default_list_length(),
                lists,
                rss_urls: Vec::new(),
            }),
            sync: SyncOptions::default(),
            youtube: None,
            scheduler: Some(default_scheduler_config()),
            logging: LoggingConfig::default(),
        }
    }

    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tmdb.api_key.is_empty() || self.tmdb.api_key == "YOUR_TMDB_API_KEY" {
            return Err(anyhow::anyhow!("tmdb.api_key is not configured"));
        }

        let limits = &self.tmdb.rate_limit;
        if limits.capacity == 0 {
            return Err(anyhow::anyhow!("tmdb.rate_limit.capacity must be at least 1"));
        }
        if limits.reserve > limits.capacity {
            return Err(anyhow::anyhow!(
                "tmdb.rate_limit.reserve ({}) cannot exceed capacity ({})",
                limits.reserve,
                limits.capacity
            ));
        }

        if let Some(language) = &self.tmdb.language {
            let valid = language
                .split_once('-')
                .map(|(lang, country)| !lang.is_empty() && !country.is_empty())
                .unwrap_or(false);
            if !valid {
                return Err(anyhow::anyhow!(
                    "tmdb.language must look like 'de-DE', got '{}'",
                    language
                ));
            }
        }

        if let Some(trakt) = &self.trakt {
            let uses_api = !trakt.enabled_lists().is_empty();
            if uses_api && (trakt.client_id.is_empty() || trakt.client_id == "YOUR_CLIENT_ID") {
                return Err(anyhow::anyhow!("Trakt lists are enabled but client_id is not configured"));
            }
            for name in trakt.lists.keys() {
                name.parse::<RankedList>().map_err(|e| anyhow::anyhow!("trakt.lists: {}", e))?;
            }
            for url in &trakt.rss_urls {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(anyhow::anyhow!("Invalid Trakt RSS url: {}", url));
                }
            }
        }

        if let Some(youtube) = &self.youtube {
            if youtube.api_key.is_empty() {
                return Err(anyhow::anyhow!("youtube.api_key is empty"));
            }
        }

        Ok(())
    }

    pub fn is_trakt_configured(&self) -> bool {
        self.trakt
            .as_ref()
            .map(|trakt| !trakt.enabled_lists().is_empty() || !trakt.rss_urls.is_empty())
            .unwrap_or(false)
    }
}
