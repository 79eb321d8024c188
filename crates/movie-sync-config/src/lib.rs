pub mod config;
pub mod paths;

pub use config::{Config, LoggingConfig, PredbConfig, RateLimitConfig, SchedulerConfig, SyncOptions, TmdbConfig, TraktConfig, YoutubeConfig, default_scheduler_config};
pub use paths::{PathManager, container_base_path};
