pub mod error;
pub mod factory;
pub mod predb;
pub mod rate_limiter;
#[cfg(test)]
mod stub_server;
pub mod tmdb;
pub mod traits;
pub mod trakt;
pub mod youtube;

pub use error::{ErrorKind, SourceError, SourceResult};
pub use factory::{build_metadata_client, build_predb_api, build_trailer_client, build_trakt_api, create_http_client};
pub use predb::PredbApi;
pub use rate_limiter::RateLimiter;
pub use tmdb::{LanguageTag, MetadataClient, MovieCategory, SearchTerm, TmdbApi, TmdbMovie};
pub use traits::{FeedBackend, ListBackend, MetadataBackend};
pub use trakt::{TraktApi, WatchlistFeed};
pub use youtube::TrailerClient;
