pub mod api;
pub mod client;
pub mod language;
pub mod models;

pub use api::{TmdbApi, TMDB_BASE_URL};
pub use client::{MetadataClient, MovieCategory, SearchTerm};
pub use language::{localize, LanguageTag};
pub use models::TmdbMovie;
