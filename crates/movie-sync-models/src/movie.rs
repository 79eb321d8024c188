use serde::{Deserialize, Serialize};
use crate::status::MovieStatus;

/// A movie as produced by metadata lookups and consumed by the library
///
/// `imdb_id` is the cross-source identity key; `tmdb_id` is the metadata
/// service key. Records coming out of a search never carry `status`: status
/// only exists once the library owns the movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MovieRecord {
    pub tmdb_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub title: String,
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MovieStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,

    /// Default (untranslated) title, kept whenever a localized title was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_title: Option<String>,
    /// Localized title candidates, first entry is the display title
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub localized_titles: Vec<String>,
}

impl MovieRecord {
    /// The IMDB id if it is usable as a library key
    pub fn library_key(&self) -> Option<&str> {
        self.imdb_id.as_deref().filter(|id| is_usable_imdb_id(id))
    }

    /// Mark the record as added to the library from `origin`
    pub fn into_library_entry(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self.status = Some(MovieStatus::Waiting);
        self.quality_profile = Some("Default".to_string());
        self
    }
}

/// Upstream services report a missing IMDB id as "" or "N/A"
pub fn is_usable_imdb_id(id: &str) -> bool {
    let id = id.trim();
    !id.is_empty() && id != "N/A"
}
