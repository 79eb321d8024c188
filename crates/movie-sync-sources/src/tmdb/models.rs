use movie_sync_models::{is_usable_imdb_id, MovieRecord};
use serde::{Deserialize, Serialize};

/// Movie as returned by the TMDB API (search results, `find` results and details)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub alternative_titles: Option<AlternativeTitles>,
    #[serde(default)]
    pub translations: Option<Translations>,
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AlternativeTitles {
    #[serde(default)]
    pub titles: Vec<AlternativeTitle>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlternativeTitle {
    pub iso_3166_1: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Translations {
    #[serde(default)]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Translation {
    pub iso_3166_1: String,
    pub iso_639_1: String,
    #[serde(default)]
    pub data: TranslationData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TranslationData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
    /// Set to false on error payloads
    #[serde(default)]
    pub success: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FindResponse {
    #[serde(default)]
    pub movie_results: Vec<TmdbMovie>,
}

impl TmdbMovie {
    /// IMDB id from the detail field or the appended `external_ids`
    pub fn resolved_imdb_id(&self) -> Option<&str> {
        self.imdb_id
            .as_deref()
            .or_else(|| self.external_ids.as_ref().and_then(|ids| ids.imdb_id.as_deref()))
            .filter(|id| is_usable_imdb_id(id))
    }

    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    }

    /// Plain conversion without language handling
    pub fn into_record(self) -> MovieRecord {
        let imdb_id = self.resolved_imdb_id().map(str::to_string);
        let year = self.year();
        MovieRecord {
            tmdb_id: Some(self.id),
            imdb_id,
            title: self.title,
            year,
            original_title: self.original_title,
            original_language: self.original_language,
            overview: self.overview.filter(|o| !o.is_empty()),
            release_date: self.release_date,
            poster_path: self.poster_path,
            ..MovieRecord::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_payload_deserializes() {
        let json = r#"{
            "id": 44214,
            "imdb_id": "tt0947798",
            "title": "Black Swan",
            "original_title": "Black Swan",
            "original_language": "en",
            "release_date": "2010-12-03",
            "status": "Released",
            "alternative_titles": {"titles": [{"iso_3166_1": "DE", "title": "Schwarzer Schwan", "type": ""}]},
            "translations": {"translations": [
                {"iso_3166_1": "DE", "iso_639_1": "de", "name": "Deutsch",
                 "data": {"title": "Black Swan", "overview": "Eine Ballerina...", "homepage": ""}}
            ]}
        }"#;

        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, 44214);
        assert_eq!(movie.year(), Some(2010));
        assert_eq!(movie.alternative_titles.as_ref().unwrap().titles.len(), 1);
        assert_eq!(movie.translations.as_ref().unwrap().translations[0].iso_639_1, "de");

        let record = movie.into_record();
        assert_eq!(record.imdb_id.as_deref(), Some("tt0947798"));
        assert_eq!(record.tmdb_id, Some(44214));
        assert_eq!(record.status, None);
    }

    #[test]
    fn test_imdb_id_falls_back_to_external_ids() {
        let movie = TmdbMovie {
            id: 1,
            imdb_id: Some(String::new()),
            external_ids: Some(ExternalIds { imdb_id: Some("tt0000001".to_string()) }),
            ..TmdbMovie::default()
        };
        // An empty detail field still counts as present, so it wins and is rejected
        assert_eq!(movie.resolved_imdb_id(), None);

        let movie = TmdbMovie {
            id: 1,
            imdb_id: None,
            external_ids: Some(ExternalIds { imdb_id: Some("tt0000001".to_string()) }),
            ..TmdbMovie::default()
        };
        assert_eq!(movie.resolved_imdb_id(), Some("tt0000001"));
    }

    #[test]
    fn test_search_payload_with_missing_fields() {
        let json = r#"{"page": 1, "results": [{"id": 7, "title": "Untitled"}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].year(), None);
        assert_eq!(response.success, None);
    }
}
