use super::models::TmdbMovie;
use movie_sync_models::MovieRecord;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Requested display language, `language-COUNTRY` (ISO 639-1 / ISO 3166-1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTag {
    pub language: String,
    pub country: String,
}

impl FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('-') {
            Some((language, country)) if !language.is_empty() && !country.is_empty() => Ok(Self {
                language: language.to_string(),
                country: country.to_string(),
            }),
            _ => Err(format!("Invalid language tag '{}', expected e.g. 'de-DE'", s)),
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.language, self.country)
    }
}

/// Push unless already present, keeping first-seen order
fn push_unique(titles: &mut Vec<String>, title: &str) {
    if !titles.iter().any(|t| t == title) {
        titles.push(title.to_string());
    }
}

/// Convert a detail record, localizing title and overview for `tag`
///
/// The default title always lands in `english_title`. When the movie was
/// originally made in the requested language, the original title is shown
/// and is the only candidate. Otherwise candidates are the alternative titles
/// for the requested country followed by the matching translation's title;
/// the first one becomes the display title, and the default title is the
/// sole candidate when none exist.
pub fn localize(movie: TmdbMovie, tag: &LanguageTag) -> MovieRecord {
    let is_original = movie.original_language.as_deref() == Some(tag.language.as_str());

    let mut candidates = Vec::new();
    if !is_original {
        for alt in movie.alternative_titles.iter().flat_map(|alt| alt.titles.iter()) {
            if alt.iso_3166_1 == tag.country {
                push_unique(&mut candidates, &alt.title);
            }
        }
        debug!(language = %tag, count = candidates.len(), "Collected alternative titles");
    }

    let translation = movie
        .translations
        .iter()
        .flat_map(|t| t.translations.iter())
        .find(|t| t.iso_3166_1 == tag.country && t.iso_639_1 == tag.language)
        .map(|t| t.data.clone());

    let mut overview_override = None;
    if let Some(data) = translation {
        debug!(language = %tag, "Found translation");
        if !is_original {
            if let Some(title) = data.title.as_deref().filter(|t| !t.is_empty()) {
                push_unique(&mut candidates, title);
            }
        }
        overview_override = data.overview.filter(|o| !o.is_empty());
    }

    let mut record = movie.into_record();
    let default_title = record.title.clone();

    if is_original {
        if let Some(original) = record.original_title.clone().filter(|t| !t.is_empty()) {
            record.title = original;
        }
        candidates.push(record.title.clone());
    } else if let Some(first) = candidates.first() {
        record.title = first.clone();
    } else {
        candidates.push(default_title.clone());
    }

    if let Some(overview) = overview_override {
        record.overview = Some(overview);
    }
    record.english_title = Some(default_title);
    record.localized_titles = candidates;
    record
}
