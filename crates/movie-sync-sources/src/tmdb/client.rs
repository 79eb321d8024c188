use super::language::{localize, LanguageTag};
use crate::error::{ErrorKind, SourceResult};
use crate::rate_limiter::RateLimiter;
use crate::traits::MetadataBackend;
use movie_sync_models::MovieRecord;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// Free-text searches return at most this many movies
const MAX_TEXT_RESULTS: usize = 6;

static IMDB_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^tt[0-9]{7,9}$").expect("valid regex"));
static IMDB_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^imdb:\s*(tt[0-9]{7,8})\s*$").expect("valid regex"));
static TMDB_PREFIXED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^tmdb:\s*([0-9]+)\s*$").expect("valid regex"));

/// A search term, classified once by its lexical shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// `tt0947798` or `imdb:tt0947798`
    ImdbId(String),
    /// `tmdb:44214`
    TmdbId(u64),
    /// Anything else; a trailing 4-digit year becomes a filter
    Title { title: String, year: Option<u32> },
}

impl SearchTerm {
    pub fn parse(term: &str) -> Self {
        if IMDB_ID.is_match(term) {
            return SearchTerm::ImdbId(term.to_string());
        }
        if let Some(caps) = IMDB_PREFIXED.captures(term) {
            return SearchTerm::ImdbId(caps[1].to_string());
        }
        if let Some(id) = TMDB_PREFIXED.captures(term).and_then(|caps| caps[1].parse().ok()) {
            return SearchTerm::TmdbId(id);
        }

        let chars: Vec<char> = term.chars().collect();
        if chars.len() > 4 && chars[chars.len() - 4..].iter().all(|c| c.is_ascii_digit()) {
            let title: String = chars[..chars.len() - 4].iter().collect();
            let year: String = chars[chars.len() - 4..].iter().collect();
            return SearchTerm::Title {
                title: title.trim_end().to_string(),
                year: year.parse().ok(),
            };
        }

        SearchTerm::Title {
            title: term.to_string(),
            year: None,
        }
    }
}

/// Movie lists offered by the metadata service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieCategory {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
    Trending,
    Similar(u64),
}

impl MovieCategory {
    pub const NAMES: [&'static str; 6] = ["popular", "top_rated", "upcoming", "now_playing", "trending", "similar"];

    /// `None` for unknown names and for `similar` without a reference movie
    pub fn from_name(name: &str, tmdb_id: Option<u64>) -> Option<Self> {
        match name {
            "popular" => Some(MovieCategory::Popular),
            "top_rated" => Some(MovieCategory::TopRated),
            "upcoming" => Some(MovieCategory::Upcoming),
            "now_playing" => Some(MovieCategory::NowPlaying),
            "trending" => Some(MovieCategory::Trending),
            "similar" => tmdb_id.map(MovieCategory::Similar),
            _ => None,
        }
    }

    /// API path relative to the v3 root
    pub fn path(&self) -> String {
        match self {
            MovieCategory::Popular => "movie/popular".to_string(),
            MovieCategory::TopRated => "movie/top_rated".to_string(),
            MovieCategory::Upcoming => "movie/upcoming".to_string(),
            MovieCategory::NowPlaying => "movie/now_playing".to_string(),
            MovieCategory::Trending => "trending/movie/week".to_string(),
            MovieCategory::Similar(id) => format!("movie/{}/similar", id),
        }
    }
}

impl fmt::Display for MovieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieCategory::Popular => write!(f, "popular"),
            MovieCategory::TopRated => write!(f, "top_rated"),
            MovieCategory::Upcoming => write!(f, "upcoming"),
            MovieCategory::NowPlaying => write!(f, "now_playing"),
            MovieCategory::Trending => write!(f, "trending"),
            MovieCategory::Similar(id) => write!(f, "similar:{}", id),
        }
    }
}

/// Rate limited, failure-tolerant access to movie metadata
///
/// Every backend call spends one limiter token. Backend failures are logged
/// and surface as empty results; nothing here returns an error.
pub struct MetadataClient {
    backend: Arc<dyn MetadataBackend>,
    limiter: Arc<RateLimiter>,
    include_adult: bool,
}

impl MetadataClient {
    pub fn new(backend: Arc<dyn MetadataBackend>, limiter: Arc<RateLimiter>, include_adult: bool) -> Self {
        Self {
            backend,
            limiter,
            include_adult,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Search by IMDB id, `tmdb:` id or free text
    ///
    /// Free text yields up to six movies, id lookups at most one; `single`
    /// keeps only the first. Results never carry a library status.
    pub async fn search(&self, term: &str, single: bool) -> Vec<MovieRecord> {
        info!(operation = "tmdb_search", term = %term, "Searching TheMovieDB");

        let mut movies: Vec<MovieRecord> = match SearchTerm::parse(term) {
            SearchTerm::ImdbId(imdb_id) => {
                self.limiter.acquire().await;
                let found = self.backend.search_by_imdb_id(&imdb_id).await;
                collapse(found, "search_by_imdb_id")
                    .flatten()
                    .map(|movie| movie.into_record())
                    .into_iter()
                    .collect()
            }
            SearchTerm::TmdbId(tmdb_id) => self.lookup_by_tmdb_id(tmdb_id, None).await.into_iter().collect(),
            SearchTerm::Title { title, year } => {
                self.limiter.acquire().await;
                let found = self.backend.search_by_text(&title, year, self.include_adult).await;
                collapse(found, "search_by_text")
                    .unwrap_or_default()
                    .into_iter()
                    .take(MAX_TEXT_RESULTS)
                    .map(|movie| movie.into_record())
                    .collect::<Vec<_>>()
            }
        };

        if movies.is_empty() {
            info!(operation = "tmdb_search", term = %term, "Nothing found on TheMovieDB");
        }
        if single {
            movies.truncate(1);
        }
        for movie in &mut movies {
            movie.status = None;
        }
        movies
    }

    /// Full detail for a TMDB id, localized when `language` is given
    ///
    /// Movies without a usable IMDB id are dropped.
    pub async fn lookup_by_tmdb_id(&self, tmdb_id: u64, language: Option<&LanguageTag>) -> Option<MovieRecord> {
        self.limiter.acquire().await;
        let found = self.backend.get_detail(tmdb_id, language.is_some()).await;
        let movie = collapse(found, "get_detail").flatten()?;

        let record = match language {
            Some(tag) => localize(movie, tag),
            None => movie.into_record(),
        };

        if record.imdb_id.is_none() {
            warn!(operation = "get_detail", tmdb_id = tmdb_id, "TMDB has no IMDB id for this movie");
            return None;
        }
        Some(record)
    }

    /// IMDB id for a TMDB id, or for the best free-text match of `title`
    pub async fn resolve_imdb_id(&self, tmdb_id: Option<u64>, title: Option<&str>, year: Option<u32>) -> Option<String> {
        let tmdb_id = match (tmdb_id, title) {
            (Some(id), _) => id,
            (None, Some(title)) => {
                self.limiter.acquire().await;
                let found = self.backend.search_by_text(title, year, self.include_adult).await;
                collapse(found, "search_by_text")?.first()?.id
            }
            (None, None) => {
                warn!(operation = "resolve_imdb_id", "Neither TMDB id nor title supplied");
                return None;
            }
        };

        self.limiter.acquire().await;
        let found = self.backend.get_detail(tmdb_id, false).await;
        collapse(found, "get_detail")
            .flatten()
            .and_then(|movie| movie.resolved_imdb_id().map(str::to_string))
    }

    /// Movies in a named category; `similar` needs `tmdb_id`
    pub async fn category(&self, name: &str, tmdb_id: Option<u64>) -> Vec<MovieRecord> {
        let Some(category) = MovieCategory::from_name(name, tmdb_id) else {
            warn!(operation = "category", category = %name, "Unknown category or missing TMDB id");
            return Vec::new();
        };

        self.limiter.acquire().await;
        let found = self.backend.get_category_list(category).await;
        collapse(found, "get_category_list")
            .unwrap_or_default()
            .into_iter()
            .map(|movie| movie.into_record())
            .collect()
    }
}

/// Log a backend failure at a level matching its kind and drop it
fn collapse<T>(result: SourceResult<T>, operation: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            match e.kind() {
                ErrorKind::NotFound => debug!(operation = %operation, error = %e, "Nothing found"),
                _ => warn!(operation = %operation, error = %e, kind = ?e.kind(), "TMDB request failed"),
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::tmdb::models::TmdbMovie;
    use async_trait::async_trait;
    use movie_sync_models::MovieStatus;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeBackend {
        text_results: Vec<TmdbMovie>,
        detail: Option<TmdbMovie>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> SourceResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                return Err(SourceError::Status { status: 500, body: "boom".to_string() });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MetadataBackend for FakeBackend {
        async fn search_by_text(&self, query: &str, year: Option<u32>, include_adult: bool) -> SourceResult<Vec<TmdbMovie>> {
            self.record(format!("text:{}:{:?}:{}", query, year, include_adult))?;
            Ok(self.text_results.clone())
        }

        async fn search_by_imdb_id(&self, imdb_id: &str) -> SourceResult<Option<TmdbMovie>> {
            self.record(format!("imdb:{}", imdb_id))?;
            Ok(self.detail.clone().map(|mut movie| {
                movie.imdb_id = Some(imdb_id.to_string());
                movie
            }))
        }

        async fn get_detail(&self, tmdb_id: u64, with_translations: bool) -> SourceResult<Option<TmdbMovie>> {
            self.record(format!("detail:{}:{}", tmdb_id, with_translations))?;
            Ok(self.detail.clone())
        }

        async fn get_category_list(&self, category: MovieCategory) -> SourceResult<Vec<TmdbMovie>> {
            self.record(format!("category:{}", category))?;
            Ok(self.text_results.clone())
        }
    }

    fn movie(id: u64, title: &str) -> TmdbMovie {
        TmdbMovie {
            id,
            title: title.to_string(),
            release_date: Some("2010-12-03".to_string()),
            ..TmdbMovie::default()
        }
    }

    fn client(backend: Arc<FakeBackend>) -> MetadataClient {
        let limiter = RateLimiter::new(30, Duration::from_secs(10), 3, Duration::from_millis(300));
        MetadataClient::new(backend, Arc::new(limiter), false)
    }

    #[test]
    fn test_search_term_classification() {
        assert_eq!(SearchTerm::parse("tt0947798"), SearchTerm::ImdbId("tt0947798".to_string()));
        assert_eq!(SearchTerm::parse("imdb: tt0947798 "), SearchTerm::ImdbId("tt0947798".to_string()));
        assert_eq!(SearchTerm::parse("tmdb:44214"), SearchTerm::TmdbId(44214));
        assert_eq!(
            SearchTerm::parse("Black Swan 2010"),
            SearchTerm::Title { title: "Black Swan".to_string(), year: Some(2010) }
        );
        assert_eq!(SearchTerm::parse("1917"), SearchTerm::Title { title: "1917".to_string(), year: None });
        // Too many digits for an IMDB id
        assert_eq!(
            SearchTerm::parse("tt12345678901"),
            SearchTerm::Title { title: "tt12345678901".to_string(), year: None }
        );
    }

    #[test]
    fn test_category_names() {
        assert_eq!(MovieCategory::from_name("top_rated", None), Some(MovieCategory::TopRated));
        assert_eq!(MovieCategory::from_name("similar", Some(5)), Some(MovieCategory::Similar(5)));
        assert_eq!(MovieCategory::from_name("similar", None), None);
        assert_eq!(MovieCategory::from_name("bogus", None), None);
        assert_eq!(MovieCategory::Similar(5).path(), "movie/5/similar");
        assert_eq!(MovieCategory::Popular.path(), "movie/popular");
    }

    #[tokio::test]
    async fn test_free_text_search_caps_results() {
        let backend = Arc::new(FakeBackend {
            text_results: (1..=10).map(|i| movie(i, "Black Swan")).collect(),
            ..FakeBackend::default()
        });
        let client = client(backend.clone());

        let results = client.search("Black Swan 2010", false).await;
        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.status.is_none()));
        assert_eq!(backend.calls(), vec!["text:Black Swan:Some(2010):false".to_string()]);

        let results = client.search("Black Swan", true).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tmdb_id, Some(1));
    }

    #[tokio::test]
    async fn test_imdb_search_returns_single_record() {
        let backend = Arc::new(FakeBackend {
            detail: Some(movie(44214, "Black Swan")),
            ..FakeBackend::default()
        });
        let client = client(backend.clone());

        let results = client.search("imdb:tt0947798", false).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].imdb_id.as_deref(), Some("tt0947798"));
        assert_eq!(backend.calls(), vec!["imdb:tt0947798".to_string()]);
    }

    #[tokio::test]
    async fn test_tmdb_search_drops_movies_without_imdb_id() {
        let backend = Arc::new(FakeBackend {
            detail: Some(movie(44214, "Black Swan")),
            ..FakeBackend::default()
        });
        let client = client(backend);
        assert!(client.search("tmdb:44214", false).await.is_empty());

        let mut detail = movie(44214, "Black Swan");
        detail.imdb_id = Some("N/A".to_string());
        let client = self::client(Arc::new(FakeBackend { detail: Some(detail), ..FakeBackend::default() }));
        assert!(client.search("tmdb:44214", false).await.is_empty());
    }

    #[tokio::test]
    async fn test_search_results_never_carry_library_status() {
        let mut detail = movie(44214, "Black Swan");
        detail.imdb_id = Some("tt0947798".to_string());
        let backend = Arc::new(FakeBackend { detail: Some(detail), ..FakeBackend::default() });
        let client = client(backend);

        let results = client.search("tmdb:44214", false).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, None);

        // Status only appears once a result is turned into a library entry
        let entry = results[0].clone().into_library_entry("Search");
        assert_eq!(entry.status, Some(MovieStatus::Waiting));
    }

    #[tokio::test]
    async fn test_lookup_with_language_requests_translations() {
        let mut detail = movie(44214, "Black Swan");
        detail.imdb_id = Some("tt0947798".to_string());
        detail.original_language = Some("en".to_string());
        detail.original_title = Some("Black Swan".to_string());
        let backend = Arc::new(FakeBackend { detail: Some(detail), ..FakeBackend::default() });
        let client = client(backend.clone());

        let tag: LanguageTag = "en-US".parse().unwrap();
        let record = client.lookup_by_tmdb_id(44214, Some(&tag)).await.unwrap();
        assert_eq!(record.title, "Black Swan");
        assert_eq!(record.localized_titles, vec!["Black Swan".to_string()]);
        assert_eq!(backend.calls(), vec!["detail:44214:true".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_without_id_or_title_is_none() {
        let backend = Arc::new(FakeBackend::default());
        let client = client(backend.clone());

        assert_eq!(client.resolve_imdb_id(None, None, Some(2010)).await, None);
        assert!(backend.calls().is_empty());
        assert_eq!(client.limiter().available_tokens().await, 30);
    }

    #[tokio::test]
    async fn test_resolve_by_title_uses_first_result() {
        let mut detail = movie(44214, "Black Swan");
        detail.imdb_id = Some("tt0947798".to_string());
        let backend = Arc::new(FakeBackend {
            text_results: vec![movie(44214, "Black Swan"), movie(99, "Black Swan 2")],
            detail: Some(detail),
            ..FakeBackend::default()
        });
        let client = client(backend.clone());

        let imdb_id = client.resolve_imdb_id(None, Some("Black Swan"), Some(2010)).await;
        assert_eq!(imdb_id.as_deref(), Some("tt0947798"));
        assert_eq!(
            backend.calls(),
            vec!["text:Black Swan:Some(2010):false".to_string(), "detail:44214:false".to_string()]
        );
        assert_eq!(client.limiter().available_tokens().await, 28);
    }

    #[tokio::test]
    async fn test_invalid_categories_make_no_requests() {
        let backend = Arc::new(FakeBackend {
            text_results: vec![movie(1, "A")],
            ..FakeBackend::default()
        });
        let client = client(backend.clone());

        assert!(client.category("bogus", None).await.is_empty());
        assert!(client.category("similar", None).await.is_empty());
        assert!(backend.calls().is_empty());

        assert_eq!(client.category("similar", Some(7)).await.len(), 1);
        assert_eq!(backend.calls(), vec!["category:similar:7".to_string()]);
    }

    #[tokio::test]
    async fn test_backend_failures_collapse_to_empty() {
        let backend = Arc::new(FakeBackend {
            text_results: vec![movie(1, "A")],
            detail: Some(movie(1, "A")),
            fail: true,
            ..FakeBackend::default()
        });
        let client = client(backend);

        assert!(client.search("Black Swan", false).await.is_empty());
        assert!(client.search("tt0947798", false).await.is_empty());
        assert!(client.lookup_by_tmdb_id(1, None).await.is_none());
        assert!(client.resolve_imdb_id(Some(1), None, None).await.is_none());
        assert!(client.category("popular", None).await.is_empty());
    }
}
