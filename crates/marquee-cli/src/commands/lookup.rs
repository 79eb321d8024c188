use super::{load_config, Services};
use crate::output::{movie_table, Output, OutputFormat};
use color_eyre::Result;
use futures::future::join_all;
use movie_sync_config::PathManager;
use movie_sync_models::MovieRecord;
use movie_sync_sources::{build_trailer_client, create_http_client, LanguageTag, MetadataClient, MovieCategory};
use serde_json::json;

pub async fn run_search(term: &str, single: bool, language: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let services = Services::build(&config, &path_manager)?;

    let language = match language.or_else(|| config.tmdb.language.clone()) {
        Some(tag) => Some(
            tag.parse::<LanguageTag>()
                .map_err(|e| color_eyre::eyre::eyre!("Invalid language '{}': {}", tag, e))?,
        ),
        None => None,
    };

    let mut movies = services.metadata.search(term, single).await;
    if let Some(tag) = &language {
        movies = localize_all(&services.metadata, movies, tag).await;
    }

    print_movies(&movies, output, || format!("No movies found for '{}'", term));
    Ok(())
}

/// Replace each hit with its localized detail record, keeping hits that fail to load
///
/// Lookups run concurrently; the shared limiter paces them.
async fn localize_all(metadata: &MetadataClient, movies: Vec<MovieRecord>, tag: &LanguageTag) -> Vec<MovieRecord> {
    let lookups = movies.into_iter().map(|movie| async move {
        let detail = match movie.tmdb_id {
            Some(id) => metadata.lookup_by_tmdb_id(id, Some(tag)).await,
            None => None,
        };
        detail.unwrap_or(movie)
    });
    join_all(lookups).await
}

pub async fn run_category(name: &str, tmdb_id: Option<u64>, output: &Output) -> Result<()> {
    if MovieCategory::from_name(name, tmdb_id).is_none() {
        return Err(color_eyre::eyre::eyre!(
            "Unknown category '{}'. Use one of: {}{}",
            name,
            MovieCategory::NAMES.join(", "),
            if name == "similar" { " ('similar' needs --tmdb-id)" } else { "" }
        ));
    }

    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let services = Services::build(&config, &path_manager)?;

    let movies = services.metadata.category(name, tmdb_id).await;
    print_movies(&movies, output, || format!("No movies in category '{}'", name));
    Ok(())
}

pub async fn run_trailer(title: &str, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;

    let client = create_http_client().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    let Some(trailers) = build_trailer_client(&config, client) else {
        output.warn("No YouTube API key configured under [youtube].");
        return Ok(());
    };

    let video_id = trailers.trailer(title).await;
    match output.format() {
        OutputFormat::Human => match &video_id {
            Some(id) => output.success(format!("https://www.youtube.com/watch?v={}", id)),
            None => output.error(format!("No trailer found for '{}'", title)),
        },
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({ "title": title, "video_id": video_id }));
        }
    }
    Ok(())
}

fn print_movies(movies: &[MovieRecord], output: &Output, empty: impl FnOnce() -> String) {
    match output.format() {
        OutputFormat::Human => {
            if movies.is_empty() {
                output.warn(empty());
            } else {
                output.human(movie_table(movies).to_string());
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({ "movies": movies }));
        }
    }
}
