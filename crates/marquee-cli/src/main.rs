use clap::{ArgAction, Parser, Subcommand};
use commands::{config, daemon, lookup, sync};
use movie_sync_config::LoggingConfig;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Marquee - Keep your movie library in sync with TMDB, Trakt and predb")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync Trakt ranked lists and watchlist feeds into the library
    #[command(long_about = "Run one Trakt sync pass. Watchlist feeds are read behind their stored cursors, then every enabled ranked list is read in full. New movies are added to the local library.")]
    Sync,
    /// Check predb for releases of tracked movies
    #[command(long_about = "Run one predb pass. Titles that were never checked get a backlog query of their own; the rest are matched against the rolling release feed.")]
    Predb,
    /// Search TheMovieDatabase
    #[command(long_about = "Search TheMovieDatabase by title ('Black Swan 2010'), IMDB id ('tt0947798') or TMDB id ('tmdb:44214').")]
    Search {
        /// Search term
        term: String,

        /// Return only the best hit
        #[arg(long, action = ArgAction::SetTrue)]
        single: bool,

        /// Localize results, e.g. 'de-DE' (overrides tmdb.language)
        #[arg(long, value_name = "LANGUAGE")]
        language: Option<String>,
    },
    /// List movies of a TheMovieDatabase category
    #[command(long_about = "List a TheMovieDatabase category: popular, top_rated, upcoming, now_playing, trending or similar. 'similar' needs --tmdb-id.")]
    Category {
        /// Category name
        name: String,

        /// Movie to find similar titles for
        #[arg(long, value_name = "ID")]
        tmdb_id: Option<u64>,
    },
    /// Find a YouTube trailer
    Trailer {
        /// Title and year, e.g. 'Black Swan 2010'
        title: String,
    },
    /// Run as daemon with internal scheduler
    #[command(long_about = "Run Marquee in the foreground, running the Trakt sync and the predb check on the configured cron schedule. An initial pass runs on startup unless --no-startup-sync is given.")]
    Daemon {
        /// Cron schedule with seconds field (e.g., '0 0 */6 * * *' for every 6 hours)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip initial sync on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks API keys)
    Show {
        /// Show API keys unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a configuration template
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);

    // Only the daemon honours the [logging] section, so one-off commands keep logging to stderr
    let logging_config = match &cli.command {
        Commands::Daemon { .. } => daemon::logging_config(),
        _ => LoggingConfig::default(),
    };
    logging::init_logging(cli.verbose, cli.quiet, &logging_config).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    match cli.command {
        Commands::Sync => sync::run_sync(&output).await,
        Commands::Predb => sync::run_predb(&output).await,
        Commands::Search { term, single, language } => lookup::run_search(&term, single, language, &output).await,
        Commands::Category { name, tmdb_id } => lookup::run_category(&name, tmdb_id, &output).await,
        Commands::Trailer { title } => lookup::run_trailer(&title, &output).await,
        Commands::Daemon { schedule, no_startup_sync } => daemon::run_daemon(schedule, no_startup_sync, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output).await,
    }
}
