use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("success", Some("✓".green().to_string()), msg.as_ref(), false);
        }
    }

    /// Always shown, quiet or not
    pub fn error(&self, msg: impl AsRef<str>) {
        self.message("error", Some("✗".red().to_string()), msg.as_ref(), true);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("info", None, msg.as_ref(), false);
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("warning", Some("⚠".yellow().to_string()), msg.as_ref(), false);
        }
    }

    fn message(&self, kind: &str, symbol: Option<String>, msg: &str, to_stderr: bool) {
        match self.format {
            OutputFormat::Human => {
                let line = match symbol {
                    Some(symbol) => format!("{} {}", symbol, msg),
                    None => msg.to_string(),
                };
                if to_stderr {
                    eprintln!("{}", line);
                } else {
                    println!("{}", line);
                }
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": kind, "message": msg }));
            }
        }
    }

    /// Human-only text such as tables; skipped in JSON modes
    pub fn human(&self, text: impl AsRef<str>) {
        if self.quiet || self.format != OutputFormat::Human {
            return;
        }
        println!("{}", text.as_ref());
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }

        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(data).unwrap_or_default());
            }
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Human => {
                println!("{}", data);
            }
        }
    }
}

/// A list of movies as a table, one row per movie
pub fn movie_table(movies: &[movie_sync_models::MovieRecord]) -> comfy_table::Table {
    use comfy_table::{Attribute, Cell, Table};

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Year").add_attribute(Attribute::Bold),
        Cell::new("IMDB").add_attribute(Attribute::Bold),
        Cell::new("TMDB").add_attribute(Attribute::Bold),
    ]);
    for movie in movies {
        table.add_row(vec![
            Cell::new(&movie.title),
            Cell::new(movie.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(movie.imdb_id.as_deref().unwrap_or("-")),
            Cell::new(movie.tmdb_id.map(|id| id.to_string()).unwrap_or_default()),
        ]);
    }
    table
}
