use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use movie_sync_config::{Config, PathManager};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    match cmd {
        ConfigCommands::Show { full } => show_config(&path_manager, full, output),
        ConfigCommands::Init { force } => init_config(&path_manager, force, output),
    }
}

fn init_config(path_manager: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
        return Ok(());
    }

    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create directories: {}", e))?;
    Config::template()
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Configuration template written to {}", config_file.display()));
    output.info("Set tmdb.api_key, then enable Trakt lists or add watchlist RSS urls.");
    Ok(())
}

fn show_config(path_manager: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'marquee config init' to create one.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let secret = |value: &str| if full { value.to_string() } else { mask_string(value) };

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            println!("\n{}", "Configuration".bright_cyan().bold());
            println!("{}\n", config_file.display().to_string().dimmed());

            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            table.set_header(vec![
                Cell::new("Setting").add_attribute(Attribute::Bold),
                Cell::new("Value").add_attribute(Attribute::Bold),
            ]);

            let limits = &config.tmdb.rate_limit;
            table.add_row(vec!["tmdb.api_key".to_string(), secret(&config.tmdb.api_key)]);
            table.add_row(vec!["tmdb.include_adult".to_string(), flag(config.tmdb.include_adult)]);
            table.add_row(vec![
                "tmdb.language".to_string(),
                config.tmdb.language.clone().unwrap_or_else(|| "<default>".to_string()),
            ]);
            table.add_row(vec![
                "tmdb.rate_limit".to_string(),
                format!(
                    "{} tokens / {}s, reserve {}",
                    limits.capacity, limits.refill_interval_secs, limits.reserve
                ),
            ]);
            table.add_row(vec!["predb.enabled".to_string(), flag(config.predb.enabled)]);
            table.add_row(vec!["predb.include_unknown".to_string(), flag(config.predb.include_unknown)]);

            match &config.trakt {
                Some(trakt) => {
                    table.add_row(vec!["trakt.client_id".to_string(), secret(&trakt.client_id)]);
                    table.add_row(vec!["trakt.lists".to_string(), trakt.enabled_lists().join(", ")]);
                    table.add_row(vec!["trakt.min_score".to_string(), trakt.min_score.to_string()]);
                    table.add_row(vec!["trakt.length".to_string(), trakt.length.to_string()]);
                    table.add_row(vec!["trakt.rss_urls".to_string(), trakt.rss_urls.len().to_string()]);
                }
                None => {
                    table.add_row(vec!["trakt".to_string(), "<not configured>".to_string()]);
                }
            }

            table.add_row(vec!["sync.search_after_add".to_string(), flag(config.sync.search_after_add)]);
            table.add_row(vec![
                "youtube.api_key".to_string(),
                config
                    .youtube
                    .as_ref()
                    .map(|youtube| secret(&youtube.api_key))
                    .unwrap_or_else(|| "<not set>".to_string()),
            ]);
            if let Some(scheduler) = &config.scheduler {
                table.add_row(vec!["scheduler.schedule".to_string(), scheduler.schedule.clone()]);
            }
            println!("{}", table);

            if let Err(e) = config.validate() {
                output.warn(format!("Configuration is incomplete: {}", e));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let mut value = serde_json::to_value(&config)?;
            if !full {
                mask_json(&mut value, &["tmdb", "api_key"]);
                mask_json(&mut value, &["trakt", "client_id"]);
                mask_json(&mut value, &["youtube", "api_key"]);
            }
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "valid": config.validate().is_ok(),
                "config": value,
            }));
        }
    }

    Ok(())
}

fn flag(enabled: bool) -> String {
    if enabled {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn mask_json(value: &mut serde_json::Value, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = value;
    for key in parents {
        match current.get_mut(*key) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Some(field) = current.get_mut(*last) {
        if let Some(text) = field.as_str() {
            *field = serde_json::Value::String(mask_string(text));
        }
    }
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s.starts_with("YOUR_") {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("YOUR_TMDB_API_KEY"), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("abcdef123456"), "ab***56");
    }

    #[test]
    fn test_mask_json_nested_field() {
        let mut value = json!({ "tmdb": { "api_key": "abcdef123456", "include_adult": false } });
        mask_json(&mut value, &["tmdb", "api_key"]);
        mask_json(&mut value, &["youtube", "api_key"]);
        assert_eq!(value["tmdb"]["api_key"], "ab***56");
        assert!(value.get("youtube").is_none());
    }

    #[test]
    fn test_init_writes_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let path_manager = PathManager::with_base(dir.path().to_path_buf());
        let output = Output::new(OutputFormat::Json, true);

        init_config(&path_manager, false, &output).unwrap();
        let written = Config::load_from_file(&path_manager.config_file()).unwrap();
        assert_eq!(written.tmdb.api_key, "YOUR_TMDB_API_KEY");

        let mut edited = written;
        edited.tmdb.api_key = "mine".to_string();
        edited.save_to_file(&path_manager.config_file()).unwrap();

        init_config(&path_manager, false, &output).unwrap();
        assert_eq!(Config::load_from_file(&path_manager.config_file()).unwrap().tmdb.api_key, "mine");

        init_config(&path_manager, true, &output).unwrap();
        assert_eq!(
            Config::load_from_file(&path_manager.config_file()).unwrap().tmdb.api_key,
            "YOUR_TMDB_API_KEY"
        );
    }
}
