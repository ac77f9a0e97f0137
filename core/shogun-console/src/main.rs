//! shogun-console: terminal operator console for the shogun dashboard.
//!
//! ## Subcommands
//!
//! - `watch`: live view with slash-command input
//! - `snapshot`: fetch once and print as text or HTML
//! - `send`: dispatch one command
//! - `history`: print recent commands
//! - `lang`: show or set the display language
//! - `config`: show the effective configuration, or write it to config.json

mod console;
mod logging;
mod notifier;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};
use shogun_core::i18n::Localizer;
use shogun_core::notifier::NoNotifications;
use shogun_core::preferences::CommandHistory;
use shogun_core::render::{html, text, HistoryView};
use shogun_core::{
    load_config_with_storage, save_config_with_storage, DashboardConfig, DashboardEngine,
    NullSink, Preferences, SnapshotFetcher, StorageConfig, ViewSink,
};
use shogun_protocol::PaneTarget;

#[derive(Parser)]
#[command(name = "shogun-console")]
#[command(about = "Operator console for the shogun dashboard")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config.json and SHOGUN_GUI_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Data directory (defaults to ~/.shogun-gui)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard with slash-command input
    Watch,

    /// Fetch the dashboard and panes once and print them
    Snapshot {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Send one command to the shogun
    Send {
        #[arg(required = true, value_name = "TEXT")]
        text: Vec<String>,
    },

    /// Show recent commands
    History,

    /// Show or set the display language
    Lang {
        #[arg(value_name = "CODE")]
        code: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Persist it (including --base-url and SHOGUN_GUI_URL) to config.json
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Html,
}

fn main() {
    let cli = Cli::parse();
    let storage = match &cli.data_dir {
        Some(dir) => Ok(StorageConfig::with_root(dir.clone())),
        None => StorageConfig::from_home(),
    };
    let _logging_guard = logging::init(storage.as_ref().ok().map(|s| s.logs_dir()).as_deref());

    let storage = match storage {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!(error = %e, "No data directory");
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, cli.base_url, &storage) {
        tracing::error!(error = %e, "shogun-console failed");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, base_url: Option<String>, storage: &StorageConfig) -> Result<(), String> {
    let config = load_config_with_storage(storage)
        .with_env_overrides()
        .with_base_url_override(base_url);
    let mut prefs = Preferences::open_or_memory(&storage.preferences_file());

    match command {
        Commands::Watch => {
            let sink = Arc::new(console::TerminalSink::default());
            let gate = sink.gate();
            let mut engine = build_engine(
                config,
                prefs,
                Arc::new(notifier::DesktopNotifier::detect()),
                sink,
            );
            console::run(&mut engine, &gate)
        }
        Commands::Snapshot { format } => {
            let engine = build_engine(config, prefs, Arc::new(NoNotifications), Arc::new(NullSink));
            engine.refresh_dashboard();
            engine.refresh_pane(PaneTarget::Shogun);
            engine.refresh_pane(PaneTarget::Karo);
            let view = engine.view();
            match format {
                Format::Text => print!("{}", text::render_view(&view)),
                Format::Html => print!("{}", html::render_page(&view)),
            }
            Ok(())
        }
        Commands::Send { text } => {
            let engine = build_engine(config, prefs, Arc::new(NoNotifications), Arc::new(NullSink));
            let accepted = engine
                .send_command(&text.join(" "))
                .map_err(|e| format!("Command failed: {}", e))?;
            println!("{}", accepted.command);
            Ok(())
        }
        Commands::History => {
            let localizer = Localizer::from_preferences(&prefs);
            let history = HistoryView {
                title: localizer.t("history.title").to_string(),
                empty_label: localizer.t("history.empty").to_string(),
                entries: CommandHistory::load(&prefs).entries().to_vec(),
            };
            println!("{}", format_history(&history));
            Ok(())
        }
        Commands::Lang { code: None } => {
            println!("{}", Localizer::from_preferences(&prefs).language().code());
            Ok(())
        }
        Commands::Lang { code: Some(code) } => {
            let mut localizer = Localizer::from_preferences(&prefs);
            if !localizer.set_language(&code, &mut prefs) {
                return Err(format!("Unsupported language: {}", code));
            }
            println!("{}", localizer.language().code());
            Ok(())
        }
        Commands::Config { write } => {
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| format!("Failed to encode config: {}", e))?;
            println!("{}", json);
            if write {
                save_config_with_storage(storage, &config)
                    .map_err(|e| format!("Failed to write config: {}", e))?;
                println!("{}", storage.config_file().display());
            }
            Ok(())
        }
    }
}

fn build_engine(
    config: DashboardConfig,
    prefs: Preferences,
    notifier: Arc<dyn shogun_core::NotificationSink>,
    sink: Arc<dyn ViewSink>,
) -> DashboardEngine {
    let fetcher = SnapshotFetcher::http(config.base_url.clone());
    DashboardEngine::new(config, fetcher, prefs, notifier, sink)
}

/// Newest first, with local timestamps.
pub(crate) fn format_history(history: &HistoryView) -> String {
    let mut lines = vec![history.title.clone()];
    if history.entries.is_empty() {
        lines.push(format!("  {}", history.empty_label));
    }
    for entry in &history.entries {
        let time = Local
            .timestamp_millis_opt(entry.timestamp)
            .single()
            .map(|t| t.format("%m/%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!("  {}  {}", time, entry.text));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shogun_core::CommandHistoryEntry;

    #[test]
    fn test_cli_parses_snapshot_format() {
        let cli = Cli::try_parse_from(["shogun-console", "snapshot", "--format", "html"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Snapshot {
                format: Format::Html
            }
        ));
    }

    #[test]
    fn test_cli_global_base_url() {
        let cli =
            Cli::try_parse_from(["shogun-console", "send", "進軍", "--base-url", "http://x:1"])
                .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://x:1"));
        assert!(matches!(cli.command, Commands::Send { ref text } if text == &["進軍"]));
    }

    #[test]
    fn test_config_write_persists_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        run(
            Commands::Config { write: true },
            Some("http://10.0.0.5:9000/".to_string()),
            &storage,
        )
        .unwrap();

        let saved = load_config_with_storage(&storage);
        assert_eq!(saved.base_url, "http://10.0.0.5:9000");
    }

    #[test]
    fn test_empty_history_shows_label() {
        let view = HistoryView {
            title: "History".to_string(),
            empty_label: "none".to_string(),
            entries: Vec::new(),
        };
        assert_eq!(format_history(&view), "History\n  none");
    }

    #[test]
    fn test_history_lists_entries() {
        let view = HistoryView {
            title: "History".to_string(),
            empty_label: "none".to_string(),
            entries: vec![CommandHistoryEntry {
                text: "attack".to_string(),
                timestamp: 1_700_000_000_000,
            }],
        };
        let out = format_history(&view);
        assert!(out.starts_with("History\n  "));
        assert!(out.ends_with("  attack"));
    }
}
