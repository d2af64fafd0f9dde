use crate::commands::report::{
    get_average_series, get_rankings, render_series, render_text, RankingReport, RankingRequest,
};
use crate::commands::settings::{get_settings, load_effective_settings, save_settings};
use crate::commands::watcher::start_history_watcher;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_UNAVAILABLE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "rankwatch", version, about = "Per-country store ranking tracker")]
pub struct Cli {
    /// Directory holding the history file and `.rankwatch/settings.json`
    #[arg(long, short = 'w', default_value = ".", global = true)]
    pub workspace: String,

    /// History file to read instead of the configured one
    #[arg(long, global = true)]
    pub history: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Best-ranked charting countries
    Top {
        #[arg(long, short = 'n')]
        top_n: Option<usize>,
    },
    /// Fixed list of countries, charting or not
    Watchlist {
        /// Comma-separated countries; defaults to the configured watchlist
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,
    },
    /// Average combined rank of every snapshot
    History,
    /// Re-render whenever the history file changes
    Watch {
        #[arg(long, short = 'n')]
        top_n: Option<usize>,
        /// Watch these countries instead of the global top list
        #[arg(long, value_delimiter = ',')]
        countries: Option<Vec<String>>,
    },
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    Show,
    /// Merge a JSON object into the stored settings
    Set { patch: String },
}

pub async fn dispatch(cli: Cli) -> ExitCode {
    let Cli {
        workspace,
        history,
        json,
        command,
    } = cli;

    match command {
        Command::Top { top_n } => {
            let request = RankingRequest {
                history_override: history,
                top_n,
                countries: None,
            };
            print_report(&get_rankings(&workspace, &request).await, json)
        }
        Command::Watchlist { countries } => {
            let request = RankingRequest {
                history_override: history,
                top_n: None,
                countries: Some(countries),
            };
            print_report(&get_rankings(&workspace, &request).await, json)
        }
        Command::History => match get_average_series(&workspace, history).await {
            Ok(series) if json => print_json(&series),
            Ok(series) => {
                print!("{}", render_series(&series));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("rankings unavailable: {e}");
                ExitCode::from(EXIT_UNAVAILABLE)
            }
        },
        Command::Watch { top_n, countries } => {
            let request = RankingRequest {
                history_override: history,
                top_n,
                countries,
            };
            match watch(&workspace, &request, json).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    log::error!("{e}");
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
        Command::Settings { action } => {
            let result = match action {
                SettingsAction::Show => get_settings(&workspace).await,
                SettingsAction::Set { patch } => match serde_json::from_str::<Value>(&patch) {
                    Ok(patch @ Value::Object(_)) => save_settings(&workspace, patch).await,
                    Ok(_) => Err("Settings patch must be a JSON object".to_string()),
                    Err(e) => Err(format!("Invalid settings patch: {e}")),
                },
            };
            match result {
                Ok(settings) => print_json(&settings),
                Err(e) => {
                    log::error!("{e}");
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
    }
}

async fn watch(workspace: &str, request: &RankingRequest, json: bool) -> Result<(), String> {
    let settings = load_effective_settings(workspace)?;
    let history_path = request.history_path(&settings);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    start_history_watcher(&history_path, settings.watch_debounce, tx)?;

    print_report(&get_rankings(workspace, request).await, json);
    loop {
        tokio::select! {
            changed = rx.recv() => {
                if changed.is_none() {
                    return Err("History watcher stopped".to_string());
                }
                print_report(&get_rankings(workspace, request).await, json);
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Stopping watch");
                return Ok(());
            }
        }
    }
}

fn print_report(report: &RankingReport, json: bool) -> ExitCode {
    if json {
        if let Err(e) = write_json(report) {
            log::error!("{e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    } else {
        print!("{}", render_text(report));
    }

    if report.is_available() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_UNAVAILABLE)
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match write_json(value) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn write_json<T: Serialize>(value: &T) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{raw}");
    Ok(())
}
