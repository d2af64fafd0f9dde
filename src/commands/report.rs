use crate::analysis::aggregator::{aggregate, average_rank_series, AggregationMode};
use crate::analysis::countdown::{countdown, Countdown};
use crate::analysis::weighting::weighted_average_rank;
use crate::commands::history::load_history;
use crate::commands::settings::{load_effective_settings, EffectiveSettings};
use crate::models::error::{RankError, RankResult};
use crate::models::ranking::{
    AveragePoint, CountryRankEntry, GlobalRanking, RankingView, Trend, TrendDirection,
    WatchlistRanking,
};
use crate::models::snapshot::Snapshot;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;
use std::path::PathBuf;

/// Per-call overrides on top of the workspace settings.
#[derive(Debug, Clone, Default)]
pub struct RankingRequest {
    pub history_override: Option<PathBuf>,
    pub top_n: Option<usize>,
    /// `Some` selects watchlist mode; an empty list falls back to the
    /// configured watchlist.
    pub countries: Option<Vec<String>>,
}

impl RankingRequest {
    pub fn mode(&self, settings: &EffectiveSettings) -> AggregationMode {
        match &self.countries {
            Some(countries) if !countries.is_empty() => AggregationMode::Watchlist {
                countries: countries.clone(),
            },
            Some(_) => AggregationMode::Watchlist {
                countries: settings.watchlist.clone(),
            },
            None => AggregationMode::GlobalTopN {
                top_n: self.top_n.unwrap_or(settings.top_n).max(1),
            },
        }
    }

    pub fn history_path(&self, settings: &EffectiveSettings) -> PathBuf {
        self.history_override
            .clone()
            .unwrap_or_else(|| settings.history_path.clone())
    }
}

/// What the presentation side receives. `Unavailable` is a distinct state,
/// never an empty ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RankingReport {
    Available {
        view: RankingView,
        weighted_average_rank: Option<f64>,
        countdown: Option<Countdown>,
    },
    Unavailable {
        reason: String,
    },
}

impl RankingReport {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        RankingReport::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, RankingReport::Available { .. })
    }
}

pub struct ReportContext<'a> {
    pub market_weights: &'a HashMap<String, f64>,
    pub release_at: Option<DateTime<FixedOffset>>,
    pub now: DateTime<Utc>,
}

pub fn build_report(
    history: RankResult<Vec<Snapshot>>,
    mode: &AggregationMode,
    context: &ReportContext<'_>,
) -> RankingReport {
    let view = match history.and_then(|history| aggregate(&history, mode)) {
        Ok(view) => view,
        Err(err) => {
            log::warn!("Rankings unavailable: {err}");
            return RankingReport::unavailable(err.to_string());
        }
    };

    let weighted_average_rank = match &view {
        RankingView::Global(global) => weighted_average_rank(&global.entries, context.market_weights),
        RankingView::Watchlist(watchlist) => weighted_average_rank(
            watchlist.entries.iter().map(|watched| &watched.entry),
            context.market_weights,
        ),
    };

    RankingReport::Available {
        view,
        weighted_average_rank,
        countdown: context
            .release_at
            .and_then(|release_at| countdown(release_at, context.now)),
    }
}

pub async fn get_rankings(workspace_path: &str, request: &RankingRequest) -> RankingReport {
    let settings = match load_effective_settings(workspace_path) {
        Ok(settings) => settings,
        Err(e) => return RankingReport::unavailable(format!("Settings error: {e}")),
    };

    let history_path = request.history_path(&settings);
    let history = load_history(&history_path, settings.malformed_policy).await;
    let context = ReportContext {
        market_weights: &settings.market_weights,
        release_at: settings.release_at,
        now: Utc::now(),
    };

    build_report(history, &request.mode(&settings), &context)
}

pub async fn get_average_series(
    workspace_path: &str,
    history_override: Option<PathBuf>,
) -> Result<Vec<AveragePoint>, String> {
    let settings = load_effective_settings(workspace_path)?;
    let history_path = history_override.unwrap_or(settings.history_path);

    let history = load_history(&history_path, settings.malformed_policy)
        .await
        .map_err(|e| format!("Failed to load {}: {e}", history_path.display()))?;
    if history.is_empty() {
        return Err(RankError::EmptyHistory.to_string());
    }

    Ok(average_rank_series(&history))
}

/// Compact plain-text rendering for terminals and chat messages.
pub fn render_text(report: &RankingReport) -> String {
    let (view, weighted, left) = match report {
        RankingReport::Available {
            view,
            weighted_average_rank,
            countdown,
        } => (view, weighted_average_rank, countdown),
        RankingReport::Unavailable { reason } => {
            return format!("rankings unavailable: {reason}\n");
        }
    };

    let mut out = String::new();
    match view {
        RankingView::Global(global) => render_global(&mut out, global),
        RankingView::Watchlist(watchlist) => render_watchlist(&mut out, watchlist),
    }

    if let Some(weighted) = weighted {
        let _ = writeln!(out, "weighted avg {}", fmt_average(*weighted));
    }
    if let Some(left) = left {
        let _ = writeln!(
            out,
            "release in {}d {:02}:{:02}",
            left.days, left.hours, left.minutes
        );
    }
    let _ = writeln!(out, "updated {}", view.label());
    out
}

pub fn render_series(series: &[AveragePoint]) -> String {
    series.iter().fold(String::new(), |mut out, point| {
        let average = point
            .average_rank
            .map(fmt_average)
            .unwrap_or_else(|| "—".to_string());
        let _ = writeln!(out, "{:>11}  {average}", point.label);
        out
    })
}

fn render_global(out: &mut String, view: &GlobalRanking) {
    let average = view
        .average_rank
        .map(fmt_average)
        .unwrap_or_else(|| "—".to_string());
    let _ = writeln!(
        out,
        "avg {average} {} · {} charting",
        fmt_trend(&view.average_trend),
        view.tracking_count
    );

    for (index, entry) in view.top.iter().enumerate() {
        render_row(out, Some(index + 1), entry);
    }
}

fn render_watchlist(out: &mut String, view: &WatchlistRanking) {
    let average = view
        .average_rank
        .map(fmt_average)
        .unwrap_or_else(|| "—".to_string());
    let _ = writeln!(
        out,
        "avg {average} · {}/{} watched charting · {} charting overall",
        view.charting_count, view.watch_count, view.total_tracked
    );

    for watched in &view.entries {
        render_row(out, watched.position, &watched.entry);
    }
}

fn render_row(out: &mut String, position: Option<usize>, entry: &CountryRankEntry) {
    let position = position
        .map(|p| format!("{p:>2}."))
        .unwrap_or_else(|| " -".to_string());

    let mut editions = Vec::new();
    if let Some(standard) = entry.standard_rank {
        editions.push(format!("S:{standard}"));
    }
    if let Some(deluxe) = entry.deluxe_rank {
        editions.push(format!("D:{deluxe}"));
    }
    let editions = if editions.is_empty() {
        "—".to_string()
    } else {
        editions.join(" ")
    };

    let line = format!(
        "{position} {:<12} {:<12} {}",
        entry.country,
        editions,
        fmt_trend(&entry.trend)
    );
    let _ = writeln!(out, "{}", line.trim_end());
}

fn fmt_trend(trend: &Trend) -> String {
    let magnitude = trend.magnitude.map(fmt_rank).unwrap_or_default();
    match trend.direction {
        TrendDirection::Up => format!("▲{magnitude}"),
        TrendDirection::Down => format!("▼{magnitude}"),
        TrendDirection::Same => "=".to_string(),
        TrendDirection::Unknown => String::new(),
    }
}

/// Whole ranks without decimals, half ranks and the like with one.
fn fmt_rank(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

fn fmt_average(value: f64) -> String {
    format!("{value:.1}")
}
