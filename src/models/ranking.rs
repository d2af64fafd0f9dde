use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Same,
    Unknown,
}

/// Movement between two consecutive observations. `magnitude` keeps the full
/// precision of the combined ranks; rounding is left to whoever displays it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub magnitude: Option<f64>,
}

impl Trend {
    pub fn unknown() -> Self {
        Self {
            direction: TrendDirection::Unknown,
            magnitude: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRankEntry {
    pub country: String,
    pub standard_rank: Option<u32>,
    pub deluxe_rank: Option<u32>,
    pub combined_rank: Option<f64>,
    pub previous_combined_rank: Option<f64>,
    pub trend: Trend,
    pub standard_trend: Trend,
    pub deluxe_trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalRanking {
    pub timestamp: NaiveDateTime,
    pub label: String,
    /// Every charting country, best combined rank first.
    pub entries: Vec<CountryRankEntry>,
    pub top: Vec<CountryRankEntry>,
    pub top_n: usize,
    pub average_rank: Option<f64>,
    /// Mean over the whole previous snapshot, not just countries still charting.
    pub previous_average_rank: Option<f64>,
    pub average_trend: Trend,
    pub tracking_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntry {
    #[serde(flatten)]
    pub entry: CountryRankEntry,
    pub has_data: bool,
    /// 1-based place among the watched countries that chart.
    pub position: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistRanking {
    pub timestamp: NaiveDateTime,
    pub label: String,
    pub entries: Vec<WatchlistEntry>,
    pub average_rank: Option<f64>,
    pub charting_count: usize,
    pub watch_count: usize,
    pub total_tracked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RankingView {
    Global(GlobalRanking),
    Watchlist(WatchlistRanking),
}

impl RankingView {
    pub fn label(&self) -> &str {
        match self {
            RankingView::Global(view) => &view.label,
            RankingView::Watchlist(view) => &view.label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AveragePoint {
    pub timestamp: NaiveDateTime,
    pub label: String,
    pub average_rank: Option<f64>,
}
