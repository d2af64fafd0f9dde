use crate::analysis::combiner::combined_rank;
use crate::analysis::selector::{select_snapshots, SnapshotPair};
use crate::analysis::trend::{classify, classify_edition};
use crate::models::error::RankResult;
use crate::models::ranking::{
    AveragePoint, CountryRankEntry, GlobalRanking, RankingView, WatchlistEntry, WatchlistRanking,
};
use crate::models::snapshot::Snapshot;

pub const DEFAULT_TOP_N: usize = 5;

/// How the per-country entries of the latest snapshot are turned into a view.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationMode {
    /// Every charting country, best first, with the first `top_n` singled out.
    GlobalTopN { top_n: usize },
    /// A fixed, caller-ordered list shown whether or not each country charts.
    Watchlist { countries: Vec<String> },
}

impl Default for AggregationMode {
    fn default() -> Self {
        AggregationMode::GlobalTopN {
            top_n: DEFAULT_TOP_N,
        }
    }
}

pub fn aggregate(history: &[Snapshot], mode: &AggregationMode) -> RankResult<RankingView> {
    let pair = select_snapshots(history)?;
    let view = match mode {
        AggregationMode::GlobalTopN { top_n } => RankingView::Global(aggregate_global(&pair, *top_n)),
        AggregationMode::Watchlist { countries } => {
            RankingView::Watchlist(aggregate_watchlist(&pair, countries))
        }
    };
    Ok(view)
}

pub fn aggregate_global(pair: &SnapshotPair<'_>, top_n: usize) -> GlobalRanking {
    let mut entries: Vec<CountryRankEntry> = pair
        .current
        .country_ranks
        .iter()
        .map(|(country, _)| build_entry(country, pair))
        .filter(|entry| entry.combined_rank.is_some())
        .collect();
    sort_by_combined(&mut entries);

    let average_rank = mean(entries.iter().filter_map(|entry| entry.combined_rank));
    let previous_average_rank = pair.previous.and_then(snapshot_average);
    let top = entries.iter().take(top_n).cloned().collect();

    log::debug!(
        "global ranking at {}: {} charting, average {:?}",
        pair.current.label(),
        entries.len(),
        average_rank
    );

    GlobalRanking {
        timestamp: pair.current.timestamp,
        label: pair.current.label(),
        tracking_count: entries.len(),
        top,
        top_n,
        average_rank,
        previous_average_rank,
        average_trend: classify(average_rank, previous_average_rank),
        entries,
    }
}

pub fn aggregate_watchlist(pair: &SnapshotPair<'_>, countries: &[String]) -> WatchlistRanking {
    let (mut charting, missing): (Vec<CountryRankEntry>, Vec<CountryRankEntry>) = countries
        .iter()
        .map(|country| build_entry(country, pair))
        .partition(|entry| entry.combined_rank.is_some());
    sort_by_combined(&mut charting);

    let average_rank = mean(charting.iter().filter_map(|entry| entry.combined_rank));
    let charting_count = charting.len();

    let entries = charting
        .into_iter()
        .enumerate()
        .map(|(index, entry)| WatchlistEntry {
            entry,
            has_data: true,
            position: Some(index + 1),
        })
        .chain(missing.into_iter().map(|entry| WatchlistEntry {
            entry,
            has_data: false,
            position: None,
        }))
        .collect();

    log::debug!(
        "watchlist ranking at {}: {}/{} watched countries charting",
        pair.current.label(),
        charting_count,
        countries.len()
    );

    WatchlistRanking {
        timestamp: pair.current.timestamp,
        label: pair.current.label(),
        entries,
        average_rank,
        charting_count,
        watch_count: countries.len(),
        total_tracked: charting_count_of(pair.current),
    }
}

/// Entry for `country` in the current snapshot, compared with the same
/// country in the previous one. A country missing from a snapshot counts as
/// not charting there.
pub fn build_entry(country: &str, pair: &SnapshotPair<'_>) -> CountryRankEntry {
    let current = pair
        .current
        .country_ranks
        .get(country)
        .copied()
        .unwrap_or_default();
    let previous = pair
        .previous
        .and_then(|snapshot| snapshot.country_ranks.get(country))
        .copied()
        .unwrap_or_default();

    let combined = combined_rank(&current);
    let previous_combined = combined_rank(&previous);

    CountryRankEntry {
        country: country.to_string(),
        standard_rank: current.standard,
        deluxe_rank: current.deluxe,
        combined_rank: combined,
        previous_combined_rank: previous_combined,
        trend: classify(combined, previous_combined),
        standard_trend: classify_edition(current.standard, previous.standard),
        deluxe_trend: classify_edition(current.deluxe, previous.deluxe),
    }
}

/// Unweighted mean combined rank over every charting country of a snapshot.
pub fn snapshot_average(snapshot: &Snapshot) -> Option<f64> {
    mean(
        snapshot
            .country_ranks
            .iter()
            .filter_map(|(_, ranks)| combined_rank(ranks)),
    )
}

pub fn average_rank_series(history: &[Snapshot]) -> Vec<AveragePoint> {
    history
        .iter()
        .map(|snapshot| AveragePoint {
            timestamp: snapshot.timestamp,
            label: snapshot.label(),
            average_rank: snapshot_average(snapshot),
        })
        .collect()
}

fn charting_count_of(snapshot: &Snapshot) -> usize {
    snapshot
        .country_ranks
        .iter()
        .filter(|(_, ranks)| ranks.is_charting())
        .count()
}

// Stable, so equal ranks keep their input order.
fn sort_by_combined(entries: &mut [CountryRankEntry]) {
    entries.sort_by(|a, b| {
        let a = a.combined_rank.unwrap_or(f64::INFINITY);
        let b = b.combined_rank.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
