use crate::models::error::{RankError, RankResult};
use crate::models::snapshot::Snapshot;

/// The newest snapshot and the one recorded just before it.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPair<'a> {
    pub current: &'a Snapshot,
    pub previous: Option<&'a Snapshot>,
}

/// Picks by position in the history, not by elapsed time.
pub fn select_snapshots(history: &[Snapshot]) -> RankResult<SnapshotPair<'_>> {
    match history {
        [] => Err(RankError::EmptyHistory),
        [.., previous, current] => Ok(SnapshotPair {
            current,
            previous: Some(previous),
        }),
        [current] => Ok(SnapshotPair {
            current,
            previous: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot::CountryRanks;
    use chrono::{NaiveDate, NaiveDateTime};

    fn snapshot(day: u32) -> Snapshot {
        let timestamp: NaiveDateTime = NaiveDate::from_ymd_opt(2026, 2, day)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date");
        Snapshot::new(timestamp, CountryRanks::default())
    }

    #[test]
    fn empty_history_is_an_error() {
        assert!(matches!(select_snapshots(&[]), Err(RankError::EmptyHistory)));
    }

    #[test]
    fn single_snapshot_has_no_previous() {
        let history = [snapshot(1)];
        let pair = select_snapshots(&history).expect("pair");
        assert_eq!(pair.current, &history[0]);
        assert!(pair.previous.is_none());
    }

    #[test]
    fn picks_last_two_entries() {
        let history = [snapshot(1), snapshot(2), snapshot(9)];
        let pair = select_snapshots(&history).expect("pair");
        assert_eq!(pair.current, &history[2]);
        assert_eq!(pair.previous, Some(&history[1]));
    }
}
