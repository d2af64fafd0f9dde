use crate::models::error::{RankError, RankResult};
use crate::models::snapshot::{value_kind, Snapshot};
use serde_json::Value;
use std::path::Path;

/// What to do with a history element that is not a usable snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    #[default]
    Fail,
    Skip,
}

impl MalformedPolicy {
    pub const ALLOWED: [&'static str; 2] = ["fail", "skip"];

    pub fn from_setting(value: &str) -> Option<Self> {
        match value {
            "fail" => Some(MalformedPolicy::Fail),
            "skip" => Some(MalformedPolicy::Skip),
            _ => None,
        }
    }
}

pub async fn load_history(path: &Path, policy: MalformedPolicy) -> RankResult<Vec<Snapshot>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let history = parse_history(&raw, policy)?;
    log::debug!("Loaded {} snapshots from {}", history.len(), path.display());
    Ok(history)
}

/// Parses the rank history document. A blank document or `null` is an empty
/// history; anything but an array of snapshots is rejected.
pub fn parse_history(raw: &str, policy: MalformedPolicy) -> RankResult<Vec<Snapshot>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let items = match serde_json::from_str::<Value>(raw)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(RankError::MalformedHistory(format!(
                "expected an array of snapshots, found {}",
                value_kind(&other)
            )))
        }
    };

    let mut history = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match Snapshot::from_value(index, item) {
            Ok(snapshot) => history.push(snapshot),
            Err(err) if policy == MalformedPolicy::Skip => log::warn!("Skipping: {err}"),
            Err(err) => return Err(err),
        }
    }

    if let Some(pos) = history
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        log::warn!(
            "Rank history is not in timestamp order (snapshot {} precedes {}); using file order",
            history[pos].label(),
            history[pos + 1].label()
        );
    }

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SNAPSHOTS: &str = r#"[
        {"timestamp": "2026-03-01T10:00:00", "averages": {"combined": 7.5},
         "raw_results": {"KR": {"standard": 10, "deluxe": null}}},
        {"timestamp": "2026-03-01T10:30:00",
         "raw_results": {"KR": {"standard": 4, "deluxe": 6}}}
    ]"#;

    #[test]
    fn parses_tracker_output() {
        let history = parse_history(TWO_SNAPSHOTS, MalformedPolicy::Fail).expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].label(), "3/1 10:30");
    }

    #[test]
    fn blank_and_null_documents_are_empty_histories() {
        assert!(parse_history("  \n", MalformedPolicy::Fail).expect("blank").is_empty());
        assert!(parse_history("null", MalformedPolicy::Fail).expect("null").is_empty());
        assert!(parse_history("[]", MalformedPolicy::Fail).expect("empty").is_empty());
    }

    #[test]
    fn non_array_document_is_malformed() {
        let err = parse_history(r#"{"timestamp": "2026-03-01T10:00:00"}"#, MalformedPolicy::Skip)
            .expect_err("object document");
        assert!(matches!(err, RankError::MalformedHistory(_)));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = parse_history("[{", MalformedPolicy::Skip).expect_err("truncated");
        assert!(matches!(err, RankError::Json(_)));
    }

    #[test]
    fn policy_decides_between_failing_and_skipping() {
        let raw = r#"[
            {"timestamp": "2026-03-01T10:00:00", "raw_results": {"KR": {"standard": 3}}},
            {"raw_results": {"KR": {"standard": 2}}}
        ]"#;

        let err = parse_history(raw, MalformedPolicy::Fail).expect_err("fail fast");
        assert!(matches!(err, RankError::MalformedSnapshot { index: 1, .. }));

        let history = parse_history(raw, MalformedPolicy::Skip).expect("skip");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn policy_names_round_trip() {
        for name in MalformedPolicy::ALLOWED {
            assert!(MalformedPolicy::from_setting(name).is_some());
        }
        assert_eq!(MalformedPolicy::from_setting("ignore"), None);
    }
}
