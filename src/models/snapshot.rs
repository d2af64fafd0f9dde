use crate::models::error::{RankError, RankResult};
use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

/// Keys the country map has been written under by the different trackers.
const COUNTRY_MAP_KEYS: [&str; 3] = ["raw_results", "countryRanks", "country_ranks"];

const NAIVE_TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Chart positions of the two editions in one country. Zero is never a
/// valid position and is normalized to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EditionRanks {
    pub standard: Option<u32>,
    pub deluxe: Option<u32>,
}

impl EditionRanks {
    pub fn new(standard: Option<u32>, deluxe: Option<u32>) -> Self {
        Self {
            standard: standard.filter(|rank| *rank > 0),
            deluxe: deluxe.filter(|rank| *rank > 0),
        }
    }

    pub fn is_charting(&self) -> bool {
        self.standard.is_some() || self.deluxe.is_some()
    }

    fn from_value(raw: &Value) -> Result<Self, String> {
        match raw {
            Value::Null => Ok(Self::default()),
            Value::Object(obj) => Ok(Self {
                standard: parse_rank(obj.get("standard")).map_err(|e| format!("standard {e}"))?,
                deluxe: parse_rank(obj.get("deluxe")).map_err(|e| format!("deluxe {e}"))?,
            }),
            other => Err(format!("expected an object, found {}", value_kind(other))),
        }
    }
}

/// Country → edition ranks, kept in the order the source document listed
/// them. Ranking ties fall back to this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryRanks(Vec<(String, EditionRanks)>);

impl CountryRanks {
    pub fn get(&self, country: &str) -> Option<&EditionRanks> {
        self.0
            .iter()
            .find(|(name, _)| name == country)
            .map(|(_, ranks)| ranks)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EditionRanks)> {
        self.0.iter().map(|(name, ranks)| (name.as_str(), ranks))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, EditionRanks)> for CountryRanks {
    fn from_iter<I: IntoIterator<Item = (String, EditionRanks)>>(iter: I) -> Self {
        let mut entries: Vec<(String, EditionRanks)> = Vec::new();
        for (country, ranks) in iter {
            match entries.iter_mut().find(|(name, _)| *name == country) {
                Some(existing) => existing.1 = ranks,
                None => entries.push((country, ranks)),
            }
        }
        Self(entries)
    }
}

/// One observation of every tracked storefront. Never mutated once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub country_ranks: CountryRanks,
}

impl Snapshot {
    pub fn new(timestamp: NaiveDateTime, country_ranks: CountryRanks) -> Self {
        Self {
            timestamp,
            country_ranks,
        }
    }

    /// Builds a snapshot from one element of the history array. `index` is
    /// only used to locate the element in error messages.
    pub fn from_value(index: usize, value: &Value) -> RankResult<Self> {
        let Value::Object(obj) = value else {
            return Err(RankError::malformed(
                index,
                format!("expected an object, found {}", value_kind(value)),
            ));
        };

        let timestamp = match obj.get("timestamp") {
            Some(raw) => parse_timestamp(raw)
                .ok_or_else(|| RankError::malformed(index, format!("unparseable timestamp {raw}")))?,
            None => return Err(RankError::malformed(index, "missing timestamp")),
        };

        let country_ranks = match COUNTRY_MAP_KEYS.iter().find_map(|key| obj.get(*key)) {
            None | Some(Value::Null) => CountryRanks::default(),
            Some(Value::Object(map)) => parse_country_map(index, map)?,
            Some(other) => {
                return Err(RankError::malformed(
                    index,
                    format!("country map must be an object, found {}", value_kind(other)),
                ))
            }
        };

        Ok(Self {
            timestamp,
            country_ranks,
        })
    }

    pub fn label(&self) -> String {
        format_label(&self.timestamp)
    }
}

/// `M/D HH:MM` using the wall-clock time the snapshot was recorded at.
pub fn format_label(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%-m/%-d %H:%M").to_string()
}

fn parse_country_map(index: usize, map: &Map<String, Value>) -> RankResult<CountryRanks> {
    map.iter()
        .map(|(country, raw)| {
            EditionRanks::from_value(raw)
                .map(|ranks| (country.clone(), ranks))
                .map_err(|reason| RankError::malformed(index, format!("{country}: {reason}")))
        })
        .collect()
}

fn parse_rank(raw: Option<&Value>) -> Result<Option<u32>, String> {
    match raw {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(rank) = n.as_u64() {
                return match rank {
                    0 => Ok(None),
                    _ => u32::try_from(rank)
                        .map(Some)
                        .map_err(|_| format!("rank {rank} out of range")),
                };
            }
            match n.as_f64() {
                Some(f) if f == 0.0 => Ok(None),
                Some(f) if f > 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(Some(f as u32)),
                _ => Err(format!("rank {n} is not a positive integer")),
            }
        }
        Some(other) => Err(format!("rank must be a number, found {}", value_kind(other))),
    }
}

fn parse_timestamp(raw: &Value) -> Option<NaiveDateTime> {
    match raw {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_local())
                .ok()
                .or_else(|| {
                    NAIVE_TIMESTAMP_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 7)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid time")
    }

    #[test]
    fn zero_false_and_null_ranks_are_absent() {
        let value = json!({
            "timestamp": "2026-03-07T09:05:00",
            "raw_results": {
                "US": {"standard": 0, "deluxe": null},
                "JP": {"standard": false},
                "KR": null
            }
        });

        let snapshot = Snapshot::from_value(0, &value).expect("valid snapshot");
        assert_eq!(snapshot.country_ranks.len(), 3);
        assert!(snapshot.country_ranks.iter().all(|(_, r)| !r.is_charting()));
    }

    #[test]
    fn keeps_document_country_order() {
        let value = json!({
            "timestamp": "2026-03-07T09:05:00",
            "raw_results": {"ZA": {"standard": 3}, "AU": {"deluxe": 1}, "MX": {}}
        });

        let snapshot = Snapshot::from_value(0, &value).expect("valid snapshot");
        let order: Vec<&str> = snapshot.country_ranks.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["ZA", "AU", "MX"]);
    }

    #[test]
    fn missing_country_map_is_an_empty_snapshot() {
        let snapshot = Snapshot::from_value(0, &json!({"timestamp": "2026-03-07T09:05:00"}))
            .expect("valid snapshot");
        assert!(snapshot.country_ranks.is_empty());
    }

    #[test]
    fn rejects_structurally_broken_snapshots() {
        let cases = [
            json!("2026-03-07"),
            json!({"raw_results": {}}),
            json!({"timestamp": "yesterday", "raw_results": {}}),
            json!({"timestamp": "2026-03-07T09:05:00", "raw_results": []}),
            json!({"timestamp": "2026-03-07T09:05:00", "raw_results": {"US": {"standard": -4}}}),
            json!({"timestamp": "2026-03-07T09:05:00", "raw_results": {"US": {"deluxe": "7"}}}),
            json!({"timestamp": "2026-03-07T09:05:00", "raw_results": {"US": 4}}),
        ];

        for (index, case) in cases.iter().enumerate() {
            let err = Snapshot::from_value(index, case).expect_err("should be malformed");
            assert!(
                matches!(err, RankError::MalformedSnapshot { index: i, .. } if i == index),
                "case {index}: {err}"
            );
        }
    }

    #[test]
    fn parses_timestamp_variants() {
        let naive = Snapshot::from_value(0, &json!({"timestamp": "2026-03-07T09:05:00.123456"}))
            .expect("naive iso");
        let offset = Snapshot::from_value(0, &json!({"timestamp": "2026-03-07T09:05:00+09:00"}))
            .expect("offset iso");
        let spaced = Snapshot::from_value(0, &json!({"timestamp": "2026-03-07 09:05:00"}))
            .expect("space separated");

        assert_eq!(naive.label(), "3/7 09:05");
        assert_eq!(offset.timestamp, at(9, 5));
        assert_eq!(spaced.timestamp, at(9, 5));
    }

    #[test]
    fn accepts_alternate_country_map_key() {
        let snapshot = Snapshot::from_value(
            0,
            &json!({"timestamp": 1772874300, "countryRanks": {"KR": {"standard": 2.0}}}),
        )
        .expect("valid snapshot");

        assert_eq!(
            snapshot.country_ranks.get("KR"),
            Some(&EditionRanks::new(Some(2), None))
        );
    }

    #[test]
    fn label_does_not_pad_month_or_day() {
        assert_eq!(format_label(&at(23, 7)), "3/7 23:07");
    }
}
