use crate::analysis::aggregator::DEFAULT_TOP_N;
use crate::commands::history::MalformedPolicy;
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const SETTINGS_DIR: &str = ".rankwatch";
const DEFAULT_HISTORY_FILE: &str = "rank_history.json";

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub history_path: PathBuf,
    pub top_n: usize,
    pub watchlist: Vec<String>,
    pub market_weights: HashMap<String, f64>,
    pub malformed_policy: MalformedPolicy,
    pub release_at: Option<DateTime<FixedOffset>>,
    pub watch_debounce: Duration,
}

pub async fn get_settings(workspace_path: &str) -> Result<Value, String> {
    load_settings_from_disk(workspace_path)
}

pub async fn save_settings(workspace_path: &str, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(workspace_path, settings)
}

pub fn load_effective_settings(workspace_path: &str) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(workspace_path)?;

    let history_file = settings
        .get("historyFile")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_HISTORY_FILE);

    let top_n = settings
        .get("topN")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_TOP_N);

    let watchlist = settings
        .get("watchlist")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let market_weights = settings
        .get("marketWeights")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(country, weight)| Some((country.clone(), weight.as_f64()?)))
                .collect()
        })
        .unwrap_or_default();

    let malformed_policy = settings
        .get("malformedPolicy")
        .and_then(Value::as_str)
        .and_then(MalformedPolicy::from_setting)
        .unwrap_or_default();

    let release_at = settings
        .get("releaseAt")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok());

    let watch_debounce = Duration::from_millis(
        settings
            .get("watchDebounceMs")
            .and_then(Value::as_u64)
            .unwrap_or(500),
    );

    Ok(EffectiveSettings {
        history_path: resolve_history_path(workspace_path, history_file),
        top_n,
        watchlist,
        market_weights,
        malformed_policy,
        release_at,
        watch_debounce,
    })
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_settings_dir(workspace_path)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable {}: {e}", path.display());
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(workspace_path: &str, settings: Value) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_settings_dir(workspace_path)?;

    let mut merged = load_settings_from_disk(workspace_path).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    log::info!("Saved settings to {}", path.display());
    Ok(migrated)
}

fn resolve_history_path(workspace_path: &str, history_file: &str) -> PathBuf {
    let path = Path::new(history_file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(workspace_path).join(path)
    }
}

fn settings_path(workspace_path: &str) -> PathBuf {
    Path::new(workspace_path)
        .join(SETTINGS_DIR)
        .join("settings.json")
}

fn ensure_settings_dir(workspace_path: &str) -> Result<(), String> {
    let dir = Path::new(workspace_path).join(SETTINGS_DIR);
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create {SETTINGS_DIR} directory: {e}"))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        migrate_legacy_keys(&mut out);
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "historyFile": DEFAULT_HISTORY_FILE,
        "topN": DEFAULT_TOP_N,
        "watchlist": [],
        "marketWeights": {},
        "malformedPolicy": "fail",
        "releaseAt": null,
        "watchDebounceMs": 500
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

/// Pre-versioned files used `top_n` and a comma-separated watchlist string.
fn migrate_legacy_keys(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    if let Some(top_n) = obj.remove("top_n") {
        obj.entry("topN".to_string()).or_insert(top_n);
    }

    if let Some(Value::String(raw)) = obj.get("watchlist") {
        let countries: Vec<Value> = raw
            .split(',')
            .map(str::trim)
            .filter(|country| !country.is_empty())
            .map(|country| json!(country))
            .collect();
        obj.insert("watchlist".to_string(), Value::Array(countries));
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "topN", 1, 50, DEFAULT_TOP_N as u64);
    clamp_u64(obj, "watchDebounceMs", 100, 10_000, 500);

    sanitize_enum(obj, "malformedPolicy", &MalformedPolicy::ALLOWED, "fail");
    sanitize_string(obj, "historyFile", DEFAULT_HISTORY_FILE);
    sanitize_watchlist(obj);
    sanitize_weights(obj);
    sanitize_release_at(obj);
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

fn sanitize_string(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}

fn sanitize_watchlist(map: &mut Map<String, Value>) {
    let mut countries: Vec<String> = Vec::new();
    if let Some(items) = map.get("watchlist").and_then(Value::as_array) {
        for country in items.iter().filter_map(Value::as_str).map(str::trim) {
            if !country.is_empty() && !countries.iter().any(|c| c == country) {
                countries.push(country.to_string());
            }
        }
    }
    map.insert("watchlist".to_string(), json!(countries));
}

fn sanitize_weights(map: &mut Map<String, Value>) {
    let weights: Map<String, Value> = map
        .get("marketWeights")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(country, weight)| {
                    let weight = weight.as_f64().filter(|w| w.is_finite() && *w >= 0.0)?;
                    Some((country.clone(), json!(weight)))
                })
                .collect()
        })
        .unwrap_or_default();
    map.insert("marketWeights".to_string(), Value::Object(weights));
}

fn sanitize_release_at(map: &mut Map<String, Value>) {
    let valid = match map.get("releaseAt") {
        Some(Value::String(raw)) if DateTime::parse_from_rfc3339(raw).is_ok() => {
            Value::String(raw.clone())
        }
        Some(Value::Null) | None => Value::Null,
        Some(other) => {
            log::warn!("Dropping invalid releaseAt setting: {other}");
            Value::Null
        }
    };
    map.insert("releaseAt".to_string(), valid);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrates_legacy_keys() {
        let migrated = migrate_settings(json!({
            "top_n": 8,
            "watchlist": "KR, JP,, US"
        }));

        assert_eq!(migrated["topN"], json!(8));
        assert!(migrated.get("top_n").is_none());
        assert_eq!(migrated["watchlist"], json!(["KR", "JP", "US"]));
        assert_eq!(migrated["schema_version"], json!(SETTINGS_SCHEMA_VERSION));
    }

    #[test]
    fn sanitizes_out_of_range_and_invalid_values() {
        let migrated = migrate_settings(json!({
            "schema_version": 1,
            "topN": 500,
            "watchDebounceMs": 1,
            "malformedPolicy": "ignore",
            "watchlist": ["KR", "KR", 7, " JP "],
            "marketWeights": {"US": 30.0, "CN": -1, "JP": "heavy"},
            "releaseAt": "next spring"
        }));

        assert_eq!(migrated["topN"], json!(50));
        assert_eq!(migrated["watchDebounceMs"], json!(100));
        assert_eq!(migrated["malformedPolicy"], json!("fail"));
        assert_eq!(migrated["watchlist"], json!(["KR", "JP"]));
        assert_eq!(migrated["marketWeights"], json!({"US": 30.0}));
        assert_eq!(migrated["releaseAt"], Value::Null);
    }

    #[test]
    fn merges_partial_settings_without_losing_existing_values() {
        let mut existing = default_settings();
        merge_settings(&mut existing, &json!({ "topN": 10 }));
        let migrated = migrate_settings(existing);

        assert_eq!(migrated["topN"], json!(10));
        assert_eq!(migrated["historyFile"], json!(DEFAULT_HISTORY_FILE));
        assert!(migrated.get("marketWeights").is_some());
    }

    #[test]
    fn relative_history_path_resolves_against_workspace() {
        assert_eq!(
            resolve_history_path("/data/tracker", "rank_history.json"),
            PathBuf::from("/data/tracker/rank_history.json")
        );
        assert_eq!(
            resolve_history_path("/data/tracker", "/srv/history.json"),
            PathBuf::from("/srv/history.json")
        );
    }
}
