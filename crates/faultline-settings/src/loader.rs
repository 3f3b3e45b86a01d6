//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FaultlineSettings::default()`]
//! 2. If `~/.faultline/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `FAULTLINE_*` environment variable overrides (highest priority)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{FaultlineSettings, MAX_BATCH_SIZE};

/// An environment override that was set but rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IgnoredOverride {
    pub key: &'static str,
    pub value: String,
    /// Accepted range, e.g. `1..=10`.
    pub expected: String,
}

/// Loaded settings plus the overrides that were rejected on the way.
///
/// Lets a caller that loads settings before logging is up report the
/// rejections once it is.
#[derive(Clone, Debug)]
pub struct LoadedSettings {
    pub settings: FaultlineSettings,
    pub ignored: Vec<IgnoredOverride>,
}

/// Resolve the path to the settings file (`~/.faultline/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".faultline").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<FaultlineSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error. Rejected
/// overrides are logged at `warn`.
pub fn load_settings_from_path(path: &Path) -> Result<FaultlineSettings> {
    let loaded = load_settings_with_report(path)?;
    for ignored in &loaded.ignored {
        warn!(
            key = ignored.key,
            value = %ignored.value,
            expected = %ignored.expected,
            "invalid env override, ignoring"
        );
    }
    Ok(loaded.settings)
}

/// [`load_settings_from_path`] without logging; rejected overrides are
/// returned instead.
pub fn load_settings_with_report(path: &Path) -> Result<LoadedSettings> {
    let defaults = serde_json::to_value(FaultlineSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: FaultlineSettings = serde_json::from_value(merged)?;
    let ignored = apply_env_overrides(&mut settings);
    Ok(LoadedSettings { settings, ignored })
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `FAULTLINE_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut FaultlineSettings) -> Vec<IgnoredOverride> {
    apply_overrides(settings, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup`. Empty values count as unset;
/// out-of-range values are skipped and returned.
pub fn apply_overrides<F>(settings: &mut FaultlineSettings, lookup: F) -> Vec<IgnoredOverride>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = Overrides {
        lookup,
        ignored: Vec::new(),
    };

    if let Some(v) = env.string("FAULTLINE_WEBHOOK_URL") {
        settings.webhook.url = v;
    }
    if let Some(v) = env.string("FAULTLINE_BOT_TOKEN") {
        settings.webhook.bot_token = Some(v);
    }
    if let Some(v) = env.u64_in("FAULTLINE_REQUEST_TIMEOUT_SECS", 1, 600) {
        settings.webhook.request_timeout_secs = v;
    }

    if let Some(v) = env.usize_in("FAULTLINE_WRAP_LEN", 100, 4096) {
        settings.report.wrap_len = v;
    }
    if let Some(v) = env.usize_in("FAULTLINE_BATCH_SIZE", 1, MAX_BATCH_SIZE) {
        settings.report.batch_size = v;
    }
    if let Some(v) = env.string("FAULTLINE_FENCE_LANG") {
        settings.report.fence_lang = v;
    }
    if let Some(v) = env.usize_in("FAULTLINE_HISTORY_LIMIT", 1, 1_000_000) {
        settings.report.history_limit = Some(v);
    }

    if let Some(v) = env.string("FAULTLINE_LOG_LEVEL") {
        settings.logging.level = v;
    }

    env.ignored
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

struct Overrides<F> {
    lookup: F,
    ignored: Vec<IgnoredOverride>,
}

impl<F> Overrides<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    fn u64_in(&mut self, key: &'static str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(key)?;
        let parsed = parse_u64_range(&val, min, max);
        if parsed.is_none() {
            self.reject(key, val, format!("{min}..={max}"));
        }
        parsed
    }

    fn usize_in(&mut self, key: &'static str, min: usize, max: usize) -> Option<usize> {
        let val = self.string(key)?;
        let parsed = parse_usize_range(&val, min, max);
        if parsed.is_none() {
            self.reject(key, val, format!("{min}..={max}"));
        }
        parsed
    }

    fn reject(&mut self, key: &'static str, value: String, expected: String) {
        self.ignored.push(IgnoredOverride {
            key,
            value,
            expected,
        });
    }
}
