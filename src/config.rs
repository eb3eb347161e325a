use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://disease.sh/v3/covid-19";
pub const DEFAULT_SUMMARY_PATH: &str = "/all";

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub api_base: String,
    pub summary_path: String,
    pub history_days: u32,
    pub http_timeout: Duration,
    pub fetch_parallelism: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            summary_path: DEFAULT_SUMMARY_PATH.to_string(),
            history_days: 120,
            http_timeout: Duration::from_secs(10),
            fetch_parallelism: 4,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset or unparsable values fall
    /// back to the defaults; numeric values are clamped to sane ranges.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|val| !val.is_empty())
        };
        let api_base = non_empty("COVID_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let summary_path = non_empty("COVID_API_SUMMARY_PATH")
            .map(|path| normalize_path(&path))
            .unwrap_or(defaults.summary_path);
        let history_days = non_empty("HISTORY_DAYS")
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(defaults.history_days)
            .clamp(1, 1500);
        let timeout_secs = non_empty("HTTP_TIMEOUT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.http_timeout.as_secs())
            .clamp(1, 120);
        let fetch_parallelism = non_empty("FETCH_PARALLELISM")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.fetch_parallelism)
            .clamp(2, 16);

        Self {
            api_base,
            summary_path,
            history_days,
            http_timeout: Duration::from_secs(timeout_secs),
            fetch_parallelism,
        }
    }
}

fn normalize_path(raw: &str) -> String {
    if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> TrackerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TrackerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]), TrackerConfig::default());
    }

    #[test]
    fn overrides_are_normalized() {
        let config = config_from(&[
            ("COVID_API_BASE", " http://localhost:3000/v3/covid-19/ "),
            ("COVID_API_SUMMARY_PATH", "all-countries-summary"),
            ("HISTORY_DAYS", "30"),
        ]);
        assert_eq!(config.api_base, "http://localhost:3000/v3/covid-19");
        assert_eq!(config.summary_path, "/all-countries-summary");
        assert_eq!(config.history_days, 30);
    }

    #[test]
    fn numbers_are_clamped_and_garbage_ignored() {
        let config = config_from(&[
            ("HISTORY_DAYS", "99999"),
            ("HTTP_TIMEOUT_SECS", "0"),
            ("FETCH_PARALLELISM", "lots"),
            ("COVID_API_BASE", "   "),
        ]);
        assert_eq!(config.history_days, 1500);
        assert_eq!(config.http_timeout, Duration::from_secs(1));
        assert_eq!(config.fetch_parallelism, 4);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }
}
