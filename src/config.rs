//! Runtime settings, read from `HOLDINGSMATCH_*` environment variables.

use std::time::Duration;
use tracing::warn;

pub const DEFAULT_SUBMISSIONS_URL: &str = "https://data.sec.gov/submissions";
pub const DEFAULT_ARCHIVES_URL: &str = "https://www.sec.gov/Archives/edgar/data";
pub const DEFAULT_OPENFIGI_URL: &str = "https://api.openfigi.com/v3/mapping";
/// SEC asks automated clients to identify themselves with a contact address.
pub const DEFAULT_USER_AGENT: &str = "holdingsmatch/0.1 (contact: admin@example.com)";

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: String,
    pub edgar_user_agent: String,
    pub submissions_url: String,
    pub archives_url: String,
    pub openfigi_url: String,
    pub openfigi_api_key: Option<String>,
    /// Minimum spacing between EDGAR requests.
    pub request_interval: Duration,
    /// First retry delay for the mapping API; doubles per attempt.
    pub resolver_backoff: Duration,
    /// Investors ingested at the same time.
    pub ingest_concurrency: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: "holdingsmatch.db".to_string(),
            edgar_user_agent: DEFAULT_USER_AGENT.to_string(),
            submissions_url: DEFAULT_SUBMISSIONS_URL.to_string(),
            archives_url: DEFAULT_ARCHIVES_URL.to_string(),
            openfigi_url: DEFAULT_OPENFIGI_URL.to_string(),
            openfigi_api_key: None,
            request_interval: Duration::from_millis(500),
            resolver_backoff: Duration::from_secs(1),
            ingest_concurrency: 4,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let millis = |key: &str, default: Duration| match get(key) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    warn!(key, value = %raw, "ignoring invalid millisecond setting");
                    default
                }
            },
            None => default,
        };

        let defaults = Self::default();
        let ingest_concurrency = match get("HOLDINGSMATCH_CONCURRENCY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(value = %raw, "ignoring invalid HOLDINGSMATCH_CONCURRENCY");
                    defaults.ingest_concurrency
                }
            },
            None => defaults.ingest_concurrency,
        };

        Self {
            db_path: get("HOLDINGSMATCH_DB_PATH").unwrap_or(defaults.db_path),
            edgar_user_agent: get("HOLDINGSMATCH_USER_AGENT").unwrap_or(defaults.edgar_user_agent),
            submissions_url: get("HOLDINGSMATCH_SUBMISSIONS_URL").unwrap_or(defaults.submissions_url),
            archives_url: get("HOLDINGSMATCH_ARCHIVES_URL").unwrap_or(defaults.archives_url),
            openfigi_url: get("HOLDINGSMATCH_OPENFIGI_URL").unwrap_or(defaults.openfigi_url),
            openfigi_api_key: get("HOLDINGSMATCH_OPENFIGI_API_KEY"),
            request_interval: millis("HOLDINGSMATCH_REQUEST_INTERVAL_MS", defaults.request_interval),
            resolver_backoff: millis("HOLDINGSMATCH_RESOLVER_BACKOFF_MS", defaults.resolver_backoff),
            ingest_concurrency,
            connect_timeout: millis("HOLDINGSMATCH_CONNECT_TIMEOUT_MS", defaults.connect_timeout),
            request_timeout: millis("HOLDINGSMATCH_REQUEST_TIMEOUT_MS", defaults.request_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let s = Settings::from_lookup(|_| None);
        assert_eq!(s.request_interval, Duration::from_millis(500));
        assert_eq!(s.resolver_backoff, Duration::from_secs(1));
        assert_eq!(s.submissions_url, DEFAULT_SUBMISSIONS_URL);
        assert!(s.openfigi_api_key.is_none());
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("HOLDINGSMATCH_DB_PATH", "/tmp/h.db"),
            ("HOLDINGSMATCH_OPENFIGI_API_KEY", "secret"),
            ("HOLDINGSMATCH_REQUEST_INTERVAL_MS", "150"),
            ("HOLDINGSMATCH_RESOLVER_BACKOFF_MS", "soon"),
            ("HOLDINGSMATCH_CONCURRENCY", "0"),
        ]);
        let s = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(s.db_path, "/tmp/h.db");
        assert_eq!(s.openfigi_api_key.as_deref(), Some("secret"));
        assert_eq!(s.request_interval, Duration::from_millis(150));
        assert_eq!(s.resolver_backoff, Duration::from_secs(1));
        assert_eq!(s.ingest_concurrency, 4);
    }
}
