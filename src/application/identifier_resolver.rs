//! CUSIP → ticker resolution.
//!
//! Tries the mapping API first, backing off exponentially after every
//! 429/5xx/transport failure, then a compiled-in table of well-known issues.
//! Both hits and misses are cached for the lifetime of the cache, which the
//! ingestion pipeline scopes to one run.

use crate::domain::error::DomainError;
use crate::domain::ports::mapping_api::MappingApi;
use crate::domain::values::cusip::Cusip;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_ATTEMPTS: u32 = 3;

const FALLBACK_TICKERS: &[(&str, &str)] = &[
    ("037833100", "AAPL"),
    ("594918104", "MSFT"),
    ("02079K305", "GOOGL"),
    ("02079K107", "GOOG"),
    ("023135106", "AMZN"),
    ("88160R101", "TSLA"),
    ("30303M102", "META"),
    ("67066G104", "NVDA"),
    ("084670702", "BRK.B"),
    ("084670108", "BRK.A"),
    ("46625H100", "JPM"),
    ("037411105", "APP"),
    ("172967424", "C"),
    ("166764100", "CHTR"),
    ("169905106", "CHD"),
    ("747525103", "VOO"),
    ("922908769", "VTI"),
    ("464287655", "IVV"),
    ("693506107", "PNC"),
    ("716973101", "PFE"),
    ("459200101", "IBM"),
    ("46428Q103", "JD"),
    ("88579Y101", "BA"),
    ("02376R102", "AMD"),
    ("654106103", "NFLX"),
    ("717081103", "PEP"),
    ("191216100", "KO"),
    ("87612E106", "T"),
    ("92343V104", "VZ"),
    ("904764109", "UNH"),
];

/// Static CUSIP → ticker table used when the mapping API cannot answer.
pub fn fallback_ticker(cusip: &str) -> Option<&'static str> {
    FALLBACK_TICKERS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(cusip))
        .map(|(_, t)| *t)
}

/// Concurrent CUSIP → ticker cache. `None` records a confirmed miss.
#[derive(Debug, Default)]
pub struct IdentifierCache {
    entries: DashMap<String, Option<String>>,
}

impl IdentifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cusip: &str) -> Option<Option<String>> {
        self.entries.get(cusip).map(|e| e.value().clone())
    }

    pub fn insert(&self, cusip: &str, ticker: Option<String>) {
        self.entries.insert(cusip.to_string(), ticker);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct MappingJobResult {
    #[serde(default)]
    data: Vec<MappingRecord>,
}

#[derive(Debug, Deserialize)]
struct MappingRecord {
    #[serde(default)]
    ticker: Option<String>,
}

/// First ticker in an OpenFIGI-style response (`[{"data":[{"ticker":..}]}]`).
pub(crate) fn parse_mapping_ticker(body: &str) -> Option<String> {
    let jobs: Vec<MappingJobResult> = serde_json::from_str(body).ok()?;
    jobs.into_iter()
        .flat_map(|job| job.data)
        .filter_map(|rec| rec.ticker)
        .map(|t| t.trim().to_uppercase())
        .find(|t| !t.is_empty())
}

pub struct IdentifierResolver {
    api: Arc<dyn MappingApi>,
    cache: Arc<IdentifierCache>,
    backoff_base: Duration,
}

impl IdentifierResolver {
    pub fn new(api: Arc<dyn MappingApi>, cache: Arc<IdentifierCache>, backoff_base: Duration) -> Self {
        Self {
            api,
            cache,
            backoff_base,
        }
    }

    pub fn cache(&self) -> &IdentifierCache {
        &self.cache
    }

    /// Resolve a CUSIP to a ticker.
    ///
    /// Only a malformed CUSIP is an error; an identifier nobody knows is `Ok(None)`.
    pub async fn resolve(&self, cusip: &str) -> Result<Option<String>, DomainError> {
        let cusip = Cusip::new(cusip)?;
        if let Some(cached) = self.cache.get(cusip.as_str()) {
            return Ok(cached);
        }

        let ticker = match self.query_api(cusip.as_str()).await {
            Some(t) => Some(t),
            None => {
                let fallback = fallback_ticker(cusip.as_str()).map(str::to_string);
                if let Some(t) = &fallback {
                    debug!(cusip = %cusip, ticker = %t, "resolved from fallback table");
                }
                fallback
            }
        };

        self.cache.insert(cusip.as_str(), ticker.clone());
        Ok(ticker)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    async fn query_api(&self, cusip: &str) -> Option<String> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.api.map_cusip(cusip).await {
                Ok(reply) if reply.body.trim_start().starts_with('<') => {
                    warn!(cusip, api = self.api.name(), status = reply.status, "mapping API returned HTML");
                    return None;
                }
                Ok(reply) if (200..300).contains(&reply.status) => {
                    return parse_mapping_ticker(&reply.body);
                }
                Ok(reply) => {
                    let err = DomainError::from_status(reply.status, self.api.name());
                    if !err.is_transient() {
                        debug!(cusip, status = reply.status, "mapping API rejected lookup");
                        return None;
                    }
                    warn!(cusip, attempt, error = %err, "mapping API throttled or unavailable");
                }
                Err(err) if err.is_transient() => {
                    warn!(cusip, attempt, error = %err, "mapping API request failed");
                }
                Err(err) => {
                    warn!(cusip, error = %err, "mapping API request failed permanently");
                    return None;
                }
            }
            tokio::time::sleep(self.backoff(attempt)).await;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_table() {
        assert_eq!(fallback_ticker("037833100"), Some("AAPL"));
        assert_eq!(fallback_ticker("02079k305"), Some("GOOGL"));
        assert_eq!(fallback_ticker("000000000"), None);
        assert_eq!(FALLBACK_TICKERS.len(), 30);
    }

    #[test]
    fn test_parse_mapping_ticker() {
        let body = r#"[{"data":[{"figi":"BBG000B9XRY4","ticker":"aapl","name":"APPLE INC"}]}]"#;
        assert_eq!(parse_mapping_ticker(body), Some("AAPL".into()));
        assert_eq!(parse_mapping_ticker(r#"[{"warning":"No identifier found."}]"#), None);
        assert_eq!(parse_mapping_ticker("not json"), None);
        assert_eq!(parse_mapping_ticker("[]"), None);
    }

    #[test]
    fn test_cache_records_misses() {
        let cache = IdentifierCache::new();
        assert_eq!(cache.get("X"), None);
        cache.insert("X", None);
        assert_eq!(cache.get("X"), Some(None));
        assert_eq!(cache.len(), 1);
    }
}
