//! Leveraged and inverse product registry.
//!
//! Maps exchange-traded leveraged products onto the asset they track so that
//! `TSLL 10%` and `TSLA 20%` are recognised as the same bet.

use crate::domain::error::DomainError;
use crate::domain::values::product_mapping::ProductMapping;
use parking_lot::RwLock;
use std::collections::HashMap;

const DEFAULT_MAPPINGS: &[(&str, &str, f64)] = &[
    ("TSLL", "TSLA", 2.0),
    ("TQQQ", "QQQ", 3.0),
    ("SQQQ", "QQQ", -3.0),
    ("QLD", "QQQ", 2.0),
    ("SOXL", "SOXX", 3.0),
    ("SOXS", "SOXX", -3.0),
    ("SPXL", "SPY", 3.0),
    ("SPXS", "SPY", -3.0),
    ("UPRO", "SPY", 3.0),
    ("SPXU", "SPY", -3.0),
    ("SSO", "SPY", 2.0),
    ("SDS", "SPY", -2.0),
    ("UVXY", "VIX", 1.5),
    ("SVXY", "VIX", -0.5),
    ("UGLD", "GLD", 3.0),
    ("DGLD", "GLD", -3.0),
    ("OILU", "USO", 2.0),
    ("OILD", "USO", -2.0),
];

pub struct LeveragedProductRegistry {
    mappings: RwLock<HashMap<String, ProductMapping>>,
}

impl LeveragedProductRegistry {
    pub fn with_defaults() -> Self {
        let mappings = DEFAULT_MAPPINGS
            .iter()
            .map(|(ticker, base, factor)| {
                (
                    ticker.to_string(),
                    ProductMapping {
                        base_ticker: base.to_string(),
                        factor: *factor,
                    },
                )
            })
            .collect();
        Self {
            mappings: RwLock::new(mappings),
        }
    }

    /// Case-insensitive lookup. Unknown tickers map to themselves with factor 1.
    pub fn lookup(&self, ticker: &str) -> ProductMapping {
        self.mappings
            .read()
            .get(&ticker.trim().to_uppercase())
            .cloned()
            .unwrap_or_else(|| ProductMapping::identity(ticker))
    }

    pub fn register(&self, ticker: &str, base_ticker: &str, factor: f64) -> Result<(), DomainError> {
        if factor == 0.0 || !factor.is_finite() {
            return Err(DomainError::Validation(format!(
                "Leverage factor for {ticker} must be a non-zero number"
            )));
        }
        let ticker = ticker.trim().to_uppercase();
        let base_ticker = base_ticker.trim().to_uppercase();
        if ticker.is_empty() || base_ticker.is_empty() {
            return Err(DomainError::Validation("Ticker and base ticker must not be empty".into()));
        }
        self.mappings.write().insert(
            ticker,
            ProductMapping {
                base_ticker,
                factor,
            },
        );
        Ok(())
    }

    pub fn is_leveraged(&self, ticker: &str) -> bool {
        self.mappings.read().contains_key(&ticker.trim().to_uppercase())
    }

    /// Snapshot of every registered mapping, ordered by ticker.
    pub fn all_mappings(&self) -> Vec<(String, ProductMapping)> {
        let mut all: Vec<(String, ProductMapping)> = self
            .mappings
            .read()
            .iter()
            .map(|(t, m)| (t.clone(), m.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

impl Default for LeveragedProductRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
