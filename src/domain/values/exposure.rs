//! Exposure maps: base ticker → weight after leverage adjustment.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A portfolio as supplied by a caller: ticker → weight (usually percent).
pub type RawPortfolio = HashMap<String, f64>;

/// Canonical base-asset exposure.
///
/// Produced by the normalizer. In long-only mode every weight is positive and
/// the weights sum to 1; in long-short mode the absolute weights sum to 1.
/// An empty map means there was no usable exposure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExposureMap(BTreeMap<String, f64>);

impl ExposureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(pairs.into_iter().map(|(t, w)| (t.into(), w)).collect())
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.0.get(ticker).copied()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains_key(ticker)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(t, w)| (t.as_str(), *w))
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|t| t.as_str())
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn abs_sum(&self) -> f64 {
        self.0.values().map(|w| w.abs()).sum()
    }

    pub fn max_weight(&self) -> Option<f64> {
        self.0.values().copied().reduce(f64::max)
    }

    /// Tickers ordered by weight descending, ties broken alphabetically.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }

    /// The `n` heaviest tickers.
    pub fn top_tickers(&self, n: usize) -> Vec<&str> {
        self.ranked().into_iter().take(n).map(|(t, _)| t).collect()
    }
}

impl FromIterator<(String, f64)> for ExposureMap {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
