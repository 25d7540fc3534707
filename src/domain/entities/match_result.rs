use serde::Serialize;

/// How closely one investor's latest portfolio resembles the user's.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub investor_id: String,
    pub investor_name: String,
    /// `0.4 * similarity + 0.4 * overlap + 0.2 * top overlap`, 0–100.
    pub composite_score: f64,
    /// Similarity of the two exposure maps, 0–100.
    pub similarity_score: f64,
    /// Share of the user's top-5 tickers the investor also holds, 0–100.
    pub top_overlap_score: f64,
    pub matched_tickers: Vec<String>,
    /// Share of the user's tickers the investor also holds, 0–100.
    pub overlap_pct: f64,
    pub philosophy: Option<String>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub suggestions: String,
    pub total_holdings: usize,
}
