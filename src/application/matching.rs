//! Ranks investors by how closely their latest 13F resembles a user portfolio.

use crate::application::normalize::ExposureNormalizer;
use crate::domain::entities::investor::InvestorProfile;
use crate::domain::entities::match_result::MatchResult;
use crate::domain::error::DomainError;
use crate::domain::ports::holding_repository::HoldingRepository;
use crate::domain::ports::investor_repository::InvestorRepository;
use crate::domain::ports::similarity::SimilarityCalculator;
use crate::domain::values::exposure::{ExposureMap, RawPortfolio};
use crate::domain::values::normalization_mode::NormalizationMode;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_RESULTS: usize = 3;
/// Size of the user's "top positions" set used for the top-overlap score.
const TOP_N: usize = 5;

const SIMILARITY_WEIGHT: f64 = 0.4;
const OVERLAP_WEIGHT: f64 = 0.4;
const TOP_OVERLAP_WEIGHT: f64 = 0.2;

const MIN_DIVERSIFIED: usize = 5;
const MAX_MANAGEABLE: usize = 30;
const CONCENTRATION_LIMIT_PCT: f64 = 40.0;
const MAX_IDEAS: usize = 3;

pub struct MatchingUseCase {
    investors: Arc<dyn InvestorRepository>,
    holdings: Arc<dyn HoldingRepository>,
    normalizer: Arc<ExposureNormalizer>,
    calculator: Arc<dyn SimilarityCalculator>,
}

/// Trim and uppercase tickers, summing duplicates. Rejects blank tickers and
/// non-finite weights.
pub fn validate_portfolio(portfolio: &RawPortfolio) -> Result<RawPortfolio, DomainError> {
    if portfolio.is_empty() {
        return Err(DomainError::Validation("Portfolio is empty".into()));
    }
    let mut cleaned = RawPortfolio::with_capacity(portfolio.len());
    for (ticker, weight) in portfolio {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(DomainError::Validation("Portfolio contains a blank ticker".into()));
        }
        if !weight.is_finite() {
            return Err(DomainError::Validation(format!("Weight for {ticker} is not a number")));
        }
        *cleaned.entry(ticker).or_insert(0.0) += weight;
    }
    Ok(cleaned)
}

impl MatchingUseCase {
    pub fn new(
        investors: Arc<dyn InvestorRepository>,
        holdings: Arc<dyn HoldingRepository>,
        normalizer: Arc<ExposureNormalizer>,
        calculator: Arc<dyn SimilarityCalculator>,
    ) -> Self {
        Self {
            investors,
            holdings,
            normalizer,
            calculator,
        }
    }

    /// Best three investor matches for a `ticker → weight (percent)` portfolio.
    ///
    /// Investors without usable holdings are left out rather than failing the request.
    pub fn find_top_matches(&self, portfolio: &RawPortfolio) -> Result<Vec<MatchResult>, DomainError> {
        let user_raw = validate_portfolio(portfolio)?;
        let user = self.normalizer.normalize(&user_raw, NormalizationMode::LongOnly);
        if user.is_empty() {
            return Err(DomainError::Validation(
                "Portfolio has no positive exposure after netting leveraged products".into(),
            ));
        }

        let mut results = Vec::new();
        for profile in self.investors.list_active()? {
            match self.score_investor(&profile, &user_raw, &user) {
                Ok(Some(result)) => results.push(result),
                Ok(None) => debug!(investor = %profile.investor_id, "no usable holdings, excluded"),
                Err(e) => warn!(investor = %profile.investor_id, error = %e, "matching failed, excluded"),
            }
        }

        results.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.investor_id.cmp(&b.investor_id))
        });
        results.truncate(MAX_RESULTS);

        for (rank, r) in results.iter().enumerate() {
            info!(rank = rank + 1, investor = %r.investor_id, score = r.composite_score, "match");
        }
        Ok(results)
    }

    fn score_investor(
        &self,
        profile: &InvestorProfile,
        user_raw: &RawPortfolio,
        user: &ExposureMap,
    ) -> Result<Option<MatchResult>, DomainError> {
        let holdings = self.holdings.latest_holdings(&profile.investor_id)?;
        if holdings.is_empty() {
            return Ok(None);
        }

        let mut merged = RawPortfolio::new();
        for h in &holdings {
            *merged.entry(h.ticker.clone()).or_insert(0.0) += h.portfolio_weight_pct;
        }
        let investor = self.normalizer.normalize(&merged, NormalizationMode::LongOnly);
        if investor.is_empty() {
            return Ok(None);
        }

        let similarity = self.calculator.calculate(user, &investor)?;

        let matched_tickers: Vec<String> = user
            .ranked()
            .into_iter()
            .filter(|(t, _)| investor.contains(t))
            .map(|(t, _)| t.to_string())
            .collect();
        let overlap_pct = 100.0 * matched_tickers.len() as f64 / user.len() as f64;

        let top_hits = user
            .top_tickers(TOP_N)
            .into_iter()
            .filter(|t| investor.contains(t))
            .count();
        let top_overlap = top_hits as f64 * (100.0 / TOP_N as f64);

        let composite = SIMILARITY_WEIGHT * similarity
            + OVERLAP_WEIGHT * overlap_pct
            + TOP_OVERLAP_WEIGHT * top_overlap;

        debug!(
            investor = %profile.investor_id,
            similarity,
            overlap_pct,
            top_overlap,
            composite,
            "scored investor"
        );

        Ok(Some(MatchResult {
            investor_id: profile.investor_id.clone(),
            investor_name: profile.name.clone(),
            composite_score: composite,
            similarity_score: similarity,
            top_overlap_score: top_overlap,
            matched_tickers,
            overlap_pct,
            philosophy: profile.philosophy.clone(),
            strengths: profile.strengths.clone(),
            weaknesses: profile.weaknesses.clone(),
            suggestions: suggestions(&profile.name, user_raw, user, &investor),
            total_holdings: holdings.len(),
        }))
    }
}

/// Bullet-point advice, one line per triggered rule.
fn suggestions(investor_name: &str, user_raw: &RawPortfolio, user: &ExposureMap, investor: &ExposureMap) -> String {
    let mut lines = Vec::new();

    let count = user_raw.len();
    if count < MIN_DIVERSIFIED {
        lines.push(format!(
            "• Only {count} ticker(s) held. Consider diversifying into 10 or more positions."
        ));
    } else if count > MAX_MANAGEABLE {
        lines.push(format!(
            "• {count} tickers held. A portfolio this wide can be hard to manage."
        ));
    }

    if let Some(max) = user.max_weight() {
        let max_pct = max * 100.0;
        if max_pct > CONCENTRATION_LIMIT_PCT {
            lines.push(format!(
                "• Largest position is {max_pct:.0}% of the portfolio. Consider spreading the risk."
            ));
        }
    }

    let ideas: Vec<&str> = investor
        .ranked()
        .into_iter()
        .map(|(t, _)| t)
        .filter(|t| !user.contains(t) && !user_raw.contains_key(*t))
        .take(MAX_IDEAS)
        .collect();
    if !ideas.is_empty() {
        lines.push(format!("• Key holdings of {investor_name} to consider: {}", ideas.join(", ")));
    }

    lines.join("\n")
}
