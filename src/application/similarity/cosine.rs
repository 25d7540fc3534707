use crate::domain::error::DomainError;
use crate::domain::ports::similarity::SimilarityCalculator;
use crate::domain::values::exposure::ExposureMap;
use std::collections::BTreeSet;

/// Cosine similarity over the union of tickers, scaled to 0–100.
///
/// Negative values (possible with long-short maps) are clamped to 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosineSimilarity;

impl SimilarityCalculator for CosineSimilarity {
    fn calculate(&self, a: &ExposureMap, b: &ExposureMap) -> Result<f64, DomainError> {
        if a.is_empty() || b.is_empty() {
            return Err(DomainError::Validation(
                "Cannot compare an empty portfolio".into(),
            ));
        }

        let tickers: BTreeSet<&str> = a.tickers().chain(b.tickers()).collect();
        let (mut dot, mut mag_a, mut mag_b) = (0.0, 0.0, 0.0);
        for ticker in tickers {
            let wa = a.get(ticker).unwrap_or(0.0);
            let wb = b.get(ticker).unwrap_or(0.0);
            dot += wa * wb;
            mag_a += wa * wa;
            mag_b += wb * wb;
        }

        if mag_a == 0.0 || mag_b == 0.0 {
            return Ok(0.0);
        }
        let score = 100.0 * dot / (mag_a.sqrt() * mag_b.sqrt());
        Ok(score.clamp(0.0, 100.0))
    }

    fn name(&self) -> &str {
        "cosine"
    }
}
