use crate::domain::error::DomainError;
use crate::domain::values::exposure::ExposureMap;

/// Scores how alike two exposure maps are, from 0 (nothing shared) to 100.
pub trait SimilarityCalculator: Send + Sync {
    /// Both maps must be non-empty; otherwise `DomainError::Validation`.
    fn calculate(&self, a: &ExposureMap, b: &ExposureMap) -> Result<f64, DomainError>;

    fn name(&self) -> &str;
}
