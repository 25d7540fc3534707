use crate::domain::entities::checkpoint::IngestionCheckpoint;
use crate::domain::error::DomainError;
use crate::domain::values::checkpoint_status::CheckpointStatus;
use crate::domain::values::filing_quarter::FilingQuarter;

pub trait CheckpointRepository: Send + Sync {
    fn find(&self, investor_id: &str, quarter: FilingQuarter) -> Result<Option<IngestionCheckpoint>, DomainError>;
    /// Create or reset the row to IN_PROGRESS and bump its attempt counter.
    fn start_attempt(&self, investor_id: &str, quarter: FilingQuarter) -> Result<IngestionCheckpoint, DomainError>;
    /// Record the terminal status of the current attempt.
    fn finish(
        &self,
        investor_id: &str,
        quarter: FilingQuarter,
        status: CheckpointStatus,
        holdings_count: Option<usize>,
        fail_reason: Option<&str>,
    ) -> Result<(), DomainError>;
    fn list_by_status(&self, status: CheckpointStatus) -> Result<Vec<IngestionCheckpoint>, DomainError>;
    fn delete_for_investor(&self, investor_id: &str) -> Result<usize, DomainError>;
}
