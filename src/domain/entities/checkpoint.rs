use crate::domain::values::checkpoint_status::CheckpointStatus;
use crate::domain::values::filing_quarter::FilingQuarter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted record of the latest ingestion attempt for an investor and quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionCheckpoint {
    pub investor_id: String,
    pub filing_quarter: FilingQuarter,
    pub status: CheckpointStatus,
    /// Number of attempts made against this row; 1 after the first attempt.
    pub retry_count: u32,
    pub fail_reason: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub holdings_count: Option<usize>,
}

impl IngestionCheckpoint {
    pub fn is_success(&self) -> bool {
        self.status == CheckpointStatus::Success
    }
}
