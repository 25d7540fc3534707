use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointStatus {
    InProgress,
    Success,
    Skipped,
    Failed,
}

impl CheckpointStatus {
    /// Whether an attempt has finished (any status other than in-progress).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckpointStatus::InProgress)
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointStatus::InProgress => write!(f, "IN_PROGRESS"),
            CheckpointStatus::Success => write!(f, "SUCCESS"),
            CheckpointStatus::Skipped => write!(f, "SKIPPED"),
            CheckpointStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for CheckpointStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => Ok(CheckpointStatus::InProgress),
            "SUCCESS" => Ok(CheckpointStatus::Success),
            "SKIPPED" => Ok(CheckpointStatus::Skipped),
            "FAILED" => Ok(CheckpointStatus::Failed),
            _ => Err(format!("Unknown checkpoint status: {s}")),
        }
    }
}
