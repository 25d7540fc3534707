use super::conversion_error;
use crate::domain::entities::checkpoint::IngestionCheckpoint;
use crate::domain::error::DomainError;
use crate::domain::ports::checkpoint_repository::CheckpointRepository;
use crate::domain::values::checkpoint_status::CheckpointStatus;
use crate::domain::values::filing_quarter::FilingQuarter;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

const CHECKPOINT_COLUMNS: &str =
    "investor_id, filing_quarter, status, retry_count, fail_reason, started_at, completed_at, holdings_count";

pub struct SqliteCheckpointRepo {
    conn: Mutex<Connection>,
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

impl SqliteCheckpointRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_checkpoint(row: &rusqlite::Row) -> Result<IngestionCheckpoint, rusqlite::Error> {
        let quarter_str: String = row.get(1)?;
        let status_str: String = row.get(2)?;
        let holdings_count: Option<i64> = row.get(7)?;
        Ok(IngestionCheckpoint {
            investor_id: row.get(0)?,
            filing_quarter: quarter_str
                .parse()
                .map_err(|e: String| conversion_error(1, e))?,
            status: status_str
                .parse()
                .map_err(|e: String| conversion_error(2, e))?,
            retry_count: row.get(3)?,
            fail_reason: row.get(4)?,
            started_at: parse_timestamp(row.get(5)?),
            completed_at: parse_timestamp(row.get(6)?),
            holdings_count: holdings_count.map(|n| n.max(0) as usize),
        })
    }

    fn find_locked(
        conn: &Connection,
        investor_id: &str,
        quarter: FilingQuarter,
    ) -> Result<Option<IngestionCheckpoint>, DomainError> {
        conn.query_row(
            &format!(
                "SELECT {CHECKPOINT_COLUMNS} FROM ingestion_checkpoints
                 WHERE investor_id = ?1 AND filing_quarter = ?2"
            ),
            params![investor_id, quarter.to_string()],
            Self::row_to_checkpoint,
        )
        .optional()
        .map_err(|e| DomainError::Database(e.to_string()))
    }
}

impl CheckpointRepository for SqliteCheckpointRepo {
    fn find(&self, investor_id: &str, quarter: FilingQuarter) -> Result<Option<IngestionCheckpoint>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Self::find_locked(&conn, investor_id, quarter)
    }

    fn start_attempt(&self, investor_id: &str, quarter: FilingQuarter) -> Result<IngestionCheckpoint, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO ingestion_checkpoints (investor_id, filing_quarter, status, retry_count, started_at)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT(investor_id, filing_quarter) DO UPDATE SET
                 status = excluded.status,
                 retry_count = retry_count + 1,
                 fail_reason = NULL,
                 started_at = excluded.started_at,
                 completed_at = NULL,
                 holdings_count = NULL",
            params![
                investor_id,
                quarter.to_string(),
                CheckpointStatus::InProgress.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to start checkpoint: {e}")))?;

        Self::find_locked(&conn, investor_id, quarter)?.ok_or_else(|| {
            DomainError::NotFound(format!("Checkpoint vanished: {investor_id} {quarter}"))
        })
    }

    fn finish(
        &self,
        investor_id: &str,
        quarter: FilingQuarter,
        status: CheckpointStatus,
        holdings_count: Option<usize>,
        fail_reason: Option<&str>,
    ) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = conn
            .execute(
                "UPDATE ingestion_checkpoints
                 SET status = ?1, holdings_count = ?2, fail_reason = ?3, completed_at = ?4
                 WHERE investor_id = ?5 AND filing_quarter = ?6",
                params![
                    status.to_string(),
                    holdings_count.map(|n| n as i64),
                    fail_reason,
                    Utc::now().to_rfc3339(),
                    investor_id,
                    quarter.to_string(),
                ],
            )
            .map_err(|e| DomainError::Database(format!("Failed to finish checkpoint: {e}")))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!(
                "Checkpoint not found: {investor_id} {quarter}"
            )));
        }
        Ok(())
    }

    fn list_by_status(&self, status: CheckpointStatus) -> Result<Vec<IngestionCheckpoint>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CHECKPOINT_COLUMNS} FROM ingestion_checkpoints
                 WHERE status = ?1 ORDER BY investor_id, filing_quarter"
            ))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let checkpoints = stmt
            .query_map(params![status.to_string()], Self::row_to_checkpoint)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(checkpoints)
    }

    fn delete_for_investor(&self, investor_id: &str) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "DELETE FROM ingestion_checkpoints WHERE investor_id = ?1",
            params![investor_id],
        )
        .map_err(|e| DomainError::Database(format!("Failed to delete checkpoints: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::open_connection;

    #[test]
    fn test_attempts_reuse_row() {
        let repo = SqliteCheckpointRepo::new(open_connection(":memory:").unwrap());
        let q = FilingQuarter::new(2024, 4).unwrap();

        let first = repo.start_attempt("ark", q).unwrap();
        assert_eq!(first.status, CheckpointStatus::InProgress);
        assert_eq!(first.retry_count, 1);
        repo.finish("ark", q, CheckpointStatus::Failed, None, Some("boom")).unwrap();

        let failed = repo.find("ark", q).unwrap().unwrap();
        assert_eq!(failed.fail_reason.as_deref(), Some("boom"));
        assert!(failed.completed_at.is_some());

        let second = repo.start_attempt("ark", q).unwrap();
        assert_eq!(second.retry_count, 2);
        assert_eq!(second.fail_reason, None);
        repo.finish("ark", q, CheckpointStatus::Success, Some(12), None).unwrap();

        let done = repo.find("ark", q).unwrap().unwrap();
        assert!(done.is_success());
        assert_eq!(done.holdings_count, Some(12));
        assert_eq!(repo.list_by_status(CheckpointStatus::Success).unwrap().len(), 1);
        assert!(repo.list_by_status(CheckpointStatus::Failed).unwrap().is_empty());
    }

    #[test]
    fn test_finish_without_start() {
        let repo = SqliteCheckpointRepo::new(open_connection(":memory:").unwrap());
        let q = FilingQuarter::new(2024, 4).unwrap();
        assert!(matches!(
            repo.finish("ghost", q, CheckpointStatus::Success, Some(1), None),
            Err(DomainError::NotFound(_))
        ));
    }
}
