use super::conversion_error;
use crate::domain::entities::holding::Holding;
use crate::domain::error::DomainError;
use crate::domain::ports::holding_repository::{HoldingRepository, InsertOutcome};
use crate::domain::values::filing_quarter::FilingQuarter;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::Mutex;

const HOLDING_COLUMNS: &str = "id, investor_id, ticker, company_name, cusip, shares, market_value, \
     portfolio_weight_pct, filing_quarter, filing_date, source_url";

pub struct SqliteHoldingRepo {
    conn: Mutex<Connection>,
}

impl SqliteHoldingRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_holding(row: &rusqlite::Row) -> Result<Holding, rusqlite::Error> {
        let quarter_str: String = row.get(8)?;
        let date_str: String = row.get(9)?;
        Ok(Holding {
            id: row.get(0)?,
            investor_id: row.get(1)?,
            ticker: row.get(2)?,
            company_name: row.get(3)?,
            cusip: row.get(4)?,
            shares: row.get(5)?,
            market_value: row.get(6)?,
            portfolio_weight_pct: row.get(7)?,
            filing_quarter: quarter_str
                .parse()
                .map_err(|e: String| conversion_error(8, e))?,
            filing_date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| conversion_error(9, format!("Bad filing date '{date_str}': {e}")))?,
            source_url: row.get(10)?,
        })
    }

    fn count(conn: &Connection, investor_id: &str, quarter: FilingQuarter) -> Result<usize, DomainError> {
        let n: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM holdings WHERE investor_id = ?1 AND filing_quarter = ?2",
                params![investor_id, quarter.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(n as usize)
    }
}

impl HoldingRepository for SqliteHoldingRepo {
    fn insert_quarter(
        &self,
        investor_id: &str,
        quarter: FilingQuarter,
        holdings: &[Holding],
    ) -> Result<InsertOutcome, DomainError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Database(format!("Failed to begin transaction: {e}")))?;

        let existing = Self::count(&tx, investor_id, quarter)?;
        if existing > 0 {
            return Ok(InsertOutcome::AlreadyPresent(existing));
        }

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO holdings ({HOLDING_COLUMNS}, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ))
                .map_err(|e| DomainError::Database(e.to_string()))?;
            let created_at = chrono::Utc::now().to_rfc3339();
            for h in holdings {
                stmt.execute(params![
                    h.id,
                    investor_id,
                    h.ticker,
                    h.company_name,
                    h.cusip,
                    h.shares,
                    h.market_value,
                    h.portfolio_weight_pct,
                    quarter.to_string(),
                    h.filing_date.format("%Y-%m-%d").to_string(),
                    h.source_url,
                    created_at,
                ])
                .map_err(|e| DomainError::Database(format!("Failed to add holding {}: {e}", h.ticker)))?;
            }
        }

        tx.commit()
            .map_err(|e| DomainError::Database(format!("Failed to commit holdings: {e}")))?;
        Ok(InsertOutcome::Inserted(holdings.len()))
    }

    fn latest_holdings(&self, investor_id: &str) -> Result<Vec<Holding>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {HOLDING_COLUMNS} FROM holdings
                 WHERE investor_id = ?1
                   AND filing_quarter = (SELECT MAX(filing_quarter) FROM holdings WHERE investor_id = ?1)
                 ORDER BY portfolio_weight_pct DESC, ticker ASC"
            ))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let holdings = stmt
            .query_map(params![investor_id], Self::row_to_holding)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(holdings)
    }

    fn investors_holding(&self, ticker: &str) -> Result<Vec<String>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT h.investor_id FROM holdings h
                 WHERE h.ticker = ?1
                   AND h.filing_quarter = (
                       SELECT MAX(h2.filing_quarter) FROM holdings h2 WHERE h2.investor_id = h.investor_id
                   )
                 ORDER BY h.investor_id",
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let ids = stmt
            .query_map(params![ticker.trim().to_uppercase()], |row| row.get(0))
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn delete_for_investor(&self, investor_id: &str) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute("DELETE FROM holdings WHERE investor_id = ?1", params![investor_id])
            .map_err(|e| DomainError::Database(format!("Failed to delete holdings: {e}")))
    }
}
