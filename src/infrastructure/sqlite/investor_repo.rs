use crate::domain::entities::investor::InvestorProfile;
use crate::domain::error::DomainError;
use crate::domain::ports::investor_repository::InvestorRepository;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

const INVESTOR_COLUMNS: &str = "investor_id, cik, name, name_en, organization, philosophy, strengths, \
     weaknesses, investment_style, active";

pub struct SqliteInvestorRepo {
    conn: Mutex<Connection>,
}

impl SqliteInvestorRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_profile(row: &rusqlite::Row) -> Result<InvestorProfile, rusqlite::Error> {
        let active: i64 = row.get(9)?;
        Ok(InvestorProfile {
            investor_id: row.get(0)?,
            cik: row.get(1)?,
            name: row.get(2)?,
            name_en: row.get(3)?,
            organization: row.get(4)?,
            philosophy: row.get(5)?,
            strengths: row.get(6)?,
            weaknesses: row.get(7)?,
            investment_style: row.get(8)?,
            active: active != 0,
        })
    }
}

impl InvestorRepository for SqliteInvestorRepo {
    fn upsert(&self, p: &InvestorProfile) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            &format!(
                "INSERT INTO investors ({INVESTOR_COLUMNS}, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
                 ON CONFLICT(investor_id) DO UPDATE SET
                     cik = excluded.cik,
                     name = excluded.name,
                     name_en = excluded.name_en,
                     organization = excluded.organization,
                     philosophy = excluded.philosophy,
                     strengths = excluded.strengths,
                     weaknesses = excluded.weaknesses,
                     investment_style = excluded.investment_style,
                     active = excluded.active,
                     updated_at = excluded.updated_at"
            ),
            params![
                p.investor_id,
                p.cik,
                p.name,
                p.name_en,
                p.organization,
                p.philosophy,
                p.strengths,
                p.weaknesses,
                p.investment_style,
                p.active as i64,
                now,
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to save investor: {e}")))?;
        Ok(())
    }

    fn get(&self, investor_id: &str) -> Result<Option<InvestorProfile>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.query_row(
            &format!("SELECT {INVESTOR_COLUMNS} FROM investors WHERE investor_id = ?1"),
            params![investor_id],
            Self::row_to_profile,
        )
        .optional()
        .map_err(|e| DomainError::Database(e.to_string()))
    }

    fn list_active(&self) -> Result<Vec<InvestorProfile>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {INVESTOR_COLUMNS} FROM investors WHERE active = 1 ORDER BY investor_id"
            ))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let profiles = stmt
            .query_map([], Self::row_to_profile)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }
}
