use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS investors (
            investor_id TEXT PRIMARY KEY,
            cik TEXT NOT NULL,
            name TEXT NOT NULL,
            name_en TEXT,
            organization TEXT,
            philosophy TEXT,
            strengths TEXT,
            weaknesses TEXT,
            investment_style TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS holdings (
            id TEXT PRIMARY KEY,
            investor_id TEXT NOT NULL,
            ticker TEXT NOT NULL,
            company_name TEXT NOT NULL,
            cusip TEXT NOT NULL,
            shares INTEGER NOT NULL,
            market_value REAL NOT NULL,
            portfolio_weight_pct REAL NOT NULL,
            filing_quarter TEXT NOT NULL,
            filing_date TEXT NOT NULL,
            source_url TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ingestion_checkpoints (
            investor_id TEXT NOT NULL,
            filing_quarter TEXT NOT NULL,
            status TEXT NOT NULL,
            retry_count INTEGER NOT NULL DEFAULT 0,
            fail_reason TEXT,
            started_at TEXT,
            completed_at TEXT,
            holdings_count INTEGER,
            PRIMARY KEY (investor_id, filing_quarter)
        );

        CREATE INDEX IF NOT EXISTS idx_holdings_investor_quarter ON holdings(investor_id, filing_quarter);
        CREATE INDEX IF NOT EXISTS idx_holdings_ticker ON holdings(ticker);
        CREATE INDEX IF NOT EXISTS idx_checkpoints_status ON ingestion_checkpoints(status);
        ",
    )
    .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
