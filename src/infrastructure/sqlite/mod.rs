pub mod checkpoint_repo;
pub mod holding_repo;
pub mod investor_repo;
pub mod migrations;

use crate::domain::error::DomainError;
use rusqlite::types::Type;
use rusqlite::Connection;
use std::time::Duration;

/// Open a connection with WAL and a busy timeout, schema applied.
///
/// Each `:memory:` connection is its own database, so every connection runs
/// the migrations rather than only the first.
pub fn open_connection(db_path: &str) -> Result<Connection, DomainError> {
    let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| DomainError::Database(format!("Busy timeout error: {e}")))?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Wrap a decoding failure of column `idx` as a rusqlite error.
pub(crate) fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(DomainError::Parse(message)))
}
