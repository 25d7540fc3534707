use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    /// Timeouts, connection failures, 429 and 5xx responses.
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// An HTML page came back where JSON or XML was expected.
    #[error("Non-machine-readable response: {0}")]
    NonMachineReadable(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Classify an HTTP status that was not a success.
    pub fn from_status(status: u16, context: &str) -> Self {
        if status == 429 || (500..600).contains(&status) {
            DomainError::Network(format!("{context} returned {status}"))
        } else {
            DomainError::Http {
                status,
                message: context.to_string(),
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Network(_))
    }

    /// Error text cut to at most `max` characters, for checkpoint fail reasons.
    pub fn summary(&self, max: usize) -> String {
        let text = self.to_string();
        if text.chars().count() <= max {
            text
        } else {
            text.chars().take(max).collect()
        }
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Database(e.to_string())
    }
}
