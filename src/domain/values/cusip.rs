use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 9-character CUSIP security identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cusip(String);

impl Cusip {
    pub const LEN: usize = 9;

    pub fn new(value: &str) -> Result<Self, DomainError> {
        let len = value.chars().count();
        if len != Self::LEN {
            return Err(DomainError::Validation(format!(
                "CUSIP must be exactly {} characters, got {len} ('{value}')",
                Self::LEN
            )));
        }
        Ok(Cusip(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cusip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
