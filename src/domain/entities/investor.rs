use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};

/// Reference data for an institutional investor tracked through 13F filings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorProfile {
    /// Short stable key, e.g. "buffett".
    pub investor_id: String,
    /// SEC Central Index Key, digits only (leading zeros optional).
    pub cik: String,
    pub name: String,
    pub name_en: Option<String>,
    pub organization: Option<String>,
    pub philosophy: Option<String>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub investment_style: Option<String>,
    pub active: bool,
}

impl InvestorProfile {
    pub fn new(investor_id: &str, cik: &str, name: &str) -> Result<Self, DomainError> {
        if investor_id.trim().is_empty() {
            return Err(DomainError::Validation("investor_id must not be empty".into()));
        }
        let cik = cik.trim();
        if cik.is_empty() || cik.len() > 10 || !cik.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::Validation(format!(
                "CIK must be 1-10 digits, got '{cik}'"
            )));
        }
        Ok(Self {
            investor_id: investor_id.trim().to_string(),
            cik: cik.to_string(),
            name: name.to_string(),
            name_en: None,
            organization: None,
            philosophy: None,
            strengths: None,
            weaknesses: None,
            investment_style: None,
            active: true,
        })
    }
}
