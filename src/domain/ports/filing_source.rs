//! Where quarterly 13F filings come from.

use crate::domain::error::DomainError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

/// A located 13F-HR (or amendment) ready to fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingRef {
    pub cik: String,
    pub accession_number: String,
    /// `13F-HR` or `13F-HR/A`.
    pub form: String,
    pub filing_date: NaiveDate,
    /// Period of report from the submissions feed, when present.
    pub report_date: Option<NaiveDate>,
    pub document_url: String,
}

#[async_trait]
pub trait FilingSource: Send + Sync {
    /// Most recent 13F-HR or 13F-HR/A for the CIK, or `None` if it has never filed one.
    async fn discover(&self, cik: &str) -> Result<Option<FilingRef>, DomainError>;

    /// Raw body of the filing's information table document.
    async fn fetch_document(&self, filing: &FilingRef) -> Result<String, DomainError>;
}
