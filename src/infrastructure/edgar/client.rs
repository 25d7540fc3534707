//! SEC EDGAR access: submissions feed, filing index and 13F documents.
//!
//! Every request goes through the shared [`RequestPacer`].

use super::pacer::RequestPacer;
use crate::application::filing_document::looks_like_html;
use crate::config::Settings;
use crate::domain::error::DomainError;
use crate::domain::ports::filing_source::{FilingRef, FilingSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const FORMS_13F: &[&str] = &["13F-HR", "13F-HR/A"];

pub struct EdgarClient {
    client: Client,
    pacer: Arc<RequestPacer>,
    submissions_url: String,
    archives_url: String,
}

#[derive(Debug, Deserialize)]
struct Submissions {
    filings: SubmissionFilings,
}

#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    recent: RecentFilings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    primary_document: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FilingIndex {
    directory: IndexDirectory,
}

#[derive(Debug, Deserialize)]
struct IndexDirectory {
    #[serde(default)]
    item: Vec<IndexItem>,
}

#[derive(Debug, Deserialize)]
struct IndexItem {
    name: String,
    /// EDGAR serves this as a string, sometimes empty.
    #[serde(default)]
    size: serde_json::Value,
}

impl IndexItem {
    fn size_bytes(&self) -> u64 {
        match &self.size {
            serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
            serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// The newest 13F entry of a submissions feed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecentFiling {
    pub accession_number: String,
    pub form: String,
    pub filing_date: NaiveDate,
    pub report_date: Option<NaiveDate>,
    pub primary_document: Option<String>,
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Find the most recent 13F-HR or 13F-HR/A in a submissions feed body.
pub(crate) fn latest_13f(body: &str) -> Result<Option<RecentFiling>, DomainError> {
    let submissions: Submissions = serde_json::from_str(body)
        .map_err(|e| DomainError::Parse(format!("Invalid submissions feed: {e}")))?;
    let recent = submissions.filings.recent;

    let mut best: Option<RecentFiling> = None;
    for (i, form) in recent.form.iter().enumerate() {
        if !FORMS_13F.contains(&form.trim()) {
            continue;
        }
        let (Some(accession), Some(filing_date)) = (
            recent.accession_number.get(i),
            recent.filing_date.get(i).and_then(|d| parse_iso_date(d)),
        ) else {
            continue;
        };
        // Feed order is newest first; only a strictly later date displaces the current pick.
        if best.as_ref().is_some_and(|b| b.filing_date >= filing_date) {
            continue;
        }
        best = Some(RecentFiling {
            accession_number: accession.clone(),
            form: form.trim().to_string(),
            filing_date,
            report_date: recent.report_date.get(i).and_then(|d| parse_iso_date(d)),
            primary_document: recent
                .primary_document
                .get(i)
                .filter(|d| !d.trim().is_empty())
                .cloned(),
        });
    }
    Ok(best)
}

/// Name of the largest `.xml` document in a filing's `index.json`.
pub(crate) fn largest_xml_document(body: &str) -> Result<Option<String>, DomainError> {
    let index: FilingIndex = serde_json::from_str(body)
        .map_err(|e| DomainError::Parse(format!("Invalid filing index: {e}")))?;
    Ok(index
        .directory
        .item
        .into_iter()
        .filter(|item| item.name.to_ascii_lowercase().ends_with(".xml"))
        .max_by_key(|item| item.size_bytes())
        .map(|item| item.name))
}

impl EdgarClient {
    pub fn new(settings: &Settings, pacer: Arc<RequestPacer>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(settings.edgar_user_agent.clone())
                .connect_timeout(settings.connect_timeout)
                .timeout(settings.request_timeout)
                .build()
                .unwrap_or_default(),
            pacer,
            submissions_url: settings.submissions_url.trim_end_matches('/').to_string(),
            archives_url: settings.archives_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, DomainError> {
        self.pacer.wait().await;
        debug!(url, "EDGAR request");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::Network(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DomainError::from_status(status.as_u16(), &format!("GET {url}")));
        }
        resp.text()
            .await
            .map_err(|e| DomainError::Network(format!("Reading {url}: {e}")))
    }

    /// Fetch a body that must be JSON, refusing HTML error pages.
    async fn get_json_text(&self, url: &str) -> Result<String, DomainError> {
        let body = self.get_text(url).await?;
        if looks_like_html(&body) {
            return Err(DomainError::NonMachineReadable(format!("GET {url} returned HTML")));
        }
        Ok(body)
    }

    fn archive_dir(&self, cik: &str, accession_number: &str) -> String {
        let cik = cik.trim().trim_start_matches('0');
        let cik = if cik.is_empty() { "0" } else { cik };
        format!("{}/{}/{}", self.archives_url, cik, accession_number.replace('-', ""))
    }
}

#[async_trait]
impl FilingSource for EdgarClient {
    async fn discover(&self, cik: &str) -> Result<Option<FilingRef>, DomainError> {
        let url = format!("{}/CIK{:0>10}.json", self.submissions_url, cik.trim());
        let body = self.get_json_text(&url).await?;
        let Some(filing) = latest_13f(&body)? else {
            return Ok(None);
        };

        let dir = self.archive_dir(cik, &filing.accession_number);
        let index_body = self.get_json_text(&format!("{dir}/index.json")).await?;
        let document = match largest_xml_document(&index_body)? {
            Some(name) => name,
            None => filing
                .primary_document
                .clone()
                .filter(|d| d.to_ascii_lowercase().ends_with(".xml"))
                .ok_or_else(|| {
                    DomainError::Parse(format!(
                        "Filing {} has no XML document",
                        filing.accession_number
                    ))
                })?,
        };

        Ok(Some(FilingRef {
            cik: cik.trim().to_string(),
            accession_number: filing.accession_number,
            form: filing.form,
            filing_date: filing.filing_date,
            report_date: filing.report_date,
            document_url: format!("{dir}/{document}"),
        }))
    }

    async fn fetch_document(&self, filing: &FilingRef) -> Result<String, DomainError> {
        self.get_text(&filing.document_url).await
    }
}
