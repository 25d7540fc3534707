//! Shared test helpers: in-memory facade, fake EDGAR and fake mapping API.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use holdingsmatch::config::Settings;
use holdingsmatch::domain::entities::investor::InvestorProfile;
use holdingsmatch::domain::error::DomainError;
use holdingsmatch::domain::ports::filing_source::{FilingRef, FilingSource};
use holdingsmatch::domain::ports::mapping_api::{MappingApi, MappingReply};
use holdingsmatch::HoldingsMatch;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_settings() -> Settings {
    Settings {
        resolver_backoff: Duration::from_millis(1),
        request_interval: Duration::ZERO,
        ingest_concurrency: 2,
        ..Settings::default()
    }
}

pub fn setup(source: Arc<FakeFilingSource>, api: Arc<ScriptedMappingApi>) -> HoldingsMatch {
    setup_at(":memory:", source, api, test_settings())
}

pub fn setup_at(
    db_path: &str,
    source: Arc<FakeFilingSource>,
    api: Arc<ScriptedMappingApi>,
    settings: Settings,
) -> HoldingsMatch {
    init_tracing();
    HoldingsMatch::with_providers(db_path, source, api, settings).unwrap()
}

pub fn add_investor(hm: &HoldingsMatch, id: &str, cik: &str, name: &str) -> InvestorProfile {
    let profile = InvestorProfile::new(id, cik, name).unwrap();
    hm.upsert_investor(&profile).unwrap();
    profile
}

/// An information-table document with `(issuer, cusip, value, shares)` rows.
pub fn info_table(rows: &[(&str, &str, f64, i64)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<informationTable xmlns="http://www.sec.gov/edgar/document/thirteenf/informationtable">"#,
    );
    for (issuer, cusip, value, shares) in rows {
        xml.push_str(&format!(
            "<infoTable><nameOfIssuer>{issuer}</nameOfIssuer><titleOfClass>COM</titleOfClass>\
             <cusip>{cusip}</cusip><value>{value}</value>\
             <shrsOrPrnAmt><sshPrnamt>{shares}</sshPrnamt><sshPrnamtType>SH</sshPrnamtType></shrsOrPrnAmt>\
             </infoTable>"
        ));
    }
    xml.push_str("</informationTable>");
    xml
}

pub enum FakeFiling {
    Document(String),
    NotFiled,
    DiscoverFails(u16),
}

/// EDGAR stand-in keyed by CIK. Counts calls so tests can assert no work was done.
pub struct FakeFilingSource {
    filings: Mutex<HashMap<String, FakeFiling>>,
    delay: Duration,
    pub discover_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeFilingSource {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            filings: Mutex::new(HashMap::new()),
            delay,
            discover_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, cik: &str, filing: FakeFiling) {
        self.filings.lock().unwrap().insert(cik.to_string(), filing);
    }

    pub fn discovers(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FilingSource for FakeFilingSource {
    async fn discover(&self, cik: &str) -> Result<Option<FilingRef>, DomainError> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let filings = self.filings.lock().unwrap();
        match filings.get(cik) {
            None | Some(FakeFiling::NotFiled) => Ok(None),
            Some(FakeFiling::DiscoverFails(status)) => Err(DomainError::from_status(*status, "submissions")),
            Some(FakeFiling::Document(_)) => Ok(Some(FilingRef {
                cik: cik.to_string(),
                accession_number: format!("{cik}-24-000040"),
                form: "13F-HR".into(),
                filing_date: NaiveDate::from_ymd_opt(2024, 11, 14).unwrap(),
                report_date: NaiveDate::from_ymd_opt(2024, 9, 30),
                document_url: format!("https://edgar.test/{cik}/infotable.xml"),
            })),
        }
    }

    async fn fetch_document(&self, filing: &FilingRef) -> Result<String, DomainError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let filings = self.filings.lock().unwrap();
        match filings.get(&filing.cik) {
            Some(FakeFiling::Document(body)) => Ok(body.clone()),
            _ => Err(DomainError::Http {
                status: 404,
                message: "document".into(),
            }),
        }
    }
}

#[derive(Clone)]
pub enum Reply {
    Status(u16, String),
    TransportError,
}

impl Reply {
    pub fn ticker(ticker: &str) -> Self {
        Reply::Status(200, format!(r#"[{{"data":[{{"ticker":"{ticker}"}}]}}]"#))
    }

    pub fn status(status: u16) -> Self {
        Reply::Status(status, String::new())
    }
}

/// Mapping API stand-in. Per-CUSIP scripts are consumed in order; once a
/// script runs out (or for unscripted CUSIPs) the default reply is used.
pub struct ScriptedMappingApi {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    default_reply: Reply,
    calls: AtomicUsize,
}

impl ScriptedMappingApi {
    pub fn new(default_reply: Reply) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_reply,
            calls: AtomicUsize::new(0),
        }
    }

    /// Unscripted CUSIPs get a 404, which sends the resolver to its fallback table.
    pub fn not_found() -> Self {
        Self::new(Reply::status(404))
    }

    pub fn script(&self, cusip: &str, replies: Vec<Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(cusip.to_string(), replies.into_iter().collect());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MappingApi for ScriptedMappingApi {
    async fn map_cusip(&self, cusip: &str) -> Result<MappingReply, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(cusip)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| self.default_reply.clone());
        match reply {
            Reply::Status(status, body) => Ok(MappingReply { status, body }),
            Reply::TransportError => Err(DomainError::Network("connection reset".into())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
