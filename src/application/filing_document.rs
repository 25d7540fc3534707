//! Decoding of 13F information-table XML.
//!
//! Elements are matched by local name so that both default-namespace and
//! prefixed (`ns1:infoTable`) documents decode the same way. Documents that
//! carry a DOCTYPE are rejected outright; entities are never expanded beyond
//! the five predefined XML ones.

use crate::domain::error::DomainError;
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;

/// One `<infoTable>` row as reported, before identifier resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoTableRow {
    pub issuer: String,
    pub cusip: String,
    /// Reported market value in dollars.
    pub value: f64,
    pub shares: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilingDocument {
    /// Calendar date the report covers, from the cover page when present.
    pub period_of_report: Option<NaiveDate>,
    pub rows: Vec<InfoTableRow>,
}

impl FilingDocument {
    /// Sum of every non-zero reported value.
    pub fn total_value(&self) -> f64 {
        self.rows.iter().map(|r| r.value).filter(|v| *v != 0.0).sum()
    }
}

/// Whether a response body is an HTML page rather than data.
pub fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(16).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

#[derive(Default)]
struct RowBuilder {
    issuer: String,
    cusip: String,
    value: String,
    shares: String,
}

impl RowBuilder {
    fn build(self) -> Result<InfoTableRow, DomainError> {
        Ok(InfoTableRow {
            issuer: self.issuer.trim().to_string(),
            cusip: self.cusip.trim().to_uppercase(),
            value: parse_number(&self.value, "value")?,
            shares: parse_number(&self.shares, "sshPrnamt")?.round() as i64,
        })
    }
}

fn parse_number(raw: &str, field: &str) -> Result<f64, DomainError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DomainError::Parse(format!("Invalid {field} '{raw}' in information table")))
}

/// Parse the `MM-DD-YYYY` dates used on 13F cover pages (ISO dates also accepted).
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%m-%d-%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

pub fn parse_filing_document(xml: &str) -> Result<FilingDocument, DomainError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = FilingDocument::default();
    let mut calendar_quarter: Option<NaiveDate> = None;
    let mut period_of_report: Option<NaiveDate> = None;
    let mut row: Option<RowBuilder> = None;
    let mut current: Vec<u8> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            DomainError::Parse(format!(
                "Malformed XML at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::DocType(_) => {
                return Err(DomainError::Parse("DOCTYPE declarations are not accepted".into()));
            }
            Event::Start(e) => {
                let name = e.local_name();
                if name.as_ref() == b"infoTable" {
                    row = Some(RowBuilder::default());
                }
                current = name.as_ref().to_vec();
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"infoTable" {
                    if let Some(done) = row.take() {
                        doc.rows.push(done.build()?);
                    }
                }
                current.clear();
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| DomainError::Parse(format!("Bad text content: {e}")))?;
                apply_text(&current, &text, &mut row, &mut calendar_quarter, &mut period_of_report);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                apply_text(&current, &text, &mut row, &mut calendar_quarter, &mut period_of_report);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    doc.period_of_report = calendar_quarter.or(period_of_report);
    Ok(doc)
}

fn apply_text(
    element: &[u8],
    text: &str,
    row: &mut Option<RowBuilder>,
    calendar_quarter: &mut Option<NaiveDate>,
    period_of_report: &mut Option<NaiveDate>,
) {
    match (element, row.as_mut()) {
        (b"nameOfIssuer", Some(r)) => r.issuer.push_str(text),
        (b"cusip", Some(r)) => r.cusip.push_str(text),
        (b"value", Some(r)) => r.value.push_str(text),
        (b"sshPrnamt", Some(r)) => r.shares.push_str(text),
        (b"reportCalendarOrQuarter", _) => *calendar_quarter = parse_report_date(text),
        (b"periodOfReport", _) => *period_of_report = parse_report_date(text),
        _ => {}
    }
}
