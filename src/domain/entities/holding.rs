use crate::domain::values::filing_quarter::FilingQuarter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One resolved position from an investor's quarterly filing.
///
/// Rows are written once per (investor, quarter) and never updated; a later
/// quarter supersedes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: String,
    pub investor_id: String,
    pub ticker: String,
    pub company_name: String,
    pub cusip: String,
    pub shares: i64,
    /// Reported market value in US dollars.
    pub market_value: f64,
    /// Share of the filing's total reported value, in percent, rounded to 2 decimals.
    pub portfolio_weight_pct: f64,
    pub filing_quarter: FilingQuarter,
    pub filing_date: NaiveDate,
    pub source_url: String,
}

impl Holding {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        investor_id: String,
        ticker: String,
        company_name: String,
        cusip: String,
        shares: i64,
        market_value: f64,
        portfolio_weight_pct: f64,
        filing_quarter: FilingQuarter,
        filing_date: NaiveDate,
        source_url: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            investor_id,
            ticker,
            company_name,
            cusip,
            shares,
            market_value,
            portfolio_weight_pct,
            filing_quarter,
            filing_date,
            source_url,
        }
    }
}
