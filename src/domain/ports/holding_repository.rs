use crate::domain::entities::holding::Holding;
use crate::domain::error::DomainError;
use crate::domain::values::filing_quarter::FilingQuarter;

/// Result of writing one investor's quarter of holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Rows were written; carries the number inserted.
    Inserted(usize),
    /// The quarter was already stored; nothing was written. Carries the stored count.
    AlreadyPresent(usize),
}

impl InsertOutcome {
    pub fn count(&self) -> usize {
        match self {
            InsertOutcome::Inserted(n) | InsertOutcome::AlreadyPresent(n) => *n,
        }
    }
}

pub trait HoldingRepository: Send + Sync {
    /// Write a full quarter for one investor in a single transaction.
    ///
    /// If any rows already exist for `(investor_id, quarter)` nothing is written.
    fn insert_quarter(
        &self,
        investor_id: &str,
        quarter: FilingQuarter,
        holdings: &[Holding],
    ) -> Result<InsertOutcome, DomainError>;
    /// Holdings of the investor's most recent stored quarter, heaviest first.
    fn latest_holdings(&self, investor_id: &str) -> Result<Vec<Holding>, DomainError>;
    /// Investor ids whose latest quarter contains `ticker`.
    fn investors_holding(&self, ticker: &str) -> Result<Vec<String>, DomainError>;
    fn delete_for_investor(&self, investor_id: &str) -> Result<usize, DomainError>;
}
