use crate::domain::entities::investor::InvestorProfile;
use crate::domain::error::DomainError;

pub trait InvestorRepository: Send + Sync {
    fn upsert(&self, profile: &InvestorProfile) -> Result<(), DomainError>;
    fn get(&self, investor_id: &str) -> Result<Option<InvestorProfile>, DomainError>;
    /// Active investors ordered by investor_id.
    fn list_active(&self) -> Result<Vec<InvestorProfile>, DomainError>;
}
