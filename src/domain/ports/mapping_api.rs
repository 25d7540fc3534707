//! Identifier mapping API port (OpenFIGI-style).

use crate::domain::error::DomainError;
use async_trait::async_trait;

/// Raw reply from the mapping API. Status handling belongs to the caller so
/// that retry policy lives in one place.
#[derive(Debug, Clone)]
pub struct MappingReply {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait MappingApi: Send + Sync {
    /// Look up one CUSIP. Transport failures (timeouts, refused connections)
    /// come back as `DomainError::Network`.
    async fn map_cusip(&self, cusip: &str) -> Result<MappingReply, DomainError>;

    fn name(&self) -> &str;
}
