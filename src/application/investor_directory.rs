use crate::domain::entities::investor::InvestorProfile;
use crate::domain::error::DomainError;
use crate::domain::ports::investor_repository::InvestorRepository;
use std::sync::Arc;
use tracing::info;

/// (investor_id, CIK, name, organization, style, philosophy)
const DEFAULT_INVESTORS: &[(&str, &str, &str, &str, &str, &str)] = &[
    (
        "buffett",
        "0001067983",
        "Warren Buffett",
        "Berkshire Hathaway",
        "Value",
        "Buy wonderful businesses at fair prices and hold them for decades.",
    ),
    (
        "wood",
        "0001697748",
        "Cathie Wood",
        "ARK Investment Management",
        "Disruptive growth",
        "Concentrate on platforms of disruptive innovation with five-year horizons.",
    ),
    (
        "dalio",
        "0001350694",
        "Ray Dalio",
        "Bridgewater Associates",
        "Global macro",
        "Balance risk across economic environments rather than predicting them.",
    ),
    (
        "soros",
        "0001029160",
        "George Soros",
        "Soros Fund Management",
        "Global macro",
        "Markets are reflexive; bet heavily when the prevailing bias breaks.",
    ),
    (
        "ackman",
        "0001336528",
        "Bill Ackman",
        "Pershing Square Capital Management",
        "Activist",
        "Own a handful of simple, predictable, cash-generative businesses and push for change.",
    ),
    (
        "burry",
        "0001649339",
        "Michael Burry",
        "Scion Asset Management",
        "Contrarian value",
        "Dig into neglected securities and take positions against the crowd.",
    ),
    (
        "druckenmiller",
        "0001536411",
        "Stanley Druckenmiller",
        "Duquesne Family Office",
        "Macro",
        "Follow liquidity and size up aggressively when conviction is high.",
    ),
    (
        "tepper",
        "0001656456",
        "David Tepper",
        "Appaloosa Management",
        "Distressed value",
        "Buy when fear is greatest, from distressed debt to beaten-down equities.",
    ),
];

/// Investor reference data: lookup, maintenance and the built-in seed list.
pub struct InvestorDirectory {
    repo: Arc<dyn InvestorRepository>,
}

impl InvestorDirectory {
    pub fn new(repo: Arc<dyn InvestorRepository>) -> Self {
        Self { repo }
    }

    pub fn upsert(&self, profile: &InvestorProfile) -> Result<(), DomainError> {
        // Re-validate: callers may have built the struct directly.
        InvestorProfile::new(&profile.investor_id, &profile.cik, &profile.name)?;
        self.repo.upsert(profile)
    }

    pub fn get(&self, investor_id: &str) -> Result<Option<InvestorProfile>, DomainError> {
        self.repo.get(investor_id)
    }

    pub fn list_active(&self) -> Result<Vec<InvestorProfile>, DomainError> {
        self.repo.list_active()
    }

    /// Insert the well-known 13F filers that are not stored yet. Returns how many were added.
    pub fn seed_defaults(&self) -> Result<usize, DomainError> {
        let mut added = 0;
        for (id, cik, name, org, style, philosophy) in DEFAULT_INVESTORS {
            if self.repo.get(id)?.is_some() {
                continue;
            }
            let mut profile = InvestorProfile::new(id, cik, name)?;
            profile.name_en = Some(name.to_string());
            profile.organization = Some(org.to_string());
            profile.investment_style = Some(style.to_string());
            profile.philosophy = Some(philosophy.to_string());
            self.repo.upsert(&profile)?;
            added += 1;
        }
        if added > 0 {
            info!(added, "seeded default investors");
        }
        Ok(added)
    }
}
