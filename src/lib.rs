pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::identifier_resolver::{IdentifierCache, IdentifierResolver};
use crate::application::ingest::{IngestOutcome, IngestReport, IngestUseCase};
use crate::application::investor_directory::InvestorDirectory;
use crate::application::leveraged_registry::LeveragedProductRegistry;
use crate::application::matching::MatchingUseCase;
use crate::application::normalize::ExposureNormalizer;
use crate::application::similarity::CosineSimilarity;
use crate::config::Settings;
use crate::domain::entities::checkpoint::IngestionCheckpoint;
use crate::domain::entities::holding::Holding;
use crate::domain::entities::investor::InvestorProfile;
use crate::domain::entities::match_result::MatchResult;
use crate::domain::error::DomainError;
use crate::domain::ports::checkpoint_repository::CheckpointRepository;
use crate::domain::ports::filing_source::FilingSource;
use crate::domain::ports::holding_repository::HoldingRepository;
use crate::domain::ports::investor_repository::InvestorRepository;
use crate::domain::ports::mapping_api::MappingApi;
use crate::domain::ports::similarity::SimilarityCalculator;
use crate::domain::values::checkpoint_status::CheckpointStatus;
use crate::domain::values::exposure::{ExposureMap, RawPortfolio};
use crate::domain::values::filing_quarter::FilingQuarter;
use crate::domain::values::normalization_mode::NormalizationMode;
use crate::domain::values::product_mapping::ProductMapping;
use crate::infrastructure::edgar::{EdgarClient, RequestPacer};
use crate::infrastructure::openfigi::OpenFigiClient;
use crate::infrastructure::sqlite::checkpoint_repo::SqliteCheckpointRepo;
use crate::infrastructure::sqlite::holding_repo::SqliteHoldingRepo;
use crate::infrastructure::sqlite::investor_repo::SqliteInvestorRepo;
use crate::infrastructure::sqlite::open_connection;
use std::sync::Arc;

pub struct HoldingsMatch {
    registry: Arc<LeveragedProductRegistry>,
    normalizer: Arc<ExposureNormalizer>,
    calculator: Arc<dyn SimilarityCalculator>,
    resolver: IdentifierResolver,
    directory: InvestorDirectory,
    holdings: Arc<dyn HoldingRepository>,
    checkpoints: Arc<dyn CheckpointRepository>,
    ingest_uc: IngestUseCase,
    matching_uc: MatchingUseCase,
}

impl HoldingsMatch {
    /// Open the store at `db_path` wired to live EDGAR and OpenFIGI, with
    /// every other setting taken from the environment.
    pub fn new(db_path: &str) -> Result<Self, DomainError> {
        let settings = Settings::from_env();
        let pacer = Arc::new(RequestPacer::new(settings.request_interval));
        let source: Arc<dyn FilingSource> = Arc::new(EdgarClient::new(&settings, pacer));
        let mapping_api: Arc<dyn MappingApi> = Arc::new(OpenFigiClient::new(&settings));
        Self::with_providers(db_path, source, mapping_api, settings)
    }

    /// Like [`HoldingsMatch::new`] with the database path also read from the environment.
    pub fn from_env() -> Result<Self, DomainError> {
        let db_path = Settings::from_env().db_path;
        Self::new(&db_path)
    }

    pub fn with_providers(
        db_path: &str,
        source: Arc<dyn FilingSource>,
        mapping_api: Arc<dyn MappingApi>,
        settings: Settings,
    ) -> Result<Self, DomainError> {
        let investor_repo: Arc<dyn InvestorRepository> =
            Arc::new(SqliteInvestorRepo::new(open_connection(db_path)?));
        let holdings: Arc<dyn HoldingRepository> = Arc::new(SqliteHoldingRepo::new(open_connection(db_path)?));
        let checkpoints: Arc<dyn CheckpointRepository> =
            Arc::new(SqliteCheckpointRepo::new(open_connection(db_path)?));

        let registry = Arc::new(LeveragedProductRegistry::with_defaults());
        let normalizer = Arc::new(ExposureNormalizer::new(registry.clone()));
        let calculator: Arc<dyn SimilarityCalculator> = Arc::new(CosineSimilarity);

        Ok(Self {
            resolver: IdentifierResolver::new(
                mapping_api.clone(),
                Arc::new(IdentifierCache::new()),
                settings.resolver_backoff,
            ),
            directory: InvestorDirectory::new(investor_repo.clone()),
            ingest_uc: IngestUseCase::new(
                investor_repo.clone(),
                holdings.clone(),
                checkpoints.clone(),
                source,
                mapping_api,
                settings.resolver_backoff,
                settings.ingest_concurrency,
            ),
            matching_uc: MatchingUseCase::new(
                investor_repo,
                holdings.clone(),
                normalizer.clone(),
                calculator.clone(),
            ),
            registry,
            normalizer,
            calculator,
            holdings,
            checkpoints,
        })
    }

    // Ingestion

    pub async fn ingest_one(&self, investor_id: &str) -> Result<IngestOutcome, DomainError> {
        self.ingest_uc.ingest_one(investor_id).await
    }

    pub async fn ingest_all(&self) -> Result<IngestReport, DomainError> {
        self.ingest_uc.ingest_all().await
    }

    pub async fn refetch_investor(&self, investor_id: &str) -> Result<IngestOutcome, DomainError> {
        self.ingest_uc.refetch(investor_id).await
    }

    pub fn is_ingesting(&self) -> bool {
        self.ingest_uc.is_running()
    }

    pub fn stop_ingestion(&self) {
        self.ingest_uc.request_stop()
    }

    // Matching

    pub fn find_top_matches(&self, portfolio: &RawPortfolio) -> Result<Vec<MatchResult>, DomainError> {
        self.matching_uc.find_top_matches(portfolio)
    }

    pub fn normalize(&self, portfolio: &RawPortfolio, mode: NormalizationMode) -> ExposureMap {
        self.normalizer.normalize(portfolio, mode)
    }

    pub fn similarity(&self, a: &ExposureMap, b: &ExposureMap) -> Result<f64, DomainError> {
        self.calculator.calculate(a, b)
    }

    // Identifiers and products

    /// Resolve one CUSIP. Lookups share a cache for the life of this instance.
    pub async fn resolve_cusip(&self, cusip: &str) -> Result<Option<String>, DomainError> {
        self.resolver.resolve(cusip).await
    }

    pub fn lookup_product(&self, ticker: &str) -> ProductMapping {
        self.registry.lookup(ticker)
    }

    pub fn register_product(&self, ticker: &str, base_ticker: &str, factor: f64) -> Result<(), DomainError> {
        self.registry.register(ticker, base_ticker, factor)
    }

    pub fn is_leveraged(&self, ticker: &str) -> bool {
        self.registry.is_leveraged(ticker)
    }

    pub fn all_mappings(&self) -> Vec<(String, ProductMapping)> {
        self.registry.all_mappings()
    }

    // Stored data

    pub fn latest_holdings(&self, investor_id: &str) -> Result<Vec<Holding>, DomainError> {
        self.holdings.latest_holdings(investor_id)
    }

    pub fn investors_holding(&self, ticker: &str) -> Result<Vec<String>, DomainError> {
        self.holdings.investors_holding(ticker)
    }

    pub fn checkpoint(
        &self,
        investor_id: &str,
        quarter: FilingQuarter,
    ) -> Result<Option<IngestionCheckpoint>, DomainError> {
        self.checkpoints.find(investor_id, quarter)
    }

    pub fn checkpoints_by_status(&self, status: CheckpointStatus) -> Result<Vec<IngestionCheckpoint>, DomainError> {
        self.checkpoints.list_by_status(status)
    }

    // Investors

    pub fn upsert_investor(&self, profile: &InvestorProfile) -> Result<(), DomainError> {
        self.directory.upsert(profile)
    }

    pub fn investor(&self, investor_id: &str) -> Result<Option<InvestorProfile>, DomainError> {
        self.directory.get(investor_id)
    }

    pub fn active_investors(&self) -> Result<Vec<InvestorProfile>, DomainError> {
        self.directory.list_active()
    }

    pub fn seed_default_investors(&self) -> Result<usize, DomainError> {
        self.directory.seed_defaults()
    }
}
