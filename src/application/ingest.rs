//! Quarterly 13F ingestion.
//!
//! Each investor is one independently failable unit: discover the latest
//! filing, fetch and decode it, resolve CUSIPs, then persist the quarter in a
//! single transaction. The checkpoint row for the run quarter records the
//! outcome so a later run can skip work that already succeeded.

use crate::application::filing_document::{looks_like_html, parse_filing_document, FilingDocument};
use crate::application::identifier_resolver::{IdentifierCache, IdentifierResolver};
use crate::domain::entities::holding::Holding;
use crate::domain::entities::investor::InvestorProfile;
use crate::domain::error::DomainError;
use crate::domain::ports::checkpoint_repository::CheckpointRepository;
use crate::domain::ports::filing_source::{FilingRef, FilingSource};
use crate::domain::ports::holding_repository::{HoldingRepository, InsertOutcome};
use crate::domain::ports::investor_repository::InvestorRepository;
use crate::domain::ports::mapping_api::MappingApi;
use crate::domain::values::checkpoint_status::CheckpointStatus;
use crate::domain::values::cusip::Cusip;
use crate::domain::values::filing_quarter::FilingQuarter;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest fail reason stored on a checkpoint.
const MAX_FAIL_REASON: usize = 500;

/// Outcome of one investor's attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub investor_id: String,
    /// Quarter the checkpoint is keyed on (the quarter the run happened in).
    pub run_quarter: FilingQuarter,
    /// Reporting quarter of the stored holdings, when a filing was stored.
    pub filing_quarter: Option<FilingQuarter>,
    pub status: CheckpointStatus,
    pub holdings_count: usize,
    pub reason: Option<String>,
    /// The checkpoint already said SUCCESS, so nothing was fetched or written.
    pub already_ingested: bool,
}

/// Per-run totals for [`IngestUseCase::ingest_all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub investors: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Investors passed over because this quarter already succeeded.
    pub already_ingested: usize,
    /// Investors not started because a stop was requested.
    pub cancelled: usize,
    pub outcomes: Vec<IngestOutcome>,
}

enum Collected {
    Stored {
        quarter: FilingQuarter,
        outcome: InsertOutcome,
    },
    Skipped(String),
}

enum InvestorRun {
    Done(IngestOutcome),
    Failed,
    Cancelled,
}

/// Resets the running flag however the batch exits.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct IngestUseCase {
    investors: Arc<dyn InvestorRepository>,
    holdings: Arc<dyn HoldingRepository>,
    checkpoints: Arc<dyn CheckpointRepository>,
    source: Arc<dyn FilingSource>,
    mapping_api: Arc<dyn MappingApi>,
    resolver_backoff: Duration,
    concurrency: usize,
    running: AtomicBool,
    stop_requested: AtomicBool,
}

impl IngestUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        investors: Arc<dyn InvestorRepository>,
        holdings: Arc<dyn HoldingRepository>,
        checkpoints: Arc<dyn CheckpointRepository>,
        source: Arc<dyn FilingSource>,
        mapping_api: Arc<dyn MappingApi>,
        resolver_backoff: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            investors,
            holdings,
            checkpoints,
            source,
            mapping_api,
            resolver_backoff,
            concurrency: concurrency.max(1),
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask a running batch to stop. Investors already in flight finish normally.
    pub fn request_stop(&self) {
        if self.is_running() {
            info!("stop requested for running ingestion");
        }
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    fn new_resolver(&self) -> IdentifierResolver {
        IdentifierResolver::new(
            self.mapping_api.clone(),
            Arc::new(IdentifierCache::new()),
            self.resolver_backoff,
        )
    }

    fn load_investor(&self, investor_id: &str) -> Result<InvestorProfile, DomainError> {
        self.investors
            .get(investor_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Investor not found: {investor_id}")))
    }

    /// Ingest a single investor's latest filing.
    pub async fn ingest_one(&self, investor_id: &str) -> Result<IngestOutcome, DomainError> {
        let profile = self.load_investor(investor_id)?;
        let resolver = self.new_resolver();
        self.attempt(&profile, &resolver, FilingQuarter::current()).await
    }

    /// Drop everything stored for an investor and ingest again from scratch.
    pub async fn refetch(&self, investor_id: &str) -> Result<IngestOutcome, DomainError> {
        let profile = self.load_investor(investor_id)?;
        let removed = self.holdings.delete_for_investor(&profile.investor_id)?;
        self.checkpoints.delete_for_investor(&profile.investor_id)?;
        info!(investor = %profile.investor_id, removed, "cleared stored holdings for refetch");
        let resolver = self.new_resolver();
        self.attempt(&profile, &resolver, FilingQuarter::current()).await
    }

    /// Ingest every active investor, up to `concurrency` at a time.
    ///
    /// Refused while another batch is running. One investor's failure never
    /// stops the others.
    pub async fn ingest_all(&self) -> Result<IngestReport, DomainError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DomainError::Validation("Ingestion is already running".into()));
        }
        let _guard = RunningGuard(&self.running);
        self.stop_requested.store(false, Ordering::SeqCst);

        let investors = self.investors.list_active()?;
        let run_quarter = FilingQuarter::current();
        let resolver = self.new_resolver();
        info!(investors = investors.len(), quarter = %run_quarter, "starting ingestion run");

        let resolver = &resolver;
        let runs: Vec<InvestorRun> = stream::iter(investors.iter())
            .map(|profile| async move {
                if self.stop_requested.load(Ordering::SeqCst) {
                    debug!(investor = %profile.investor_id, "not started, stop requested");
                    return InvestorRun::Cancelled;
                }
                match self.attempt(profile, resolver, run_quarter).await {
                    Ok(outcome) => InvestorRun::Done(outcome),
                    Err(e) => {
                        error!(investor = %profile.investor_id, error = %e, "checkpoint bookkeeping failed");
                        InvestorRun::Failed
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = IngestReport {
            investors: investors.len(),
            ..Default::default()
        };
        for run in runs {
            match run {
                InvestorRun::Cancelled => report.cancelled += 1,
                InvestorRun::Failed => report.failed += 1,
                InvestorRun::Done(outcome) => {
                    match (outcome.already_ingested, outcome.status) {
                        (true, _) => report.already_ingested += 1,
                        (false, CheckpointStatus::Success) => report.succeeded += 1,
                        (false, CheckpointStatus::Skipped) => report.skipped += 1,
                        (false, _) => report.failed += 1,
                    }
                    report.outcomes.push(outcome);
                }
            }
        }
        report.outcomes.sort_by(|a, b| a.investor_id.cmp(&b.investor_id));

        info!(
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            already_ingested = report.already_ingested,
            cancelled = report.cancelled,
            "ingestion run finished"
        );
        Ok(report)
    }

    /// One checkpointed attempt. Errors returned here are checkpoint store
    /// failures; everything else ends up recorded on the checkpoint.
    async fn attempt(
        &self,
        profile: &InvestorProfile,
        resolver: &IdentifierResolver,
        run_quarter: FilingQuarter,
    ) -> Result<IngestOutcome, DomainError> {
        let investor_id = profile.investor_id.as_str();

        if let Some(cp) = self.checkpoints.find(investor_id, run_quarter)? {
            if cp.is_success() {
                debug!(investor = investor_id, quarter = %run_quarter, "already ingested");
                return Ok(IngestOutcome {
                    investor_id: investor_id.to_string(),
                    run_quarter,
                    filing_quarter: None,
                    status: CheckpointStatus::Success,
                    holdings_count: cp.holdings_count.unwrap_or(0),
                    reason: None,
                    already_ingested: true,
                });
            }
        }

        let cp = self.checkpoints.start_attempt(investor_id, run_quarter)?;
        debug!(investor = investor_id, attempt = cp.retry_count, "ingestion attempt started");

        let (status, filing_quarter, count, reason) = match self.collect(profile, resolver).await {
            Ok(Collected::Stored { quarter, outcome }) => {
                if let InsertOutcome::AlreadyPresent(n) = outcome {
                    info!(investor = investor_id, quarter = %quarter, holdings = n, "quarter already stored");
                } else {
                    info!(investor = investor_id, quarter = %quarter, holdings = outcome.count(), "stored holdings");
                }
                (CheckpointStatus::Success, Some(quarter), outcome.count(), None)
            }
            Ok(Collected::Skipped(reason)) => {
                warn!(investor = investor_id, reason = %reason, "ingestion skipped");
                (CheckpointStatus::Skipped, None, 0, Some(reason))
            }
            Err(e) => {
                error!(investor = investor_id, error = %e, "ingestion failed");
                (CheckpointStatus::Failed, None, 0, Some(e.summary(MAX_FAIL_REASON)))
            }
        };

        let recorded_count = (status == CheckpointStatus::Success).then_some(count);
        self.checkpoints
            .finish(investor_id, run_quarter, status, recorded_count, reason.as_deref())?;

        Ok(IngestOutcome {
            investor_id: investor_id.to_string(),
            run_quarter,
            filing_quarter,
            status,
            holdings_count: count,
            reason,
            already_ingested: false,
        })
    }

    async fn collect(
        &self,
        profile: &InvestorProfile,
        resolver: &IdentifierResolver,
    ) -> Result<Collected, DomainError> {
        let Some(filing) = self.source.discover(&profile.cik).await? else {
            return Ok(Collected::Skipped("no filing found".into()));
        };
        debug!(investor = %profile.investor_id, accession = %filing.accession_number, form = %filing.form, "filing located");

        let body = match self.source.fetch_document(&filing).await {
            Ok(body) => body,
            Err(DomainError::NonMachineReadable(_)) => return Ok(Collected::Skipped("HTML response".into())),
            Err(e) => return Err(e),
        };
        if looks_like_html(&body) {
            return Ok(Collected::Skipped("HTML response".into()));
        }

        let doc = parse_filing_document(&body)?;
        let period = doc.period_of_report.or(filing.report_date).ok_or_else(|| {
            DomainError::Parse(format!(
                "No reporting period in filing {}",
                filing.accession_number
            ))
        })?;
        let quarter = FilingQuarter::from_date(period);

        let holdings = self.resolve_rows(profile, resolver, &filing, quarter, &doc).await;
        if holdings.is_empty() {
            return Ok(Collected::Skipped("no resolvable holdings".into()));
        }

        let outcome = self.holdings.insert_quarter(&profile.investor_id, quarter, &holdings)?;
        Ok(Collected::Stored { quarter, outcome })
    }

    async fn resolve_rows(
        &self,
        profile: &InvestorProfile,
        resolver: &IdentifierResolver,
        filing: &FilingRef,
        quarter: FilingQuarter,
        doc: &FilingDocument,
    ) -> Vec<Holding> {
        let total = doc.total_value();
        let mut holdings = Vec::with_capacity(doc.rows.len());
        let mut dropped = 0usize;

        for row in &doc.rows {
            if row.value == 0.0 {
                dropped += 1;
                continue;
            }
            let cusip = match Cusip::new(&row.cusip) {
                Ok(c) => c,
                Err(e) => {
                    debug!(investor = %profile.investor_id, issuer = %row.issuer, error = %e, "row dropped");
                    dropped += 1;
                    continue;
                }
            };
            let ticker = match resolver.resolve(cusip.as_str()).await {
                Ok(Some(t)) => t,
                Ok(None) => {
                    debug!(investor = %profile.investor_id, cusip = %cusip, issuer = %row.issuer, "unresolved CUSIP");
                    dropped += 1;
                    continue;
                }
                Err(e) => {
                    debug!(investor = %profile.investor_id, cusip = %cusip, error = %e, "row dropped");
                    dropped += 1;
                    continue;
                }
            };
            holdings.push(Holding::new(
                profile.investor_id.clone(),
                ticker,
                row.issuer.clone(),
                cusip.to_string(),
                row.shares,
                row.value,
                round2(row.value / total * 100.0),
                quarter,
                filing.filing_date,
                filing.document_url.clone(),
            ));
        }

        if dropped > 0 {
            info!(investor = %profile.investor_id, kept = holdings.len(), dropped, "resolved filing rows");
        }
        holdings
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
