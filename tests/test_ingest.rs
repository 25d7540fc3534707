mod common;

use common::{add_investor, info_table, setup, setup_at, test_settings, FakeFiling, FakeFilingSource, ScriptedMappingApi};
use holdingsmatch::domain::error::DomainError;
use holdingsmatch::domain::values::checkpoint_status::CheckpointStatus;
use holdingsmatch::domain::values::filing_quarter::FilingQuarter;
use std::sync::Arc;
use std::time::Duration;

const BUFFETT_CIK: &str = "0001067983";

fn berkshire_table() -> String {
    info_table(&[
        ("APPLE INC", "037833100", 60000.0, 300),
        ("COCA COLA CO", "191216100", 30000.0, 400),
        ("UNKNOWN HOLDINGS", "999999999", 10000.0, 50),
        ("MICROSOFT CORP", "594918104", 0.0, 0),
    ])
}

#[tokio::test]
async fn test_ingest_one_stores_resolved_holdings() {
    let source = Arc::new(FakeFilingSource::new());
    source.set(BUFFETT_CIK, FakeFiling::Document(berkshire_table()));
    let hm = setup(source.clone(), Arc::new(ScriptedMappingApi::not_found()));
    add_investor(&hm, "buffett", BUFFETT_CIK, "Warren Buffett");

    let outcome = hm.ingest_one("buffett").await.unwrap();
    assert_eq!(outcome.status, CheckpointStatus::Success);
    assert_eq!(outcome.holdings_count, 2);
    assert_eq!(outcome.filing_quarter, Some(FilingQuarter::new(2024, 3).unwrap()));
    assert!(!outcome.already_ingested);

    let holdings = hm.latest_holdings("buffett").unwrap();
    assert_eq!(holdings.len(), 2);
    assert_eq!(holdings[0].ticker, "AAPL");
    // Total includes the unresolved row, so weights need not sum to 100.
    assert_eq!(holdings[0].portfolio_weight_pct, 60.0);
    assert_eq!(holdings[0].market_value, 60000.0);
    assert_eq!(holdings[0].shares, 300);
    assert_eq!(holdings[1].ticker, "KO");
    assert_eq!(holdings[1].portfolio_weight_pct, 30.0);
    assert_eq!(holdings[1].source_url, "https://edgar.test/0001067983/infotable.xml");

    let cp = hm
        .checkpoint("buffett", FilingQuarter::current())
        .unwrap()
        .expect("checkpoint recorded");
    assert_eq!(cp.status, CheckpointStatus::Success);
    assert_eq!(cp.holdings_count, Some(2));
    assert_eq!(cp.retry_count, 1);
    assert!(cp.completed_at.is_some());
}

#[tokio::test]
async fn test_rerun_after_success_does_no_work() {
    let source = Arc::new(FakeFilingSource::new());
    source.set(BUFFETT_CIK, FakeFiling::Document(berkshire_table()));
    let hm = setup(source.clone(), Arc::new(ScriptedMappingApi::not_found()));
    add_investor(&hm, "buffett", BUFFETT_CIK, "Warren Buffett");

    hm.ingest_one("buffett").await.unwrap();
    let again = hm.ingest_one("buffett").await.unwrap();

    assert!(again.already_ingested);
    assert_eq!(again.status, CheckpointStatus::Success);
    assert_eq!(again.holdings_count, 2);
    assert_eq!(source.discovers(), 1);
    assert_eq!(source.fetches(), 1);
    assert_eq!(hm.latest_holdings("buffett").unwrap().len(), 2);
}

#[tokio::test]
async fn test_html_document_is_skipped() {
    let source = Arc::new(FakeFilingSource::new());
    source.set(
        BUFFETT_CIK,
        FakeFiling::Document("<!doctype html><html><body>Request Rate Threshold Exceeded</body></html>".into()),
    );
    let hm = setup(source, Arc::new(ScriptedMappingApi::not_found()));
    add_investor(&hm, "buffett", BUFFETT_CIK, "Warren Buffett");

    let outcome = hm.ingest_one("buffett").await.unwrap();
    assert_eq!(outcome.status, CheckpointStatus::Skipped);
    assert_eq!(outcome.holdings_count, 0);
    assert_eq!(outcome.reason.as_deref(), Some("HTML response"));
    assert!(hm.latest_holdings("buffett").unwrap().is_empty());

    let cp = hm.checkpoint("buffett", FilingQuarter::current()).unwrap().unwrap();
    assert_eq!(cp.status, CheckpointStatus::Skipped);
    assert_eq!(cp.fail_reason.as_deref(), Some("HTML response"));
}

#[tokio::test]
async fn test_no_filing_is_skipped() {
    let source = Arc::new(FakeFilingSource::new());
    source.set(BUFFETT_CIK, FakeFiling::NotFiled);
    let hm = setup(source.clone(), Arc::new(ScriptedMappingApi::not_found()));
    add_investor(&hm, "buffett", BUFFETT_CIK, "Warren Buffett");

    let outcome = hm.ingest_one("buffett").await.unwrap();
    assert_eq!(outcome.status, CheckpointStatus::Skipped);
    assert_eq!(outcome.reason.as_deref(), Some("no filing found"));
    assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn test_unresolvable_filing_is_skipped() {
    let source = Arc::new(FakeFilingSource::new());
    source.set(
        BUFFETT_CIK,
        FakeFiling::Document(info_table(&[("MYSTERY CORP", "999999999", 5000.0, 10)])),
    );
    let hm = setup(source, Arc::new(ScriptedMappingApi::not_found()));
    add_investor(&hm, "buffett", BUFFETT_CIK, "Warren Buffett");

    let outcome = hm.ingest_one("buffett").await.unwrap();
    assert_eq!(outcome.status, CheckpointStatus::Skipped);
    assert!(hm.latest_holdings("buffett").unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_document_fails_with_reason() {
    let source = Arc::new(FakeFilingSource::new());
    source.set(
        BUFFETT_CIK,
        FakeFiling::Document("<informationTable><infoTable><cusip>037833100</infoTable>".into()),
    );
    let hm = setup(source, Arc::new(ScriptedMappingApi::not_found()));
    add_investor(&hm, "buffett", BUFFETT_CIK, "Warren Buffett");

    let outcome = hm.ingest_one("buffett").await.unwrap();
    assert_eq!(outcome.status, CheckpointStatus::Failed);

    let cp = hm.checkpoint("buffett", FilingQuarter::current()).unwrap().unwrap();
    assert_eq!(cp.status, CheckpointStatus::Failed);
    let reason = cp.fail_reason.unwrap();
    assert!(reason.starts_with("Parse error"), "got: {reason}");
    assert!(reason.chars().count() <= 500);
    assert_eq!(hm.checkpoints_by_status(CheckpointStatus::Failed).unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_investor() {
    let hm = setup(Arc::new(FakeFilingSource::new()), Arc::new(ScriptedMappingApi::not_found()));
    assert!(matches!(hm.ingest_one("nobody").await, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_ingest_all_isolates_failures() {
    let source = Arc::new(FakeFilingSource::new());
    source.set(BUFFETT_CIK, FakeFiling::Document(berkshire_table()));
    source.set("0001697748", FakeFiling::NotFiled);
    source.set("0001350694", FakeFiling::DiscoverFails(404));
    let hm = setup(source.clone(), Arc::new(ScriptedMappingApi::not_found()));
    add_investor(&hm, "buffett", BUFFETT_CIK, "Warren Buffett");
    add_investor(&hm, "wood", "0001697748", "Cathie Wood");
    add_investor(&hm, "dalio", "0001350694", "Ray Dalio");

    let report = hm.ingest_all().await.unwrap();
    assert_eq!(report.investors, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.already_ingested, 0);
    assert_eq!(report.cancelled, 0);
    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.investor_id.as_str()).collect();
    assert_eq!(ids, vec!["buffett", "dalio", "wood"]);

    // Second run passes over the success and retries the rest on the same rows.
    let report = hm.ingest_all().await.unwrap();
    assert_eq!(report.already_ingested, 1);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(source.discovers(), 5);

    let cp = hm.checkpoint("dalio", FilingQuarter::current()).unwrap().unwrap();
    assert_eq!(cp.status, CheckpointStatus::Failed);
    assert_eq!(cp.retry_count, 2);
    assert!(!hm.is_ingesting());
}

#[tokio::test]
async fn test_stop_and_overlap_refusal() {
    let source = Arc::new(FakeFilingSource::with_delay(Duration::from_millis(100)));
    for cik in ["0000000001", "0000000002", "0000000003"] {
        source.set(cik, FakeFiling::Document(info_table(&[("APPLE INC", "037833100", 100.0, 1)])));
    }
    let settings = holdingsmatch::config::Settings {
        ingest_concurrency: 1,
        ..test_settings()
    };
    let hm = setup_at(":memory:", source.clone(), Arc::new(ScriptedMappingApi::not_found()), settings);
    add_investor(&hm, "a", "0000000001", "A");
    add_investor(&hm, "b", "0000000002", "B");
    add_investor(&hm, "c", "0000000003", "C");

    let (report, _) = tokio::join!(hm.ingest_all(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(hm.is_ingesting());
        assert!(matches!(hm.ingest_all().await, Err(DomainError::Validation(_))));
        hm.stop_ingestion();
    });

    let report = report.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.cancelled, 2);
    assert_eq!(source.discovers(), 1);
    assert!(!hm.is_ingesting());
}

#[tokio::test]
async fn test_refetch_replaces_stored_quarter() {
    let source = Arc::new(FakeFilingSource::new());
    source.set(BUFFETT_CIK, FakeFiling::Document(berkshire_table()));
    let hm = setup(source.clone(), Arc::new(ScriptedMappingApi::not_found()));
    add_investor(&hm, "buffett", BUFFETT_CIK, "Warren Buffett");
    hm.ingest_one("buffett").await.unwrap();

    source.set(
        BUFFETT_CIK,
        FakeFiling::Document(info_table(&[("AMAZON COM INC", "023135106", 1000.0, 5)])),
    );
    let outcome = hm.refetch_investor("buffett").await.unwrap();

    assert_eq!(outcome.status, CheckpointStatus::Success);
    assert!(!outcome.already_ingested);
    let holdings = hm.latest_holdings("buffett").unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].ticker, "AMZN");
    assert_eq!(holdings[0].portfolio_weight_pct, 100.0);
    assert_eq!(source.discovers(), 2);

    let cp = hm.checkpoint("buffett", FilingQuarter::current()).unwrap().unwrap();
    assert_eq!(cp.retry_count, 1);
    assert_eq!(hm.investors_holding("AMZN").unwrap(), vec!["buffett".to_string()]);
}
