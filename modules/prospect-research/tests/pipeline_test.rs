//! Integration tests: full research runs against in-memory and broken
//! dependencies.
//!
//! No network or database needed. Search goes through `MockSearcher`,
//! persistence through `MemoryStore` or `UnreachableStore`.

use std::sync::Arc;

use prospect_common::{JobStatus, ResearchError, ResearchRequest};
use prospect_research::testing::{
    response, FailingExtractor, MockSearcher, PanickingExtractor, UnreachableStore,
};
use prospect_research::{
    MemoryStore, ResearchOrchestrator, ResearchStore, RuleBasedExtractor, SearchProvider,
};

fn mock_provider(searcher: MockSearcher) -> SearchProvider {
    SearchProvider::new(Arc::new(searcher))
}

fn default_results() -> MockSearcher {
    MockSearcher::new().with_default(response(&[
        (
            "Acme Corp | Workflow software",
            "Acme Corp is a SaaS company headquartered in Austin, TX.",
        ),
        ("Acme Corp names Jane Doe CEO", "Jane Doe, CEO, joined in 2023."),
    ]))
}

#[tokio::test]
async fn unconfigured_search_completes_on_synthetic_data() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator =
        ResearchOrchestrator::with_rule_based(store.clone(), SearchProvider::unconfigured());

    let result = orchestrator
        .run(&ResearchRequest::new("Acme Corp", Some("acme.com")))
        .await
        .expect("degraded run should complete");

    assert_eq!(result.status, JobStatus::Completed);
    assert!(result.raw_search_data.degraded);
    assert_eq!(result.insights.company_profile.name, "Acme Corp");
    assert!((0.0..=1.0).contains(&result.confidence_score));
    assert_eq!(result.confidence_score, 1.0);

    let job = store
        .get_job(result.research_id)
        .await
        .unwrap()
        .expect("job should be recorded");
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.company_id, result.company_id);

    let output = job.output_data.expect("completed job carries output");
    assert_eq!(output["raw_search_data"]["degraded"], true);
    assert_eq!(output["insights"]["company_profile"]["name"], "Acme Corp");
    assert_eq!(output["company_id"], result.company_id.to_string());
    assert!(output["processing_time_ms"].as_u64().is_some());
}

#[tokio::test]
async fn repeated_runs_reuse_the_company() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator =
        ResearchOrchestrator::with_rule_based(store.clone(), SearchProvider::unconfigured());

    let first = orchestrator
        .run(&ResearchRequest::new("Acme Corp", None))
        .await
        .unwrap();
    let second = orchestrator
        .run(&ResearchRequest::new("Acme Corp", None))
        .await
        .unwrap();

    assert_eq!(first.company_id, second.company_id);
    assert_ne!(first.research_id, second.research_id);
    assert_eq!(store.company_count().await, 1);
    assert_eq!(store.job_count().await, 2);
}

#[tokio::test]
async fn missing_company_name_creates_no_job() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator =
        ResearchOrchestrator::with_rule_based(store.clone(), SearchProvider::unconfigured());

    let request = ResearchRequest {
        company_name: None,
        domain: Some("acme.com".into()),
    };
    let err = orchestrator.run(&request).await.unwrap_err();

    assert!(matches!(err, ResearchError::Input(_)));
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn one_failed_query_is_recorded_and_the_run_completes() {
    let store = Arc::new(MemoryStore::new());
    let searcher = default_results().fail_on("leadership team executives");
    let orchestrator = ResearchOrchestrator::with_rule_based(store, mock_provider(searcher));

    let result = orchestrator
        .run(&ResearchRequest::new("Acme Corp", None))
        .await
        .unwrap();
    let bundle = &result.raw_search_data;

    assert_eq!(bundle.company_search.len(), 4);
    assert_eq!(bundle.failed_queries(), 1);
    assert!(bundle.company_search["leadership"].is_error());
    assert!(!bundle.degraded);
    assert_eq!(result.status, JobStatus::Completed);
}

#[tokio::test]
async fn real_search_feeds_the_extractor() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator =
        ResearchOrchestrator::with_rule_based(store, mock_provider(default_results()));

    let result = orchestrator
        .run(&ResearchRequest::new("Acme Corp", Some("acme.com")))
        .await
        .unwrap();

    assert_eq!(result.raw_search_data.company_search.len(), 5);
    assert_eq!(result.insights.company_profile.industry, "Technology");
    assert_eq!(result.insights.company_profile.location, "Austin, TX");
    assert!(result
        .insights
        .leadership_team
        .key_executives
        .iter()
        .any(|e| e.name == "Jane Doe" && e.title == "CEO"));
    assert_eq!(result.confidence_score, 1.0);
}

#[tokio::test]
async fn every_query_failing_falls_back_to_synthetic_data() {
    let store = Arc::new(MemoryStore::new());
    let searcher = MockSearcher::new().fail_on("");
    let orchestrator = ResearchOrchestrator::with_rule_based(store, mock_provider(searcher));

    let result = orchestrator
        .run(&ResearchRequest::new("Acme Corp", None))
        .await
        .unwrap();

    assert!(result.raw_search_data.degraded);
    assert_eq!(result.status, JobStatus::Completed);
}

#[tokio::test]
async fn unreachable_store_does_not_block_research() {
    let orchestrator = ResearchOrchestrator::with_rule_based(
        Arc::new(UnreachableStore),
        SearchProvider::unconfigured(),
    );

    let result = orchestrator
        .run(&ResearchRequest::new("Acme Corp", Some("acme.com")))
        .await
        .expect("persistence failures are absorbed");

    assert_eq!(result.status, JobStatus::Completed);
    assert!(result.raw_search_data.degraded);
}

#[tokio::test]
async fn extraction_fault_fails_the_job() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = ResearchOrchestrator::new(
        store.clone(),
        SearchProvider::unconfigured(),
        Arc::new(FailingExtractor),
    );

    let err = orchestrator
        .run(&ResearchRequest::new("Acme Corp", None))
        .await
        .unwrap_err();

    let research_id = err.research_id().expect("pipeline faults carry the job id");
    let job = store.get_job(research_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let output = job.output_data.unwrap();
    assert!(output["error"]
        .as_str()
        .unwrap()
        .starts_with("Research failed for Acme Corp"));
}

#[tokio::test]
async fn extractor_panic_fails_the_job() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = ResearchOrchestrator::new(
        store.clone(),
        SearchProvider::unconfigured(),
        Arc::new(PanickingExtractor),
    );

    let err = orchestrator
        .run(&ResearchRequest::new("Acme Corp", None))
        .await
        .unwrap_err();

    let ResearchError::Pipeline { research_id, message } = err else {
        panic!("expected a pipeline fault, got {err:?}");
    };
    assert!(message.contains("extractor blew up"));
    let job = store.get_job(research_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.output_data.unwrap()["error"], message.as_str());
}

#[tokio::test]
async fn concurrent_runs_are_independent() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = Arc::new(ResearchOrchestrator::new(
        store.clone(),
        mock_provider(default_results()),
        Arc::new(RuleBasedExtractor),
    ));

    let runs = (0..4).map(|i| {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .run(&ResearchRequest::new(format!("Company {i}"), None))
                .await
        })
    });
    let outcomes = futures::future::join_all(runs).await;

    for outcome in outcomes {
        let result = outcome.expect("task panicked").expect("run failed");
        assert_eq!(result.status, JobStatus::Completed);
    }
    assert_eq!(store.job_count().await, 4);
}
