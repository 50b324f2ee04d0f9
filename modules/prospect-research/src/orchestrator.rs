use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use prospect_common::{JobStatus, ResearchError, ResearchRequest, ValidatedRequest, RESEARCH_TYPE_COMPANY};

use crate::bundle::SearchBundle;
use crate::directory::CompanyDirectory;
use crate::extractor::{InsightExtractor, Insights, RuleBasedExtractor};
use crate::ledger::ResearchLedger;
use crate::search::SearchProvider;
use crate::store::ResearchStore;

/// Final output of one research run. Persisted verbatim as the job output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub research_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub domain: Option<String>,
    pub status: JobStatus,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub insights: Insights,
    pub raw_search_data: SearchBundle,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Copy)]
enum ResearchPhase {
    Gathering,
    Analyzing,
    Completed,
    Failed,
}

impl ResearchPhase {
    fn as_str(self) -> &'static str {
        match self {
            ResearchPhase::Gathering => "gathering",
            ResearchPhase::Analyzing => "analyzing",
            ResearchPhase::Completed => "completed",
            ResearchPhase::Failed => "failed",
        }
    }
}

fn enter(research_id: Uuid, phase: ResearchPhase) {
    info!(%research_id, phase = phase.as_str(), "Research phase");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Sequences one research run: validate, resolve the company, open a job,
/// gather (degrading to synthetic data), extract, then close the job.
///
/// Persistence and search failures are absorbed. Only a fault in the
/// pipeline itself fails the job and reaches the caller.
#[derive(Clone)]
pub struct ResearchOrchestrator {
    directory: CompanyDirectory,
    ledger: ResearchLedger,
    search: SearchProvider,
    extractor: Arc<dyn InsightExtractor>,
}

impl ResearchOrchestrator {
    pub fn new(
        store: Arc<dyn ResearchStore>,
        search: SearchProvider,
        extractor: Arc<dyn InsightExtractor>,
    ) -> Self {
        Self {
            directory: CompanyDirectory::new(store.clone()),
            ledger: ResearchLedger::new(store),
            search,
            extractor,
        }
    }

    pub fn with_rule_based(store: Arc<dyn ResearchStore>, search: SearchProvider) -> Self {
        Self::new(store, search, Arc::new(RuleBasedExtractor))
    }

    pub fn directory(&self) -> &CompanyDirectory {
        &self.directory
    }

    pub fn ledger(&self) -> &ResearchLedger {
        &self.ledger
    }

    pub fn search(&self) -> &SearchProvider {
        &self.search
    }

    pub async fn run(&self, request: &ResearchRequest) -> Result<ResearchResult, ResearchError> {
        let request = request.validate()?;
        let started = Instant::now();

        let company_id = self
            .directory
            .resolve(&request.company_name, request.domain.as_deref())
            .await;

        let input = serde_json::json!({
            "company_name": request.company_name,
            "domain": request.domain,
        });
        let research_id = self
            .ledger
            .open(company_id, RESEARCH_TYPE_COMPANY, input)
            .await;

        // A panic inside the pipeline must still close the job.
        let executed = AssertUnwindSafe(self.execute(research_id, company_id, &request, started))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())))
            });

        match executed {
            Ok(result) => {
                enter(research_id, ResearchPhase::Completed);
                info!(
                    %research_id,
                    %company_id,
                    processing_time_ms = result.processing_time_ms,
                    confidence = result.confidence_score,
                    degraded = result.raw_search_data.degraded,
                    "Research completed"
                );
                Ok(result)
            }
            Err(e) => {
                enter(research_id, ResearchPhase::Failed);
                let message = format!("Research failed for {}: {e:#}", request.company_name);
                error!(%research_id, %company_id, error = %message, "Research pipeline fault");
                if let Err(store_err) = self.ledger.fail(research_id, &message).await {
                    warn!(%research_id, error = %store_err, "Failed to record research failure");
                }
                Err(ResearchError::Pipeline {
                    research_id,
                    message,
                })
            }
        }
    }

    async fn execute(
        &self,
        research_id: Uuid,
        company_id: Uuid,
        request: &ValidatedRequest,
        started: Instant,
    ) -> anyhow::Result<ResearchResult> {
        let name = request.company_name.as_str();
        let domain = request.domain.as_deref();

        enter(research_id, ResearchPhase::Gathering);
        let bundle = self.gather(research_id, name, domain).await;

        enter(research_id, ResearchPhase::Analyzing);
        let insights = self
            .extractor
            .extract(name, &bundle)
            .context("insight extraction failed")?;

        let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = ResearchResult {
            research_id,
            company_id,
            company_name: request.company_name.clone(),
            domain: request.domain.clone(),
            status: JobStatus::Completed,
            processing_time_ms,
            timestamp: Utc::now(),
            confidence_score: insights.confidence_score,
            insights,
            raw_search_data: bundle,
        };

        let output = serde_json::to_value(&result).context("failed to serialize research result")?;
        if let Err(e) = self
            .ledger
            .complete(research_id, output, processing_time_ms, 0)
            .await
        {
            warn!(%research_id, error = %e, "Failed to record research completion");
        }

        Ok(result)
    }

    /// Real search when configured and at least one query succeeded;
    /// otherwise the synthetic bundle.
    async fn gather(&self, research_id: Uuid, name: &str, domain: Option<&str>) -> SearchBundle {
        if !self.search.is_configured() {
            info!(%research_id, "Search provider not configured, using synthetic data");
            return SearchBundle::synthetic(name, domain);
        }
        match self.search.gather(name, domain).await {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(%research_id, error = %e, "Search unavailable, using synthetic data");
                SearchBundle::synthetic(name, domain)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn unconfigured_search_runs_degraded() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator =
            ResearchOrchestrator::with_rule_based(store.clone(), SearchProvider::unconfigured());

        let result = orchestrator
            .run(&ResearchRequest::new("Acme Corp", Some("acme.com")))
            .await
            .unwrap();

        assert_eq!(result.status, JobStatus::Completed);
        assert!(result.raw_search_data.degraded);
        assert_eq!(result.domain.as_deref(), Some("acme.com"));
        assert_eq!(result.confidence_score, 1.0);
        assert_eq!(store.job_count().await, 1);
    }

    #[tokio::test]
    async fn invalid_input_opens_no_job() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator =
            ResearchOrchestrator::with_rule_based(store.clone(), SearchProvider::unconfigured());

        let err = orchestrator
            .run(&ResearchRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ResearchError::Input(_)));
        assert_eq!(store.job_count().await, 0);
        assert_eq!(store.company_count().await, 0);
    }

    #[test]
    fn phases_have_stable_names() {
        assert_eq!(ResearchPhase::Gathering.as_str(), "gathering");
        assert_eq!(ResearchPhase::Failed.as_str(), "failed");
    }
}
