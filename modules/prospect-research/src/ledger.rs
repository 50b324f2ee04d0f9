use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use prospect_common::{JobUpdate, ResearchJob, StoreError};

use crate::store::ResearchStore;

/// Lifecycle records for research jobs: open as `processing`, then move to
/// exactly one terminal state.
#[derive(Clone)]
pub struct ResearchLedger {
    store: Arc<dyn ResearchStore>,
}

impl ResearchLedger {
    pub fn new(store: Arc<dyn ResearchStore>) -> Self {
        Self { store }
    }

    /// Open a `processing` job and return its id. The id is minted before the
    /// write, so a failed insert still hands back a usable id.
    pub async fn open(
        &self,
        company_id: Uuid,
        research_type: &str,
        input_data: serde_json::Value,
    ) -> Uuid {
        let job = ResearchJob::open(company_id, research_type, input_data);
        match self.store.insert_job(&job).await {
            Ok(()) => info!(research_id = %job.id, %company_id, "Research job opened"),
            Err(e) => warn!(
                research_id = %job.id,
                %company_id,
                error = %e,
                "Failed to record research job, continuing unrecorded"
            ),
        }
        job.id
    }

    pub async fn complete(
        &self,
        research_id: Uuid,
        output: serde_json::Value,
        processing_time_ms: u64,
        cost_cents: u64,
    ) -> Result<(), StoreError> {
        self.store
            .update_job(
                research_id,
                &JobUpdate::completed(output, processing_time_ms, cost_cents),
            )
            .await
    }

    pub async fn fail(&self, research_id: Uuid, error_message: &str) -> Result<(), StoreError> {
        self.store
            .update_job(research_id, &JobUpdate::failed(error_message))
            .await
    }

    pub async fn get(&self, research_id: Uuid) -> Result<Option<ResearchJob>, StoreError> {
        self.store.get_job(research_id).await
    }
}

#[cfg(test)]
mod tests {
    use prospect_common::{JobStatus, RESEARCH_TYPE_COMPANY};
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::UnreachableStore;

    fn ledger() -> ResearchLedger {
        ResearchLedger::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn open_then_complete() {
        let ledger = ledger();
        let company_id = Uuid::new_v4();
        let id = ledger
            .open(company_id, RESEARCH_TYPE_COMPANY, json!({"company_name": "Acme"}))
            .await;

        let job = ledger.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.company_id, company_id);
        assert!(job.output_data.is_none());

        ledger.complete(id, json!({"ok": true}), 1234, 0).await.unwrap();

        let job = ledger.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.output_data, Some(json!({"ok": true})));
        assert_eq!(job.processing_time_ms, 1234);
    }

    #[tokio::test]
    async fn open_then_fail_records_error_and_timestamp() {
        let ledger = ledger();
        let id = ledger
            .open(Uuid::new_v4(), RESEARCH_TYPE_COMPANY, json!({}))
            .await;

        ledger.fail(id, "extraction broke").await.unwrap();

        let job = ledger.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        let output = job.output_data.unwrap();
        assert_eq!(output["error"], "extraction broke");
        assert!(output["timestamp"].is_string());
    }

    #[tokio::test]
    async fn terminal_jobs_reject_further_updates() {
        let ledger = ledger();
        let id = ledger
            .open(Uuid::new_v4(), RESEARCH_TYPE_COMPANY, json!({}))
            .await;
        ledger.complete(id, json!({}), 1, 0).await.unwrap();

        assert!(ledger.fail(id, "late").await.is_err());
        let job = ledger.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let err = ledger().fail(Uuid::new_v4(), "x").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn open_survives_unreachable_store() {
        let ledger = ResearchLedger::new(Arc::new(UnreachableStore));
        let id = ledger
            .open(Uuid::new_v4(), RESEARCH_TYPE_COMPANY, json!({}))
            .await;
        assert_ne!(id, Uuid::nil());
        assert!(ledger.complete(id, json!({}), 0, 0).await.is_err());
    }
}
