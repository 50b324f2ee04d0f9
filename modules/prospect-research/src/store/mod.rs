// Persistence contract for companies and research jobs.
//
// The pipeline treats every call here as best-effort: errors come back as
// `StoreError` and the caller decides whether to log-and-continue (pipeline
// writes) or to surface them (read-side HTTP handlers).

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use prospect_common::{Company, JobUpdate, ResearchJob, StoreError};

#[async_trait]
pub trait ResearchStore: Send + Sync {
    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    // --- Companies ---

    /// Exact, case-sensitive lookup by company name.
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError>;

    async fn insert_company(&self, company: &Company) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_companies(&self, limit: u32, offset: u32) -> Result<Vec<Company>, StoreError>;

    async fn count_companies(&self) -> Result<u64, StoreError>;

    // --- Research jobs ---

    async fn insert_job(&self, job: &ResearchJob) -> Result<(), StoreError>;

    /// Apply a terminal transition. Fails with `NotFound` for unknown ids and
    /// `Query` when the job has already reached a terminal state.
    async fn update_job(&self, id: Uuid, update: &JobUpdate) -> Result<(), StoreError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<ResearchJob>, StoreError>;
}
