use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use prospect_common::{Company, JobUpdate, ResearchJob, StoreError};

use super::ResearchStore;

/// In-process store used when no database is configured, and in tests.
/// Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    companies: RwLock<Vec<Company>>,
    jobs: RwLock<HashMap<Uuid, ResearchJob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn company_count(&self) -> usize {
        self.companies.read().await.len()
    }
}

#[async_trait]
impl ResearchStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let companies = self.companies.read().await;
        Ok(companies.iter().find(|c| c.name == name).cloned())
    }

    async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        let mut companies = self.companies.write().await;
        if companies.iter().any(|c| c.id == company.id) {
            return Err(StoreError::Query(format!(
                "duplicate company id {}",
                company.id
            )));
        }
        companies.push(company.clone());
        Ok(())
    }

    async fn list_companies(&self, limit: u32, offset: u32) -> Result<Vec<Company>, StoreError> {
        let companies = self.companies.read().await;
        Ok(companies
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_companies(&self) -> Result<u64, StoreError> {
        Ok(self.companies.read().await.len() as u64)
    }

    async fn insert_job(&self, job: &ResearchJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::Query(format!("duplicate research id {}", job.id)));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn update_job(&self, id: Uuid, update: &JobUpdate) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if job.status.is_terminal() {
            return Err(StoreError::Query(format!(
                "research {id} is already {}",
                job.status
            )));
        }
        job.apply(update);
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<ResearchJob>, StoreError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use prospect_common::{JobStatus, RESEARCH_TYPE_COMPANY};

    use super::*;

    #[tokio::test]
    async fn lookup_is_exact_match() {
        let store = MemoryStore::new();
        store
            .insert_company(&Company::new("Acme Corp", Some("acme.com")))
            .await
            .unwrap();

        assert!(store.find_company_by_name("Acme Corp").await.unwrap().is_some());
        assert!(store.find_company_by_name("acme corp").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let store = MemoryStore::new();
        for name in ["A", "B", "C"] {
            store.insert_company(&Company::new(name, None)).await.unwrap();
        }

        let page = store.list_companies(2, 0).await.unwrap();
        let names: Vec<_> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B"]);

        let page = store.list_companies(2, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "A");
        assert_eq!(store.count_companies().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn terminal_jobs_reject_further_updates() {
        let store = MemoryStore::new();
        let job = ResearchJob::open(Uuid::new_v4(), RESEARCH_TYPE_COMPANY, serde_json::json!({}));
        store.insert_job(&job).await.unwrap();

        store
            .update_job(job.id, &JobUpdate::failed("boom"))
            .await
            .unwrap();
        let err = store
            .update_job(job.id, &JobUpdate::completed(serde_json::json!({}), 1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));

        let stored = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn updating_unknown_job_is_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let err = store.update_job(id, &JobUpdate::failed("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(missing) if missing == id));
    }
}
