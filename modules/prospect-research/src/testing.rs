// Test doubles for the research pipeline.
//
// - MockSearcher (WebSearcher): query→response map with substring failures
// - UnreachableStore (ResearchStore): every call fails as if the DB were down
// - FailingExtractor (InsightExtractor): always errors, to drive job failure
// - PanickingExtractor (InsightExtractor): panics mid-run

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serper_client::{OrganicResult, SearchResponse};
use uuid::Uuid;

use prospect_common::{Company, JobUpdate, ResearchJob, StoreError};

use crate::bundle::SearchBundle;
use crate::extractor::{ExtractionError, InsightExtractor, Insights};
use crate::search::WebSearcher;
use crate::store::ResearchStore;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn organic(title: &str, snippet: &str) -> OrganicResult {
    OrganicResult {
        title: title.to_string(),
        snippet: snippet.to_string(),
        ..Default::default()
    }
}

pub fn response(items: &[(&str, &str)]) -> SearchResponse {
    SearchResponse {
        organic: items.iter().map(|(t, s)| organic(t, s)).collect(),
        knowledge_graph: None,
    }
}

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

/// An optional fallback response and substring patterns that force a
/// failure. Without a fallback every query returns `Err`. Records every
/// query it sees.
#[derive(Default)]
pub struct MockSearcher {
    default: Option<SearchResponse>,
    failures: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, response: SearchResponse) -> Self {
        self.default = Some(response);
        self
    }

    /// Fail every query containing `pattern`. An empty pattern fails all.
    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.failures.push(pattern.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, query: &str, _num: u32) -> Result<SearchResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(query.to_string());
        }
        if self.failures.iter().any(|p| query.contains(p.as_str())) {
            bail!("API error (status 500): MockSearcher forced failure for {query}");
        }
        self.default
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MockSearcher: no response registered for {query}"))
    }
}

// ---------------------------------------------------------------------------
// UnreachableStore
// ---------------------------------------------------------------------------

/// Every call fails with `StoreError::Unavailable`.
pub struct UnreachableStore;

fn down<T>() -> std::result::Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl ResearchStore for UnreachableStore {
    async fn ping(&self) -> std::result::Result<(), StoreError> {
        down()
    }

    async fn find_company_by_name(
        &self,
        _name: &str,
    ) -> std::result::Result<Option<Company>, StoreError> {
        down()
    }

    async fn insert_company(&self, _company: &Company) -> std::result::Result<(), StoreError> {
        down()
    }

    async fn list_companies(
        &self,
        _limit: u32,
        _offset: u32,
    ) -> std::result::Result<Vec<Company>, StoreError> {
        down()
    }

    async fn count_companies(&self) -> std::result::Result<u64, StoreError> {
        down()
    }

    async fn insert_job(&self, _job: &ResearchJob) -> std::result::Result<(), StoreError> {
        down()
    }

    async fn update_job(
        &self,
        _id: Uuid,
        _update: &JobUpdate,
    ) -> std::result::Result<(), StoreError> {
        down()
    }

    async fn get_job(&self, _id: Uuid) -> std::result::Result<Option<ResearchJob>, StoreError> {
        down()
    }
}

// ---------------------------------------------------------------------------
// FailingExtractor
// ---------------------------------------------------------------------------

pub struct FailingExtractor;

impl InsightExtractor for FailingExtractor {
    fn extract(
        &self,
        _company_name: &str,
        _bundle: &SearchBundle,
    ) -> std::result::Result<Insights, ExtractionError> {
        Err(ExtractionError::Malformed(
            "analysis backend returned garbage".to_string(),
        ))
    }
}

pub struct PanickingExtractor;

impl InsightExtractor for PanickingExtractor {
    fn extract(
        &self,
        company_name: &str,
        _bundle: &SearchBundle,
    ) -> std::result::Result<Insights, ExtractionError> {
        panic!("extractor blew up on {company_name}");
    }
}
