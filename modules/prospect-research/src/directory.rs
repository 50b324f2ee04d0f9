use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use prospect_common::{Company, StoreError};

use crate::store::ResearchStore;

/// Maps company names to stable ids.
#[derive(Clone)]
pub struct CompanyDirectory {
    store: Arc<dyn ResearchStore>,
}

impl CompanyDirectory {
    pub fn new(store: Arc<dyn ResearchStore>) -> Self {
        Self { store }
    }

    /// Id of the company called `name`, creating the record if none exists.
    ///
    /// Never fails: lookup errors fall through to creation, and a failed
    /// insert still returns the freshly minted id so the run can proceed.
    /// An existing record keeps its stored domain.
    pub async fn resolve(&self, name: &str, domain: Option<&str>) -> Uuid {
        match self.store.find_company_by_name(name).await {
            Ok(Some(company)) => return company.id,
            Ok(None) => {}
            Err(e) => warn!(company_name = name, error = %e, "Company lookup failed"),
        }

        let company = Company::new(name, domain);
        match self.store.insert_company(&company).await {
            Ok(()) => info!(company_name = name, company_id = %company.id, "Company created"),
            Err(e) => warn!(
                company_name = name,
                company_id = %company.id,
                error = %e,
                "Failed to persist company, continuing with unsaved id"
            ),
        }
        company.id
    }

    /// Page of companies, newest first, with the total count.
    pub async fn list(&self, limit: u32, offset: u32) -> Result<(Vec<Company>, u64), StoreError> {
        let companies = self.store.list_companies(limit, offset).await?;
        let total = self.store.count_companies().await?;
        Ok((companies, total))
    }
}
