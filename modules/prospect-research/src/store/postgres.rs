use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use prospect_common::{Company, JobStatus, JobUpdate, ResearchJob, StoreError};

use super::ResearchStore;

type CompanyRow = (Uuid, String, Option<String>, DateTime<Utc>, DateTime<Utc>);

type JobRow = (
    Uuid,
    Uuid,
    String,
    String,
    String,
    serde_json::Value,
    Option<serde_json::Value>,
    i64,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// Postgres-backed store over the `companies` and `research_results` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build a lazily-connecting pool. Only the URL is validated here; an
    /// unreachable server surfaces later as `StoreError::Unavailable` on each
    /// call, which the pipeline absorbs.
    pub fn connect_lazy(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)
            .map_err(map_err)?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

fn map_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => StoreError::Unavailable(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn row_to_company(row: CompanyRow) -> Company {
    let (id, name, domain, created_at, updated_at) = row;
    Company {
        id,
        name,
        domain,
        created_at,
        updated_at,
    }
}

fn row_to_job(row: JobRow) -> Result<ResearchJob, StoreError> {
    let (
        id,
        company_id,
        research_type,
        status,
        agent_workflow,
        input_data,
        output_data,
        processing_time_ms,
        cost_cents,
        created_at,
        updated_at,
    ) = row;
    let status: JobStatus = status.parse().map_err(StoreError::Serialization)?;
    Ok(ResearchJob {
        id,
        company_id,
        research_type,
        status,
        agent_workflow,
        input_data,
        output_data,
        processing_time_ms: processing_time_ms.max(0) as u64,
        cost_cents: cost_cents.max(0) as u64,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl ResearchStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT id, name, domain, created_at, updated_at
            FROM companies
            WHERE name = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(row.map(row_to_company))
    }

    async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, domain, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.domain)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn list_companies(&self, limit: u32, offset: u32) -> Result<Vec<Company>, StoreError> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT id, name, domain, created_at, updated_at
            FROM companies
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(rows.into_iter().map(row_to_company).collect())
    }

    async fn count_companies(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(count.max(0) as u64)
    }

    async fn insert_job(&self, job: &ResearchJob) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO research_results (
                id, company_id, research_type, status, agent_workflow,
                input_data, output_data, processing_time_ms, cost_cents,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(job.id)
        .bind(job.company_id)
        .bind(&job.research_type)
        .bind(job.status.as_str())
        .bind(&job.agent_workflow)
        .bind(&job.input_data)
        .bind(&job.output_data)
        .bind(to_i64(job.processing_time_ms))
        .bind(to_i64(job.cost_cents))
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn update_job(&self, id: Uuid, update: &JobUpdate) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE research_results
            SET status = $2,
                output_data = $3,
                processing_time_ms = COALESCE($4, processing_time_ms),
                cost_cents = COALESCE($5, cost_cents),
                updated_at = $6
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(update.status.as_str())
        .bind(&update.output_data)
        .bind(update.processing_time_ms.map(to_i64))
        .bind(update.cost_cents.map(to_i64))
        .bind(update.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.get_job(id).await? {
            None => Err(StoreError::NotFound(id)),
            Some(job) => Err(StoreError::Query(format!(
                "research {id} is already {}",
                job.status
            ))),
        }
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<ResearchJob>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, company_id, research_type, status, agent_workflow,
                   input_data, output_data, processing_time_ms, cost_cents,
                   created_at, updated_at
            FROM research_results
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        row.map(row_to_job).transpose()
    }
}
