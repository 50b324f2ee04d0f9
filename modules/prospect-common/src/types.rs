use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ResearchError;

/// Research type tag for the single workflow this service runs.
pub const RESEARCH_TYPE_COMPANY: &str = "company_research";

/// Name recorded as the workflow that produced a research job.
pub const AGENT_WORKFLOW: &str = "company_research";

pub const MAX_COMPANY_NAME_CHARS: usize = 100;

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$")
        .expect("domain regex is valid")
});

// --- Companies ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub domain: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: &str, domain: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            domain: domain.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }
}

// --- Research jobs ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }

    /// Coarse progress percentage reported by the status endpoint.
    pub fn progress(&self) -> u8 {
        match self {
            JobStatus::Processing => 50,
            JobStatus::Completed | JobStatus::Failed => 100,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// One execution of the research workflow for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchJob {
    pub id: Uuid,
    pub company_id: Uuid,
    pub research_type: String,
    pub status: JobStatus,
    pub agent_workflow: String,
    pub input_data: serde_json::Value,
    pub output_data: Option<serde_json::Value>,
    pub processing_time_ms: u64,
    pub cost_cents: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchJob {
    /// A freshly opened job in `processing` state.
    pub fn open(company_id: Uuid, research_type: &str, input_data: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            company_id,
            research_type: research_type.to_string(),
            status: JobStatus::Processing,
            agent_workflow: AGENT_WORKFLOW.to_string(),
            input_data,
            output_data: None,
            processing_time_ms: 0,
            cost_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &JobUpdate) {
        self.status = update.status;
        self.output_data = Some(update.output_data.clone());
        if let Some(ms) = update.processing_time_ms {
            self.processing_time_ms = ms;
        }
        if let Some(cents) = update.cost_cents {
            self.cost_cents = cents;
        }
        self.updated_at = update.updated_at;
    }
}

/// Terminal transition written to an open job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub output_data: serde_json::Value,
    pub processing_time_ms: Option<u64>,
    pub cost_cents: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

impl JobUpdate {
    pub fn completed(output: serde_json::Value, processing_time_ms: u64, cost_cents: u64) -> Self {
        Self {
            status: JobStatus::Completed,
            output_data: output,
            processing_time_ms: Some(processing_time_ms),
            cost_cents: Some(cost_cents),
            updated_at: Utc::now(),
        }
    }

    pub fn failed(error_message: &str) -> Self {
        let now = Utc::now();
        Self {
            status: JobStatus::Failed,
            output_data: serde_json::json!({
                "error": error_message,
                "timestamp": now.to_rfc3339(),
            }),
            processing_time_ms: None,
            cost_cents: None,
            updated_at: now,
        }
    }
}

// --- Requests ---

/// Raw research request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

impl ResearchRequest {
    pub fn new(company_name: impl Into<String>, domain: Option<&str>) -> Self {
        Self {
            company_name: Some(company_name.into()),
            domain: domain.map(str::to_string),
        }
    }

    pub fn validate(&self) -> Result<ValidatedRequest, ResearchError> {
        let company_name = self
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResearchError::Input("Missing required inputs: [\"company_name\"]".into()))?;

        if company_name.chars().count() > MAX_COMPANY_NAME_CHARS {
            return Err(ResearchError::Input(format!(
                "company_name must be at most {MAX_COMPANY_NAME_CHARS} characters"
            )));
        }

        let domain = match self.domain.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(d) if DOMAIN_RE.is_match(d) => Some(d.to_lowercase()),
            Some(d) => {
                return Err(ResearchError::Input(format!("domain is not a valid hostname: {d}")));
            }
        };

        Ok(ValidatedRequest {
            company_name: company_name.to_string(),
            domain,
        })
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRequest {
    pub company_name: String,
    pub domain: Option<String>,
}
