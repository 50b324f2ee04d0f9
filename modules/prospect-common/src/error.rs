use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced to callers of the research pipeline.
///
/// Dependency and persistence failures never appear here: they are absorbed
/// where they happen and the run continues degraded.
#[derive(Error, Debug)]
pub enum ResearchError {
    /// Missing or malformed request fields. Raised before any job is opened.
    #[error("Invalid input: {0}")]
    Input(String),

    /// The pipeline itself broke after the job was opened. The job has been
    /// marked failed (best-effort) under `research_id`.
    #[error("Research {research_id} failed: {message}")]
    Pipeline { research_id: Uuid, message: String },
}

impl ResearchError {
    pub fn research_id(&self) -> Option<Uuid> {
        match self {
            ResearchError::Input(_) => None,
            ResearchError::Pipeline { research_id, .. } => Some(*research_id),
        }
    }
}

/// Errors from the persistence store. Callers in the pipeline log these and
/// carry on; only the read-side HTTP handlers turn them into responses.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Record not found: {0}")]
    NotFound(Uuid),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
