pub mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use prospect_common::{JobStatus, ResearchError, ResearchRequest};

use crate::routes::AppState;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn parse_research_id(raw: &str) -> Result<Uuid, axum::response::Response> {
    Uuid::parse_str(raw)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("Invalid research id: {raw}")))
}

// --- Research ---

pub async fn api_research_company(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<ResearchRequest>,
) -> impl IntoResponse {
    let ip = addr.ip();
    {
        let mut limiter = state.rate_limiter.lock().await;
        let max = state.config.max_requests_per_minute;
        if !rate_limit::admit(&mut limiter, ip, Instant::now(), max) {
            warn!(%ip, "Research rate limit exceeded");
            return error_response(
                StatusCode::TOO_MANY_REQUESTS,
                format!("Rate limit exceeded, max {max} requests per minute"),
            );
        }
    }

    match state.orchestrator.run(&body).await {
        Ok(result) => {
            info!(research_id = %result.research_id, "Research request served");
            Json(json!({
                "research_id": result.research_id,
                "company_id": result.company_id,
                "status": result.status,
                "message": format!("Research completed for {}", result.company_name),
            }))
            .into_response()
        }
        Err(ResearchError::Input(message)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, message)
        }
        Err(ResearchError::Pipeline {
            research_id,
            message,
        }) => {
            warn!(%research_id, error = %message, "Research pipeline failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Research failed",
                    "research_id": research_id,
                    "detail": message,
                })),
            )
                .into_response()
        }
    }
}

pub async fn api_research_results(
    State(state): State<Arc<AppState>>,
    Path(research_id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_research_id(&research_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let job = match state.orchestrator.ledger().get(id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, format!("Research {id} not found"));
        }
        Err(e) => {
            warn!(research_id = %id, error = %e, "Failed to load research results");
            return error_response(StatusCode::SERVICE_UNAVAILABLE, "Research store unavailable");
        }
    };

    match job.status {
        JobStatus::Completed => {
            Json(job.output_data.unwrap_or_else(|| json!({}))).into_response()
        }
        JobStatus::Failed => {
            let error = job
                .output_data
                .as_ref()
                .and_then(|o| o.get("error"))
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            Json(json!({
                "research_id": job.id,
                "status": job.status,
                "error": error,
                "updated_at": job.updated_at,
            }))
            .into_response()
        }
        JobStatus::Processing => (
            StatusCode::ACCEPTED,
            Json(json!({
                "research_id": job.id,
                "status": job.status,
                "progress": job.status.progress(),
            })),
        )
            .into_response(),
    }
}

pub async fn api_research_status(
    State(state): State<Arc<AppState>>,
    Path(research_id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_research_id(&research_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.orchestrator.ledger().get(id).await {
        Ok(Some(job)) => Json(json!({
            "research_id": job.id,
            "status": job.status,
            "progress": job.status.progress(),
            "created_at": job.created_at,
            "updated_at": job.updated_at,
        }))
        .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Research {id} not found")),
        Err(e) => {
            warn!(research_id = %id, error = %e, "Failed to load research status");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Research store unavailable")
        }
    }
}

// --- Companies ---

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

pub async fn api_companies(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> impl IntoResponse {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = page.offset.unwrap_or(0);

    match state.orchestrator.directory().list(limit, offset).await {
        Ok((companies, count)) => Json(json!({
            "companies": companies,
            "count": count,
            "limit": limit,
            "offset": offset,
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to list companies");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Research store unavailable")
        }
    }
}

// --- Service ---

pub async fn api_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.store.ping().await {
        Ok(()) => "ready",
        Err(e) => {
            warn!(error = %e, "Health check: store unreachable");
            "unavailable"
        }
    };
    let search = if state.orchestrator.search().is_configured() {
        "configured"
    } else {
        "not_configured"
    };

    Json(json!({
        "api": "healthy",
        "database": database,
        "search": search,
        "environment": state.config.environment,
        "version": VERSION,
    }))
}

pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "message": "Prospect research API",
        "status": "running",
        "version": VERSION,
    }))
}
