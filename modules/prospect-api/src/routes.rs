use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use prospect_common::AppConfig;
use prospect_research::{ResearchOrchestrator, ResearchStore, SearchProvider};

use crate::rest;

pub struct AppState {
    pub orchestrator: ResearchOrchestrator,
    pub store: Arc<dyn ResearchStore>,
    pub config: AppConfig,
    pub rate_limiter: Mutex<HashMap<IpAddr, Vec<Instant>>>,
}

impl AppState {
    /// Wire the rule-based pipeline over `store` and `search`.
    pub fn new(store: Arc<dyn ResearchStore>, search: SearchProvider, config: AppConfig) -> Self {
        Self {
            orchestrator: ResearchOrchestrator::with_rule_based(store.clone(), search),
            store,
            config,
            rate_limiter: Mutex::new(HashMap::new()),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = if state.config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/", get(rest::api_root))
        .route("/health", get(rest::api_health))
        .route("/research/company", post(rest::api_research_company))
        .route("/research/{research_id}/results", get(rest::api_research_results))
        .route("/research/{research_id}/status", get(rest::api_research_status))
        .route("/companies", get(rest::api_companies))
        .with_state(state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path only; no query params, no client address
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
