use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use prospect_api::routes::{self, AppState};
use prospect_common::{AppConfig, ResearchRequest};
use prospect_research::{MemoryStore, PgStore, ResearchOrchestrator, ResearchStore, SearchProvider};

#[derive(Parser)]
#[command(name = "prospect-api", about = "Company research API for sales prospecting")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Research one company and print the result as JSON
    Research {
        #[arg(long)]
        company: String,
        #[arg(long)]
        domain: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    config.log_keys();

    let store = open_store(&config).await?;
    let search = SearchProvider::from_config(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(store, search, config).await,
        Command::Research { company, domain } => {
            let orchestrator = ResearchOrchestrator::with_rule_based(store, search);
            let result = orchestrator
                .run(&ResearchRequest::new(company, domain.as_deref()))
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

/// Postgres when `DATABASE_URL` is set, otherwise an in-process store.
/// An unreachable database does not stop startup; calls degrade one by one.
async fn open_store(config: &AppConfig) -> Result<Arc<dyn ResearchStore>> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let store = PgStore::connect_lazy(url).context("Invalid DATABASE_URL")?;
    match store.migrate().await {
        Ok(()) => info!("Migrations complete"),
        Err(e) => warn!(error = %e, "Migrations failed, database writes will degrade"),
    }
    Ok(Arc::new(store))
}

async fn serve(store: Arc<dyn ResearchStore>, search: SearchProvider, config: AppConfig) -> Result<()> {
    let addr = format!("{}:{}", config.api_host, config.api_port);
    let state = Arc::new(AppState::new(store, search, config));
    let app = routes::build_router(state);

    info!("Prospect API starting on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
