use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// Every external dependency is optional: a missing search key or database
/// URL switches the pipeline into its degraded path instead of failing
/// startup. Values that are present but unparsable are startup errors.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Search provider
    pub serper_api_key: Option<String>,
    pub news_lookback_days: u32,

    // Persistence
    pub database_url: Option<String>,

    // Logging / deployment
    pub log_level: String,
    pub environment: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,
    pub allowed_origins: Vec<String>,
    pub max_requests_per_minute: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serper_api_key: None,
            news_lookback_days: 30,
            database_url: None,
            log_level: "info".to_string(),
            environment: "development".to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_requests_per_minute: 60,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is this over
    /// `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            serper_api_key: get("SERPER_API_KEY"),
            news_lookback_days: match get("NEWS_LOOKBACK_DAYS") {
                Some(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("NEWS_LOOKBACK_DAYS must be a number, got {v:?}"))?,
                None => defaults.news_lookback_days,
            },
            database_url: get("DATABASE_URL"),
            log_level: get("LOG_LEVEL")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or(defaults.log_level),
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            api_host: get("API_HOST").unwrap_or(defaults.api_host),
            api_port: match get("API_PORT") {
                Some(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("API_PORT must be a port number, got {v:?}"))?,
                None => defaults.api_port,
            },
            allowed_origins: match get("ALLOWED_ORIGINS") {
                Some(v) => v
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                None => defaults.allowed_origins,
            },
            max_requests_per_minute: match get("MAX_REQUESTS_PER_MINUTE") {
                Some(v) => v
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .with_context(|| {
                        format!("MAX_REQUESTS_PER_MINUTE must be a positive number, got {v:?}")
                    })?,
                None => defaults.max_requests_per_minute,
            },
        };

        Ok(config)
    }

    pub fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.chars().take(5).map(char::len_utf8).sum::<usize>();
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  SERPER_API_KEY: {}", preview_opt(&self.serper_api_key));
        tracing::info!("  DATABASE_URL: {}", preview_opt(&self.database_url));
        tracing::info!("  ENVIRONMENT: {}", self.environment);
        tracing::info!("  LOG_LEVEL: {}", self.log_level);
        tracing::info!("  API: {}:{}", self.api_host, self.api_port);
    }
}
