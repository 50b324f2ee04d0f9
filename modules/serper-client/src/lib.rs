pub mod error;
pub mod types;

pub use error::{Result, SerperError};
pub use types::{KnowledgeGraph, OrganicResult, SearchRequest, SearchResponse};

use std::time::Duration;

const BASE_URL: &str = "https://google.serper.dev";

/// Per-request timeout for a single ranked search.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of results requested per query.
pub const DEFAULT_NUM_RESULTS: u32 = 10;

pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerperClient {
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(SerperError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host (self-hosted proxy, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run one ranked web search. Any non-2xx status is returned as
    /// [`SerperError::Api`] with the response body as the message.
    pub async fn search(&self, query: &str, num: u32) -> Result<SearchResponse> {
        tracing::debug!(query, num, "Serper search");

        let url = format!("{}/search", self.base_url);
        let body = SearchRequest {
            q: query.to_string(),
            num,
        };
        let resp = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SerperError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?;
        let parsed: SearchResponse = serde_json::from_slice(&bytes)?;
        tracing::debug!(query, count = parsed.organic.len(), "Serper search complete");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_is_not_configured() {
        assert!(matches!(
            SerperClient::new("  ".to_string()),
            Err(SerperError::NotConfigured)
        ));
    }

    // --- HTTP behaviour against a local server ---

    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};

    type Seen = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn serve(status: StatusCode, reply: serde_json::Value) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route(
                "/search",
                post(
                    move |State(seen): State<Seen>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let key = headers
                            .get("x-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        seen.lock().unwrap().push((key, body));
                        (status, Json(reply))
                    },
                ),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn success_parses_results_and_sends_key_and_body() {
        let reply = serde_json::json!({
            "organic": [{"title": "Acme Corp", "link": "https://acme.com", "snippet": "Workflow SaaS", "position": 1}]
        });
        let (base, seen) = serve(StatusCode::OK, reply).await;
        let client = SerperClient::new("secret-key".to_string())
            .unwrap()
            .with_base_url(base);

        let resp = client.search("Acme Corp company overview", 5).await.unwrap();

        assert_eq!(resp.organic.len(), 1);
        assert_eq!(resp.organic[0].link, "https://acme.com");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("secret-key"));
        assert_eq!(
            seen[0].1,
            serde_json::json!({"q": "Acme Corp company overview", "num": 5})
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error_with_body() {
        let (base, _seen) = serve(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({"message": "upstream down"}),
        )
        .await;
        let client = SerperClient::new("secret-key".to_string())
            .unwrap()
            .with_base_url(base);

        match client.search("Acme", 10).await {
            Err(SerperError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert!(message.contains("upstream down"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let (base, _seen) = serve(StatusCode::OK, serde_json::json!({"organic": "nope"})).await;
        let client = SerperClient::new("k".to_string()).unwrap().with_base_url(base);

        assert!(matches!(
            client.search("Acme", 10).await,
            Err(SerperError::Parse(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = SerperClient::new("key".to_string())
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
