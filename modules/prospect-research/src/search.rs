use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::future::join_all;
use regex::Regex;
use serper_client::{OrganicResult, SearchResponse, SerperClient, DEFAULT_NUM_RESULTS};
use thiserror::Error;
use tracing::{info, warn};

use prospect_common::AppConfig;

use crate::bundle::{QueryOutcome, SearchBundle};

pub const DEFAULT_NEWS_LOOKBACK_DAYS: u32 = 30;
const MAX_NEWS_ITEMS: usize = 10;
const PEOPLE_PER_QUERY: usize = 3;
const MAX_PEOPLE_ITEMS: usize = 10;

static RELATIVE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s+(minute|hour|day|week|month|year)s?\s+ago$")
        .expect("relative date regex is valid")
});

// --- WebSearcher trait ---

/// One ranked web search. The single network primitive every query in this
/// module goes through.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, num: u32) -> Result<SearchResponse>;
}

#[async_trait]
impl WebSearcher for SerperClient {
    async fn search(&self, query: &str, num: u32) -> Result<SearchResponse> {
        Ok(SerperClient::search(self, query, num).await?)
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search provider is not configured")]
    NotConfigured,

    #[error("all {attempted} search queries failed")]
    AllQueriesFailed { attempted: usize },
}

// --- SearchProvider ---

/// Runs the fixed query battery for a company against a [`WebSearcher`].
/// Unconfigured when built without a searcher; callers check
/// [`SearchProvider::is_configured`] before gathering.
#[derive(Clone)]
pub struct SearchProvider {
    searcher: Option<Arc<dyn WebSearcher>>,
    news_lookback_days: u32,
}

impl SearchProvider {
    pub fn new(searcher: Arc<dyn WebSearcher>) -> Self {
        Self {
            searcher: Some(searcher),
            news_lookback_days: DEFAULT_NEWS_LOOKBACK_DAYS,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            searcher: None,
            news_lookback_days: DEFAULT_NEWS_LOOKBACK_DAYS,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let provider = match config.serper_api_key.as_deref() {
            Some(key) => match SerperClient::new(key.to_string()) {
                Ok(client) => Self::new(Arc::new(client)),
                Err(e) => {
                    warn!(error = %e, "Failed to build Serper client, search disabled");
                    Self::unconfigured()
                }
            },
            None => {
                warn!("SERPER_API_KEY not set, research will run on synthetic data");
                Self::unconfigured()
            }
        };
        provider.with_news_lookback_days(config.news_lookback_days)
    }

    pub fn with_news_lookback_days(mut self, days: u32) -> Self {
        self.news_lookback_days = days.max(1);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.searcher.is_some()
    }

    /// Run the full battery: company queries, recent news and people.
    /// Individual query failures are recorded and skipped; only when every
    /// query failed does this return an error.
    pub async fn gather(
        &self,
        company_name: &str,
        domain: Option<&str>,
    ) -> std::result::Result<SearchBundle, SearchError> {
        if !self.is_configured() {
            return Err(SearchError::NotConfigured);
        }

        let (company_search, news, people) = tokio::join!(
            self.search_company(company_name, domain),
            self.news_query(company_name, self.news_lookback_days),
            self.people_queries(company_name),
        );

        let attempted = company_search.len() + 1 + people.attempted;
        let failed = company_search.values().filter(|o| o.is_error()).count()
            + usize::from(news.is_err())
            + people.failed;
        if failed == attempted {
            return Err(SearchError::AllQueriesFailed { attempted });
        }

        let recent_news = news.unwrap_or_else(|e| {
            warn!(company_name, error = %e, "News search failed");
            Vec::new()
        });

        info!(
            company_name,
            queries = attempted,
            failed,
            news = recent_news.len(),
            people = people.results.len(),
            "Search data gathered"
        );

        Ok(SearchBundle {
            company_search,
            recent_news,
            leadership_info: people.results,
            fetched_at: Utc::now(),
            degraded: false,
        })
    }

    /// Company battery keyed by label. Each query's failure is stored as an
    /// error marker under its own label.
    pub async fn search_company(
        &self,
        company_name: &str,
        domain: Option<&str>,
    ) -> BTreeMap<String, QueryOutcome> {
        let queries = company_queries(company_name, domain);
        let outcomes = join_all(queries.iter().map(|(_, q)| self.perform(q))).await;

        queries
            .into_iter()
            .zip(outcomes)
            .map(|((label, query), outcome)| {
                let outcome = match outcome {
                    Ok(results) => {
                        info!(query = %query, count = results.organic.len(), "Search succeeded");
                        QueryOutcome::Results(results)
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "Search failed");
                        QueryOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                (label.to_string(), outcome)
            })
            .collect()
    }

    /// Recent news, most recent first, top 10. Empty on failure.
    pub async fn search_news(&self, company_name: &str, days: u32) -> Vec<OrganicResult> {
        match self.news_query(company_name, days).await {
            Ok(items) => items,
            Err(e) => {
                warn!(company_name, error = %e, "News search failed");
                Vec::new()
            }
        }
    }

    /// Leadership mentions: top 3 from each people query, top 10 overall.
    pub async fn search_people(&self, company_name: &str) -> Vec<OrganicResult> {
        self.people_queries(company_name).await.results
    }

    async fn news_query(&self, company_name: &str, days: u32) -> Result<Vec<OrganicResult>> {
        let query = format!("{company_name} news recent updates past {days} days");
        let results = self.perform(&query).await?;
        let mut items = sort_most_recent_first(results.organic, Utc::now());
        items.truncate(MAX_NEWS_ITEMS);
        Ok(items)
    }

    async fn people_queries(&self, company_name: &str) -> PeopleResults {
        let queries = [
            format!("{company_name} CEO founder leadership team"),
            format!("{company_name} executives management team"),
            format!("{company_name} board of directors"),
        ];
        let outcomes = join_all(queries.iter().map(|q| self.perform(q))).await;

        let mut results = Vec::new();
        let mut failed = 0;
        for (query, outcome) in queries.iter().zip(outcomes) {
            match outcome {
                Ok(resp) => results.extend(resp.organic.into_iter().take(PEOPLE_PER_QUERY)),
                Err(e) => {
                    warn!(query = %query, error = %e, "People search failed");
                    failed += 1;
                }
            }
        }
        results.truncate(MAX_PEOPLE_ITEMS);

        PeopleResults {
            results,
            attempted: queries.len(),
            failed,
        }
    }

    async fn perform(&self, query: &str) -> Result<SearchResponse> {
        let searcher = self
            .searcher
            .as_ref()
            .ok_or(SearchError::NotConfigured)?;
        searcher.search(query, DEFAULT_NUM_RESULTS).await
    }
}

struct PeopleResults {
    results: Vec<OrganicResult>,
    attempted: usize,
    failed: usize,
}

/// Labelled company queries. The `site` query only runs with a domain.
pub fn company_queries(company_name: &str, domain: Option<&str>) -> Vec<(&'static str, String)> {
    let mut queries = vec![
        ("overview", format!("{company_name} company overview")),
        ("news", format!("{company_name} recent news")),
        ("leadership", format!("{company_name} leadership team executives")),
        ("funding", format!("{company_name} funding revenue business model")),
    ];
    if let Some(domain) = domain {
        queries.push(("site", format!("site:{domain} about company")));
    }
    queries
}

/// Stable sort: dated items newest first, undated items after them in their
/// original rank order.
fn sort_most_recent_first(items: Vec<OrganicResult>, now: DateTime<Utc>) -> Vec<OrganicResult> {
    let mut dated: Vec<(Option<DateTime<Utc>>, OrganicResult)> = items
        .into_iter()
        .map(|item| (item.date.as_deref().and_then(|d| published_at(d, now)), item))
        .collect();

    dated.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    dated.into_iter().map(|(_, item)| item).collect()
}

/// Parse the date strings Google attaches to results: "3 days ago" or
/// "Jan 5, 2024".
fn published_at(date: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let date = date.trim();
    if let Some(caps) = RELATIVE_DATE_RE.captures(date) {
        let n: i64 = caps[1].parse::<i64>().ok()?.min(10_000);
        let age = match caps[2].to_lowercase().as_str() {
            "minute" => Duration::minutes(n),
            "hour" => Duration::hours(n),
            "day" => Duration::days(n),
            "week" => Duration::weeks(n),
            "month" => Duration::days(n * 30),
            _ => Duration::days(n * 365),
        };
        return Some(now - age);
    }
    NaiveDate::parse_from_str(date, "%b %d, %Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{response, MockSearcher};

    fn dated(title: &str, date: Option<&str>) -> OrganicResult {
        OrganicResult {
            title: title.into(),
            date: date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn site_query_only_with_domain() {
        assert_eq!(company_queries("Acme", None).len(), 4);
        let with_domain = company_queries("Acme", Some("acme.com"));
        assert_eq!(with_domain.len(), 5);
        assert_eq!(with_domain[4], ("site", "site:acme.com about company".to_string()));
    }

    #[test]
    fn parses_relative_and_absolute_dates() {
        let now = Utc::now();
        assert_eq!(published_at("3 days ago", now), Some(now - Duration::days(3)));
        assert_eq!(published_at("1 hour ago", now), Some(now - Duration::hours(1)));
        assert!(published_at("Jan 5, 2024", now).is_some());
        assert!(published_at("sometime", now).is_none());
    }

    #[test]
    fn news_sorted_newest_first_undated_last() {
        let now = Utc::now();
        let items = vec![
            dated("undated", None),
            dated("old", Some("Jan 5, 2020")),
            dated("fresh", Some("2 hours ago")),
            dated("week", Some("1 week ago")),
        ];
        let titles: Vec<_> = sort_most_recent_first(items, now)
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["fresh", "week", "old", "undated"]);
    }

    #[tokio::test]
    async fn unconfigured_provider_refuses_to_gather() {
        let provider = SearchProvider::unconfigured();
        assert!(!provider.is_configured());
        assert!(matches!(
            provider.gather("Acme", None).await,
            Err(SearchError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn news_is_capped_at_ten() {
        let many: Vec<(String, String)> = (0..15)
            .map(|i| (format!("Acme story {i}"), String::new()))
            .collect();
        let refs: Vec<(&str, &str)> = many.iter().map(|(t, s)| (t.as_str(), s.as_str())).collect();
        let searcher = MockSearcher::new().with_default(response(&refs));
        let provider = SearchProvider::new(Arc::new(searcher));

        assert_eq!(provider.search_news("Acme", 30).await.len(), 10);
    }

    #[tokio::test]
    async fn people_take_three_per_query() {
        let searcher = MockSearcher::new().with_default(response(&[
            ("Jane Doe, CEO", ""),
            ("John Roe, CTO", ""),
            ("Ann Poe, CFO", ""),
            ("Extra Person, COO", ""),
        ]));
        let provider = SearchProvider::new(Arc::new(searcher));

        // 3 queries x top 3
        assert_eq!(provider.search_people("Acme").await.len(), 9);
    }

    #[tokio::test]
    async fn news_failure_yields_empty_list() {
        let searcher = MockSearcher::new()
            .with_default(response(&[("x", "y")]))
            .fail_on("news recent updates");
        let provider = SearchProvider::new(Arc::new(searcher));
        assert!(provider.search_news("Acme", 30).await.is_empty());
    }

    #[tokio::test]
    async fn lookback_days_reach_the_query() {
        let searcher = Arc::new(MockSearcher::new().with_default(response(&[("x", "y")])));
        let provider = SearchProvider::new(searcher.clone()).with_news_lookback_days(7);
        provider.gather("Acme", None).await.unwrap();
        assert!(searcher
            .queries()
            .iter()
            .any(|q| q == "Acme news recent updates past 7 days"));
    }

    #[tokio::test]
    async fn every_query_failing_is_an_error() {
        let searcher = MockSearcher::new().fail_on("");
        let provider = SearchProvider::new(Arc::new(searcher));
        let err = provider.gather("Acme", Some("acme.com")).await.unwrap_err();
        // 5 company + 1 news + 3 people
        assert!(matches!(err, SearchError::AllQueriesFailed { attempted: 9 }));
    }
}
