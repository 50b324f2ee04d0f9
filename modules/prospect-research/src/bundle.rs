use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serper_client::{OrganicResult, SearchResponse};

/// Result of one query in the company battery: either the ranked results or
/// the error that query hit. One failed query never sinks the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    // Must stay first: `SearchResponse` fields are all defaulted and would
    // swallow `{"error": ..}` on deserialization otherwise.
    Failed { error: String },
    Results(SearchResponse),
}

impl QueryOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryOutcome::Failed { .. })
    }

    pub fn results(&self) -> Option<&SearchResponse> {
        match self {
            QueryOutcome::Results(r) => Some(r),
            QueryOutcome::Failed { .. } => None,
        }
    }
}

/// Raw web-search data gathered for one research run. Never persisted on its
/// own; it travels inside the result as `raw_search_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBundle {
    /// Keyed by query label (`overview`, `news`, `leadership`, `funding`, `site`).
    pub company_search: BTreeMap<String, QueryOutcome>,
    /// Most recent first, capped.
    pub recent_news: Vec<OrganicResult>,
    pub leadership_info: Vec<OrganicResult>,
    pub fetched_at: DateTime<Utc>,
    /// Set when the data is synthetic because the provider was unavailable.
    pub degraded: bool,
}

impl SearchBundle {
    /// Placeholder bundle used when real search is unconfigured or failed.
    /// It populates all three sections so downstream extraction has
    /// something to work with.
    pub fn synthetic(company_name: &str, domain: Option<&str>) -> Self {
        let overview = OrganicResult {
            title: format!("{company_name} - Company Overview"),
            link: domain.map(|d| format!("https://{d}")).unwrap_or_default(),
            snippet: format!("Mock overview for {company_name}"),
            ..Default::default()
        };

        let mut company_search = BTreeMap::new();
        company_search.insert(
            "overview".to_string(),
            QueryOutcome::Results(SearchResponse {
                organic: vec![overview],
                knowledge_graph: None,
            }),
        );

        Self {
            company_search,
            recent_news: vec![
                hit(&format!("{company_name} announces new product"), "Mock news article"),
                hit(&format!("{company_name} raises funding"), "Mock funding news"),
            ],
            leadership_info: vec![hit(
                &format!("{company_name} leadership team"),
                "Mock leadership information",
            )],
            fetched_at: Utc::now(),
            degraded: true,
        }
    }

    /// Organic results from every query that succeeded, in label order.
    pub fn company_results(&self) -> impl Iterator<Item = &OrganicResult> {
        self.company_search
            .values()
            .filter_map(QueryOutcome::results)
            .flat_map(|r| r.organic.iter())
    }

    pub fn outcome(&self, label: &str) -> Option<&SearchResponse> {
        self.company_search.get(label).and_then(QueryOutcome::results)
    }

    pub fn failed_queries(&self) -> usize {
        self.company_search.values().filter(|o| o.is_error()).count()
    }
}

fn hit(title: &str, snippet: &str) -> OrganicResult {
    OrganicResult {
        title: title.to_string(),
        snippet: snippet.to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_bundle_is_degraded_and_populated() {
        let bundle = SearchBundle::synthetic("Acme Corp", Some("acme.com"));
        assert!(bundle.degraded);
        assert_eq!(bundle.company_search.len(), 1);
        assert_eq!(bundle.recent_news.len(), 2);
        assert_eq!(bundle.leadership_info.len(), 1);
        assert_eq!(
            bundle.outcome("overview").unwrap().organic[0].link,
            "https://acme.com"
        );
    }

    #[test]
    fn failed_outcome_survives_serde() {
        let outcome = QueryOutcome::Failed {
            error: "API error (status 500): down".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"error": "API error (status 500): down"}));
        let back: QueryOutcome = serde_json::from_value(json).unwrap();
        assert!(back.is_error());
    }

    #[test]
    fn company_results_skip_failed_queries() {
        let mut bundle = SearchBundle::synthetic("Acme", None);
        bundle.company_search.insert(
            "funding".into(),
            QueryOutcome::Failed {
                error: "timeout".into(),
            },
        );
        assert_eq!(bundle.company_results().count(), 1);
        assert_eq!(bundle.failed_queries(), 1);
    }
}
