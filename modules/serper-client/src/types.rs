use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request body for the `/search` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub q: String,
    pub num: u32,
}

/// Ranked results for one query. Fields we don't use (`peopleAlsoAsk`,
/// `relatedSearches`, credits) are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub organic: Vec<OrganicResult>,
    #[serde(
        rename = "knowledgeGraph",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub knowledge_graph: Option<KnowledgeGraph>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.organic.is_empty() && self.knowledge_graph.is_none()
    }
}

/// A single organic (non-ad) search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Entity panel Google shows for well-known organisations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Free-form facts, e.g. `"Headquarters": "Austin, TX"`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_organic_and_knowledge_graph() {
        let raw = r#"{
            "searchParameters": {"q": "Acme Corp company overview", "num": 10},
            "knowledgeGraph": {
                "title": "Acme Corp",
                "type": "Software company",
                "description": "Acme builds workflow software.",
                "attributes": {"Headquarters": "Austin, TX", "Founded": "2009"}
            },
            "organic": [
                {"title": "Acme Corp - Home", "link": "https://acme.com", "snippet": "Workflow SaaS", "position": 1},
                {"title": "Acme on LinkedIn", "link": "https://linkedin.com/company/acme", "position": 2}
            ],
            "credits": 1
        }"#;

        let resp: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.organic.len(), 2);
        assert_eq!(resp.organic[1].snippet, "");
        let kg = resp.knowledge_graph.unwrap();
        assert_eq!(kg.entity_type.as_deref(), Some("Software company"));
        assert_eq!(kg.attributes.get("Headquarters").map(String::as_str), Some("Austin, TX"));
    }

    #[test]
    fn missing_organic_is_empty() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.is_empty());
    }
}
