mod lexicon;
mod rules;

pub use rules::RuleBasedExtractor;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bundle::SearchBundle;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Malformed analysis input: {0}")]
    Malformed(String),
}

/// Turns a search bundle into structured sales insights.
///
/// Implementations must be pure with respect to their inputs: the same
/// bundle yields the same insights.
pub trait InsightExtractor: Send + Sync {
    fn extract(&self, company_name: &str, bundle: &SearchBundle)
        -> Result<Insights, ExtractionError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub company_profile: CompanyProfile,
    pub business_intelligence: BusinessIntelligence,
    pub recent_activity: RecentActivity,
    pub leadership_team: LeadershipTeam,
    pub outreach_opportunities: OutreachOpportunities,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub industry: String,
    pub size_estimate: String,
    pub location: String,
    pub description: String,
    pub founded: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessModel {
    #[serde(rename = "type")]
    pub model_type: String,
    pub revenue_streams: Vec<String>,
    pub target_market: String,
    pub pricing_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessIntelligence {
    pub business_model: BusinessModel,
    /// Revenue streams joined for display, or "Unknown".
    pub revenue_model: String,
    pub competitive_advantages: Vec<String>,
    pub market_challenges: Vec<String>,
    pub market_opportunities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub news_summary: String,
    pub key_updates: Vec<String>,
    pub funding_activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Executive {
    pub name: String,
    pub title: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionMaker {
    pub name: String,
    pub title: String,
    pub contact_priority: ContactPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadershipTeam {
    pub key_executives: Vec<Executive>,
    pub leadership_changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachOpportunities {
    pub pain_points: Vec<String>,
    pub timing_triggers: Vec<String>,
    pub decision_makers: Vec<DecisionMaker>,
}

/// Data completeness: 0.4 for company search, 0.3 each for news and
/// leadership. Always within [0, 1].
pub fn confidence_score(bundle: &SearchBundle) -> f64 {
    let mut points: u32 = 0;
    if !bundle.company_search.is_empty() {
        points += 4;
    }
    if !bundle.recent_news.is_empty() {
        points += 3;
    }
    if !bundle.leadership_info.is_empty() {
        points += 3;
    }
    (f64::from(points) / 10.0).min(1.0)
}
