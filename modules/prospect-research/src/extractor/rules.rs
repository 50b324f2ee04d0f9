use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serper_client::OrganicResult;
use tracing::debug;

use super::lexicon::{self, Table};
use super::{
    confidence_score, BusinessIntelligence, BusinessModel, CompanyProfile, ContactPriority,
    DecisionMaker, Executive, ExtractionError, InsightExtractor, Insights, LeadershipTeam,
    OutreachOpportunities, RecentActivity,
};
use crate::bundle::SearchBundle;

const UNKNOWN: &str = "Unknown";
const MAX_EXECUTIVES: usize = 10;
const MAX_KEY_UPDATES: usize = 5;

const NAME: &str = r"[A-Z][a-z]+(?:\s+[A-Z]\.)?(?:\s+[A-Z][a-zA-Z'\-]+){1,2}";
const TITLE: &str = r"(?:Chief [A-Z][a-z]+ Officer|Co-[Ff]ounder|Founder|Vice President(?: of [A-Z][a-z]+)?|VP(?: of [A-Z][a-z]+)?|Head of [A-Z][a-z]+|Managing Director|Director of [A-Z][a-z]+|President|Chairman|Chairwoman|Chair|CEO|CFO|CTO|COO|CMO|CRO|CPO)";

static NAME_THEN_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<name>{NAME}),?\s+(?:is\s+|as\s+|serves as\s+)?(?:the\s+)?(?:company's\s+)?(?P<title>{TITLE})\b"
    ))
    .unwrap()
});
static TITLE_THEN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?P<title>{TITLE}),?\s+(?P<name>{NAME})")).unwrap()
});
static EMPLOYEES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\+?\s+(?:employees|staff|people)").unwrap()
});
static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[Hh]eadquartered|[Bb]ased) in ([A-Z][a-zA-Z'\-]*(?:\s[A-Z][a-zA-Z'\-]*)*(?:,\s[A-Z][a-zA-Z'\-]*(?:\s[A-Z][a-zA-Z'\-]*)*)?)",
    )
    .unwrap()
});
static FOUNDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:founded|established)(?:\s+in)?\s+((?:18|19|20)\d{2})").unwrap()
});
static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:18|19|20)\d{2})\b").unwrap());

/// Words that disqualify a captured name.
const NAME_STOPWORDS: &[&str] = &[
    "the", "our", "meet", "team", "leadership", "board", "executive", "executives",
    "management", "company", "inc", "corp", "llc", "ltd", "chief", "officer", "president",
    "founder", "director", "vice", "head", "news", "about", "and",
];

/// Hosts that describe a company without being its site.
const AGGREGATOR_HOSTS: &[&str] = &[
    "linkedin.com",
    "wikipedia.org",
    "crunchbase.com",
    "bloomberg.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "youtube.com",
    "glassdoor.com",
    "zoominfo.com",
];

/// Keyword and pattern driven extractor. Deterministic: no I/O, no clock,
/// no randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedExtractor;

impl InsightExtractor for RuleBasedExtractor {
    fn extract(
        &self,
        company_name: &str,
        bundle: &SearchBundle,
    ) -> Result<Insights, ExtractionError> {
        let company_text = company_text(bundle);
        let news_text = joined_lower(bundle.recent_news.iter());
        let market_text = format!("{company_text} {news_text}");

        let company_profile = company_profile(company_name, bundle, &company_text);
        let business_model = business_model(&company_text);
        let funding = funding_headline(&bundle.recent_news);
        let leadership_changes = leadership_changes(&bundle.recent_news);
        let key_executives = executives(company_name, bundle);

        let recent_activity = RecentActivity {
            news_summary: news_summary(bundle.recent_news.len()),
            key_updates: bundle
                .recent_news
                .iter()
                .take(MAX_KEY_UPDATES)
                .map(|r| r.title.clone())
                .collect(),
            funding_activity: funding
                .clone()
                .unwrap_or_else(|| "No recent funding detected".to_string()),
        };

        let revenue_model = if business_model.revenue_streams.is_empty() {
            UNKNOWN.to_string()
        } else {
            business_model.revenue_streams.join(", ")
        };
        let business_intelligence = BusinessIntelligence {
            revenue_model,
            competitive_advantages: lexicon::all_matches(&market_text, lexicon::ADVANTAGES),
            market_challenges: lexicon::all_matches(&market_text, lexicon::CHALLENGES),
            market_opportunities: lexicon::all_matches(&market_text, lexicon::OPPORTUNITIES),
            business_model,
        };

        let signals = Signals {
            funding: funding.is_some(),
            leadership_changes: !leadership_changes.is_empty(),
            saas: business_intelligence.business_model.model_type == "B2B SaaS",
            challenges: &business_intelligence.market_challenges,
            opportunities: &business_intelligence.market_opportunities,
        };
        let outreach_opportunities = OutreachOpportunities {
            pain_points: signals.pain_points(),
            timing_triggers: signals.timing_triggers(),
            decision_makers: decision_makers(&key_executives),
        };

        debug!(
            company = company_name,
            industry = company_profile.industry.as_str(),
            executives = key_executives.len(),
            "Rule-based extraction complete"
        );

        Ok(Insights {
            company_profile,
            business_intelligence,
            recent_activity,
            leadership_team: LeadershipTeam {
                key_executives,
                leadership_changes,
            },
            outreach_opportunities,
            confidence_score: confidence_score(bundle),
        })
    }
}

// ---------------------------------------------------------------------------
// Company overview
// ---------------------------------------------------------------------------

fn company_text(bundle: &SearchBundle) -> String {
    let mut text = joined_lower(bundle.company_results());
    for kg in bundle
        .company_search
        .values()
        .filter_map(|o| o.results())
        .filter_map(|r| r.knowledge_graph.as_ref())
    {
        for part in [kg.entity_type.as_deref(), kg.description.as_deref()]
            .into_iter()
            .flatten()
        {
            text.push(' ');
            text.push_str(&part.to_lowercase());
        }
    }
    text
}

fn joined_lower<'a>(results: impl Iterator<Item = &'a OrganicResult>) -> String {
    results
        .map(|r| format!("{} {}", r.title, r.snippet))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Original-case title and snippet text of every successful company query.
fn raw_texts(bundle: &SearchBundle) -> Vec<&str> {
    bundle
        .company_results()
        .flat_map(|r| [r.snippet.as_str(), r.title.as_str()])
        .collect()
}

fn company_profile(company_name: &str, bundle: &SearchBundle, company_text: &str) -> CompanyProfile {
    let kg = bundle
        .company_search
        .values()
        .filter_map(|o| o.results())
        .find_map(|r| r.knowledge_graph.as_ref());
    let texts = raw_texts(bundle);

    let industry = kg
        .and_then(|kg| kg.entity_type.as_deref())
        .filter(|t| !t.trim().is_empty())
        .map(|t| {
            lexicon::vote(&t.to_lowercase(), lexicon::INDUSTRIES)
                .map(str::to_string)
                .unwrap_or_else(|| t.trim().to_string())
        })
        .or_else(|| lexicon::vote(company_text, lexicon::INDUSTRIES).map(str::to_string))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let employees = kg
        .and_then(|kg| attribute(&kg.attributes, "employees"))
        .and_then(parse_count)
        .or_else(|| {
            texts.iter().find_map(|t| {
                EMPLOYEES_RE
                    .captures(t)
                    .and_then(|c| parse_count(c.get(1)?.as_str()))
            })
        });

    let location = kg
        .and_then(|kg| attribute(&kg.attributes, "headquarters"))
        .map(str::to_string)
        .or_else(|| {
            texts.iter().find_map(|t| {
                LOCATION_RE
                    .captures(t)
                    .and_then(|c| Some(c.get(1)?.as_str().trim_end_matches('.').trim().to_string()))
            })
        })
        .unwrap_or_else(|| UNKNOWN.to_string());

    let founded = kg
        .and_then(|kg| attribute(&kg.attributes, "founded"))
        .and_then(|v| YEAR_RE.captures(v).and_then(|c| Some(c.get(1)?.as_str().to_string())))
        .or_else(|| {
            texts.iter().find_map(|t| {
                FOUNDED_RE
                    .captures(t)
                    .and_then(|c| Some(c.get(1)?.as_str().to_string()))
            })
        });

    let description = kg
        .and_then(|kg| kg.description.clone())
        .filter(|d| !d.trim().is_empty())
        .or_else(|| {
            bundle
                .outcome("overview")
                .and_then(|r| r.organic.iter().find(|o| !o.snippet.is_empty()))
                .map(|o| o.snippet.clone())
        })
        .or_else(|| {
            bundle
                .company_results()
                .find(|o| !o.snippet.is_empty())
                .map(|o| o.snippet.clone())
        })
        .unwrap_or_default();

    CompanyProfile {
        name: company_name.to_string(),
        industry,
        size_estimate: size_bucket(employees).to_string(),
        location,
        description,
        founded,
        website: website(bundle, kg.and_then(|kg| kg.website.as_deref())),
    }
}

/// Case-insensitive attribute lookup by key substring.
fn attribute<'a>(
    attributes: &'a std::collections::BTreeMap<String, String>,
    key: &str,
) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k.to_lowercase().contains(key))
        .map(|(_, v)| v.as_str())
}

fn parse_count(raw: &str) -> Option<u64> {
    let digits: String = raw
        .split(|c: char| !c.is_ascii_digit() && c != ',')
        .find(|s| !s.is_empty())?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn size_bucket(employees: Option<u64>) -> &'static str {
    match employees {
        Some(0) | None => UNKNOWN,
        Some(1..=50) => "Startup (1-50)",
        Some(51..=200) => "Small (51-200)",
        Some(201..=1000) => "Mid-size (201-1000)",
        Some(_) => "Enterprise (1000+)",
    }
}

fn website(bundle: &SearchBundle, kg_website: Option<&str>) -> Option<String> {
    if let Some(site) = kg_website.and_then(origin) {
        return Some(site);
    }
    if let Some(site) = bundle
        .outcome("site")
        .and_then(|r| r.organic.iter().find_map(|o| origin(&o.link)))
    {
        return Some(site);
    }
    bundle.outcome("overview").and_then(|r| {
        r.organic
            .iter()
            .filter_map(|o| origin(&o.link))
            .find(|site| !AGGREGATOR_HOSTS.iter().any(|h| site.contains(h)))
    })
}

/// `scheme://host` of a URL, or `None` when it has no scheme.
fn origin(link: &str) -> Option<String> {
    let (scheme, rest) = link.trim().split_once("://")?;
    let host = rest.split(['/', '?', '#']).next()?;
    if scheme.is_empty() || host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}"))
}

// ---------------------------------------------------------------------------
// Business model
// ---------------------------------------------------------------------------

fn business_model(company_text: &str) -> BusinessModel {
    let or_unknown = |table: Table, pick: fn(&str, Table) -> Option<&'static str>| {
        pick(company_text, table).unwrap_or(UNKNOWN).to_string()
    };
    BusinessModel {
        model_type: or_unknown(lexicon::BUSINESS_TYPES, lexicon::vote),
        revenue_streams: lexicon::all_matches(company_text, lexicon::REVENUE_STREAMS),
        target_market: or_unknown(lexicon::TARGET_MARKETS, lexicon::vote),
        pricing_model: or_unknown(lexicon::PRICING_MODELS, lexicon::first_match),
    }
}

// ---------------------------------------------------------------------------
// Recent activity
// ---------------------------------------------------------------------------

fn news_summary(count: usize) -> String {
    match count {
        0 => "No recent news found".to_string(),
        1 => "Found 1 recent news article".to_string(),
        n => format!("Found {n} recent news articles"),
    }
}

fn funding_headline(news: &[OrganicResult]) -> Option<String> {
    news.iter()
        .find(|r| {
            let text = format!("{} {}", r.title, r.snippet).to_lowercase();
            lexicon::mentions_any(&text, lexicon::FUNDING_TERMS)
        })
        .map(|r| r.title.clone())
}

fn leadership_changes(news: &[OrganicResult]) -> Vec<String> {
    news.iter()
        .filter(|r| lexicon::mentions_any(&r.title.to_lowercase(), lexicon::LEADERSHIP_CHANGE_TERMS))
        .map(|r| r.title.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Leadership
// ---------------------------------------------------------------------------

fn executives(company_name: &str, bundle: &SearchBundle) -> Vec<Executive> {
    let company_tokens: HashSet<String> = company_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let sources = bundle
        .leadership_info
        .iter()
        .chain(bundle.outcome("leadership").into_iter().flat_map(|r| r.organic.iter()));

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for result in sources {
        for text in [result.title.as_str(), result.snippet.as_str()] {
            let captures = NAME_THEN_TITLE
                .captures_iter(text)
                .chain(TITLE_THEN_NAME.captures_iter(text));
            for caps in captures {
                let (Some(name), Some(title)) = (caps.name("name"), caps.name("title")) else {
                    continue;
                };
                let Some(name) = clean_name(name.as_str(), &company_tokens) else {
                    continue;
                };
                if !seen.insert(name.to_lowercase()) {
                    continue;
                }
                found.push(Executive {
                    name,
                    title: title.as_str().trim().to_string(),
                    source: "web_search".to_string(),
                });
                if found.len() >= MAX_EXECUTIVES {
                    return found;
                }
            }
        }
    }
    found
}

/// A person name has at least two tokens and none of them is a stopword or
/// part of the company name.
fn clean_name(raw: &str, company_tokens: &HashSet<String>) -> Option<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let disqualified = tokens.iter().any(|t| {
        let lower = t.trim_end_matches(['.', ',', '\'']).to_lowercase();
        NAME_STOPWORDS.contains(&lower.as_str()) || company_tokens.contains(&lower)
    });
    if disqualified {
        return None;
    }
    Some(tokens.join(" "))
}

fn contact_priority(title: &str) -> Option<ContactPriority> {
    let lower = title.to_lowercase();
    if lower.contains("vice president")
        || lower.starts_with("vp")
        || lower.contains("head of")
        || lower.contains("director")
    {
        return Some(ContactPriority::Medium);
    }
    let c_level = ["ceo", "cfo", "cto", "coo", "cmo", "cro", "cpo"].contains(&lower.as_str());
    if c_level
        || lower.contains("chief")
        || lower.contains("founder")
        || lower.contains("president")
        || lower.contains("chair")
    {
        return Some(ContactPriority::High);
    }
    None
}

fn decision_makers(executives: &[Executive]) -> Vec<DecisionMaker> {
    let mut makers: Vec<DecisionMaker> = executives
        .iter()
        .filter_map(|e| {
            contact_priority(&e.title).map(|contact_priority| DecisionMaker {
                name: e.name.clone(),
                title: e.title.clone(),
                contact_priority,
            })
        })
        .collect();
    makers.sort_by_key(|m| m.contact_priority);
    makers
}

// ---------------------------------------------------------------------------
// Outreach
// ---------------------------------------------------------------------------

struct Signals<'a> {
    funding: bool,
    leadership_changes: bool,
    saas: bool,
    challenges: &'a [String],
    opportunities: &'a [String],
}

impl Signals<'_> {
    fn challenge(&self, label: &str) -> bool {
        self.challenges.iter().any(|c| c == label)
    }

    fn opportunity(&self, label: &str) -> bool {
        self.opportunities.iter().any(|o| o == label)
    }

    fn pain_points(&self) -> Vec<String> {
        let rules = [
            (self.funding, "Scaling operations after new funding"),
            (self.opportunity("Team Growth"), "Hiring and onboarding at scale"),
            (self.leadership_changes, "Aligning teams under new leadership"),
            (self.challenge("Competition"), "Customer acquisition in a competitive market"),
            (self.challenge("Workforce Reductions"), "Doing more with fewer people"),
            (self.challenge("Financial Pressure"), "Cost control"),
            (self.challenge("Security Incidents"), "Security and compliance"),
            (self.saas, "Technology integration"),
            (self.opportunity("Market Expansion"), "Entering new markets"),
        ];
        collect_rules(&rules)
    }

    fn timing_triggers(&self) -> Vec<String> {
        let rules = [
            (self.funding, "Recent funding round"),
            (self.leadership_changes, "Leadership changes"),
            (self.opportunity("New Products"), "Product launches"),
            (self.opportunity("M&A Activity"), "Merger or acquisition activity"),
            (self.opportunity("Market Expansion"), "Market expansion"),
            (self.opportunity("Team Growth"), "Active hiring"),
        ];
        collect_rules(&rules)
    }
}

fn collect_rules(rules: &[(bool, &str)]) -> Vec<String> {
    rules
        .iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, label)| label.to_string())
        .collect()
}
