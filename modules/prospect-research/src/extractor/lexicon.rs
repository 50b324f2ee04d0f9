// Keyword tables and whole-word matching for the rule-based extractor.
//
// Terms are lowercase. A trailing `*` makes a term a prefix ("manufactur*"
// matches "manufacturing"); otherwise both ends must sit on a word boundary,
// so "ai" does not fire inside "said".

pub(crate) type Table = &'static [(&'static str, &'static [&'static str])];

pub(crate) const INDUSTRIES: Table = &[
    ("Technology", &["software", "saas", "cloud", "developer*", "technology", "tech", "it services"]),
    ("Financial Services", &["bank*", "fintech", "payments", "lending", "insurance", "financial services", "wealth management"]),
    ("Healthcare", &["health*", "medical", "clinic*", "pharma*", "biotech*", "hospital*"]),
    ("Retail", &["retail*", "e-commerce", "ecommerce", "consumer goods", "stores"]),
    ("Manufacturing", &["manufactur*", "industrial", "factory", "factories"]),
    ("Logistics", &["logistics", "shipping", "freight", "supply chain"]),
    ("Energy", &["energy", "solar", "oil and gas", "renewable*", "utilit*"]),
    ("Education", &["education*", "edtech", "school*", "universit*"]),
    ("Media", &["media", "publishing", "entertainment", "streaming"]),
    ("Real Estate", &["real estate", "proptech", "property management"]),
];

pub(crate) const BUSINESS_TYPES: Table = &[
    ("B2B SaaS", &["saas", "software as a service", "subscription software", "cloud platform", "b2b software"]),
    ("Marketplace", &["marketplace*"]),
    ("E-commerce", &["e-commerce", "ecommerce", "online store", "online retailer"]),
    ("Professional Services", &["consulting", "consultancy", "agency", "professional services"]),
    ("Hardware", &["hardware", "devices", "manufactur*"]),
    ("Financial Services", &["bank", "lender", "insurer", "brokerage"]),
];

pub(crate) const REVENUE_STREAMS: Table = &[
    ("Subscription", &["subscription*", "recurring revenue", "arr"]),
    ("Licensing", &["licens*"]),
    ("Professional Services", &["consulting", "professional services", "implementation services"]),
    ("Advertising", &["advertis*", "ad revenue"]),
    ("Transaction Fees", &["transaction fee*", "take rate", "commission*"]),
    ("Hardware Sales", &["hardware sales", "device sales"]),
];

pub(crate) const TARGET_MARKETS: Table = &[
    ("Enterprise", &["enterprise*", "fortune 500", "large organizations"]),
    ("SMB", &["small business*", "smb*", "small and medium", "startups"]),
    ("Consumer", &["consumer*", "households", "shoppers"]),
    ("Public Sector", &["government*", "public sector", "agencies"]),
];

pub(crate) const PRICING_MODELS: Table = &[
    ("Freemium", &["freemium", "free tier", "free plan"]),
    ("Usage-based", &["usage-based", "pay-as-you-go", "per transaction", "metered"]),
    ("Subscription-based", &["subscription*", "per seat", "monthly plan", "annual plan"]),
    ("Contract-based", &["contract*", "enterprise agreement*"]),
];

pub(crate) const FUNDING_TERMS: &[&str] = &[
    "raises",
    "raised",
    "funding",
    "series a",
    "series b",
    "series c",
    "series d",
    "seed round",
    "venture capital",
    "ipo",
    "valuation",
];

pub(crate) const LEADERSHIP_CHANGE_TERMS: &[&str] = &[
    "appoints",
    "appointed",
    "names new",
    "named",
    "hires",
    "joins as",
    "steps down",
    "resigns",
    "promoted",
    "new ceo",
    "new chief",
];

pub(crate) const ADVANTAGES: Table = &[
    ("Market Leadership", &["market leader", "leading", "leader in"]),
    ("AI Technology", &["ai", "artificial intelligence", "machine learning"]),
    ("Proprietary Technology", &["patent*", "proprietary"]),
    ("Industry Recognition", &["award*", "recognized"]),
    ("Strategic Partnerships", &["partnership*", "partners with"]),
];

pub(crate) const CHALLENGES: Table = &[
    ("Competition", &["competitor*", "competition", "rival*"]),
    ("Workforce Reductions", &["layoff*", "job cuts", "restructuring"]),
    ("Legal Exposure", &["lawsuit*", "litigation", "sued"]),
    ("Financial Pressure", &["losses", "decline*", "downturn"]),
    ("Security Incidents", &["breach*", "outage*", "cyberattack*"]),
    ("Market Saturation", &["saturat*", "crowded market"]),
];

pub(crate) const OPPORTUNITIES: Table = &[
    ("Market Expansion", &["expand*", "expansion", "new market*", "international"]),
    ("New Products", &["launch*", "new product*", "unveil*", "announces new"]),
    ("M&A Activity", &["acquire*", "acquisition*", "merger*"]),
    ("Team Growth", &["hiring", "hires", "headcount"]),
];

/// Whole-word (or prefix, with `*`) occurrences of `term` in `text`.
/// Both are expected lowercase.
pub(crate) fn count_mentions(text: &str, term: &str) -> usize {
    let (stem, prefix) = match term.strip_suffix('*') {
        Some(stem) => (stem, true),
        None => (term, false),
    };
    if stem.is_empty() {
        return 0;
    }

    text.match_indices(stem)
        .filter(|(i, _)| {
            let before_ok = text[..*i]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let after_ok = prefix
                || text[i + stem.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_alphanumeric());
            before_ok && after_ok
        })
        .count()
}

pub(crate) fn mentions_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| count_mentions(text, t) > 0)
}

/// Label with the most mentions. Ties go to the earlier table entry; no
/// mentions at all gives `None`.
pub(crate) fn vote(text: &str, table: Table) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for &(label, terms) in table {
        let hits: usize = terms.iter().map(|t| count_mentions(text, t)).sum();
        if hits > 0 && best.map_or(true, |(_, n)| hits > n) {
            best = Some((label, hits));
        }
    }
    best.map(|(label, _)| label)
}

/// First label (in table order) with any mention.
pub(crate) fn first_match(text: &str, table: Table) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, terms)| mentions_any(text, terms))
        .map(|(label, _)| *label)
}

/// Every label with at least one mention, in table order.
pub(crate) fn all_matches(text: &str, table: Table) -> Vec<String> {
    table
        .iter()
        .filter(|(_, terms)| mentions_any(text, terms))
        .map(|(label, _)| label.to_string())
        .collect()
}
