pub mod bundle;
pub mod directory;
pub mod extractor;
pub mod ledger;
pub mod orchestrator;
pub mod search;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use bundle::{QueryOutcome, SearchBundle};
pub use directory::CompanyDirectory;
pub use extractor::{confidence_score, ExtractionError, InsightExtractor, Insights, RuleBasedExtractor};
pub use ledger::ResearchLedger;
pub use orchestrator::{ResearchOrchestrator, ResearchResult};
pub use search::{SearchError, SearchProvider, WebSearcher};
pub use store::{MemoryStore, PgStore, ResearchStore};
