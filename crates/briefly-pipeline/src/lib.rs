//! The four re-entrant processing stages downstream of ingestion: extract,
//! embed, dedup/cluster, score, and briefing composition (spec §4.2-§4.6).
//! Each stage scans `Store::fetch_pending` for its own input status and
//! advances items past it; none of them assume the others ran in the same
//! tick, since the scheduler drives them independently.

pub mod briefing;
pub mod dedup;
pub mod embedder;
pub mod extractor;
pub mod scorer;

pub use briefing::BriefingComposer;
pub use dedup::Deduplicator;
pub use embedder::Embedder;
pub use extractor::ContentExtractor;
pub use scorer::Scorer;
