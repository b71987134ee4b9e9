//! Ingestion stage (spec §4.1). One `Ingester` per `SourceType`, all
//! producing the same `NormalizedItem` shape so persistence/idempotency
//! lives in one place instead of being re-implemented per source.

mod feed;
mod hackernews;
mod reddit;

pub use feed::FeedIngester;
pub use hackernews::HackerNewsIngester;
pub use reddit::RedditIngester;

use std::sync::Arc;

use async_trait::async_trait;
use briefly_core::error::BrieflyError;
use briefly_core::store::Store;
use briefly_core::types::{NormalizedItem, Source, SourceType};

#[async_trait]
pub trait Ingester: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<NormalizedItem>, BrieflyError>;
}

/// Dispatches each enabled `Source` to its matching `Ingester` and persists
/// whatever comes back through `Store::insert_raw_item_if_new`, which is
/// where the per-source idempotency (spec §4.1) actually lives.
pub struct IngestionService {
    store: Arc<dyn Store>,
    feed: FeedIngester,
    hn: HackerNewsIngester,
    reddit: RedditIngester,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn Store>,
        feed: FeedIngester,
        hn: HackerNewsIngester,
        reddit: RedditIngester,
    ) -> Self {
        Self {
            store,
            feed,
            hn,
            reddit,
        }
    }

    /// Ingests every enabled source, returning the number of genuinely new
    /// `RawItem`s persisted. Per-source failures are logged and skipped
    /// rather than aborting the whole tick (spec §7: isolated stage
    /// failures shouldn't block unrelated sources).
    pub async fn ingest_all_enabled(&self) -> Result<usize, BrieflyError> {
        let sources = self.store.list_enabled_sources(None).await?;
        let mut inserted = 0usize;
        for source in sources {
            match self.ingest_source(&source).await {
                Ok(n) => inserted += n,
                Err(err) => {
                    tracing::warn!(source = %source.name, error = %err, "ingest failed, skipping");
                }
            }
        }
        Ok(inserted)
    }

    pub async fn ingest_source(&self, source: &Source) -> Result<usize, BrieflyError> {
        let items = match source.source_type {
            SourceType::Feed => self.feed.fetch(source).await?,
            SourceType::Hn => self.hn.fetch(source).await?,
            SourceType::Reddit => self.reddit.fetch(source).await?,
        };

        let mut inserted = 0usize;
        for item in items {
            if self
                .store
                .insert_raw_item_if_new(source.id, &item)
                .await?
                .is_some()
            {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Finds or creates the named source, the way the original's
    /// `ingest_frontpage`/`ingest_subreddits` convenience helpers do, so
    /// operators don't have to pre-seed `sources` rows by hand.
    pub async fn ensure_source(
        &self,
        name: &str,
        source_type: SourceType,
        url: &str,
        category: Option<&str>,
        credibility_tier: i16,
        config: serde_json::Value,
    ) -> Result<Source, BrieflyError> {
        if let Some(existing) = self.store.find_source_by_name(name).await? {
            return Ok(existing);
        }
        self.store
            .create_source(name, source_type, url, category, credibility_tier, config)
            .await
    }

    pub async fn ingest_frontpage(&self) -> Result<usize, BrieflyError> {
        let source = self
            .ensure_source(
                "Hacker News - Top",
                SourceType::Hn,
                "https://news.ycombinator.com",
                Some("tech"),
                5,
                serde_json::json!({ "story_type": "top" }),
            )
            .await?;
        self.ingest_source(&source).await
    }

    pub async fn ingest_subreddit(&self, subreddit: &str) -> Result<usize, BrieflyError> {
        let name = format!("Reddit - r/{subreddit}");
        let url = format!("https://reddit.com/r/{subreddit}");
        let source = self
            .ensure_source(
                &name,
                SourceType::Reddit,
                &url,
                None,
                3,
                serde_json::json!({ "subreddit": subreddit, "sort": "hot" }),
            )
            .await?;
        self.ingest_source(&source).await
    }
}
