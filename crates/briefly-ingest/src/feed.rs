use async_trait::async_trait;
use briefly_core::error::BrieflyError;
use briefly_core::types::{ItemKind, NormalizedItem, Source};
use chrono::{DateTime, Duration, Utc};

use crate::Ingester;

const RSS_MAX_AGE_DAYS: i64 = 30;
const SNIPPET_MAX_CHARS: usize = 2000;

/// Pulls RSS/Atom feeds via `feed-rs` (spec §4.1 feed source type). `max_items`
/// is the configured per-source ingestion cap, same as the HN/Reddit
/// ingesters, so `max_items_per_source = 0` yields zero inserts here too.
pub struct FeedIngester {
    http: reqwest::Client,
    max_items: usize,
}

impl FeedIngester {
    pub fn new(max_items: usize) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds"),
            max_items,
        }
    }
}

#[async_trait]
impl Ingester for FeedIngester {
    async fn fetch(&self, source: &Source) -> Result<Vec<NormalizedItem>, BrieflyError> {
        let bytes = self
            .http
            .get(&source.url)
            .send()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?;

        let feed = feed_rs::parser::parse(&bytes[..])
            .map_err(|e| BrieflyError::DataShape(format!("feed parse failed: {e}")))?;

        let cutoff = Utc::now() - Duration::days(RSS_MAX_AGE_DAYS);
        let mut entries: Vec<_> = feed
            .entries
            .into_iter()
            .filter(|e| {
                let published = e.published.or(e.updated);
                published.map(|p| p >= cutoff).unwrap_or(true)
            })
            .collect();

        entries.sort_by_key(|e| std::cmp::Reverse(e.published.or(e.updated)));
        entries.truncate(self.max_items);

        let items = entries
            .into_iter()
            .filter_map(|entry| {
                let title = entry.title.map(|t| t.content)?;
                let link = entry.links.first().map(|l| l.href.clone());
                let summary: Option<String> = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .map(|s| s.chars().take(SNIPPET_MAX_CHARS).collect());
                let published: Option<DateTime<Utc>> = entry.published.or(entry.updated);
                let author = entry.authors.first().map(|a| a.name.clone());

                Some(NormalizedItem {
                    external_id: entry.id.clone(),
                    url: link.clone(),
                    canonical_url: link,
                    title,
                    kind: ItemKind::Article,
                    raw_text: summary,
                    author,
                    published_at: published,
                    raw_payload: serde_json::json!({ "feed_entry_id": entry.id }),
                })
            })
            .collect();

        Ok(items)
    }
}
