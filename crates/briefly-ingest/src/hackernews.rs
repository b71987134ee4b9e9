use async_trait::async_trait;
use briefly_core::error::BrieflyError;
use briefly_core::types::{ItemKind, NormalizedItem, Source};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::Ingester;

const BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
const HN_ITEM_URL: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Deserialize)]
struct HnItem {
    id: u64,
    #[serde(default)]
    deleted: bool,
    #[serde(rename = "type")]
    item_type: Option<String>,
    #[serde(default)]
    dead: bool,
    title: Option<String>,
    url: Option<String>,
    text: Option<String>,
    by: Option<String>,
    time: Option<i64>,
    score: Option<i64>,
    descendants: Option<i64>,
    #[serde(default)]
    kids: Vec<u64>,
}

/// Pulls stories from the Hacker News Firebase API (spec §4.1 hn source
/// type). `story_type` (top/new/best) and `max_items` come from the
/// source's own config plus the global ingestion cap.
pub struct HackerNewsIngester {
    http: reqwest::Client,
    max_items: usize,
}

impl HackerNewsIngester {
    pub fn new(max_items: usize) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds"),
            max_items,
        }
    }

    async fn fetch_story(&self, id: u64) -> Result<Option<HnItem>, BrieflyError> {
        let url = format!("{BASE_URL}/item/{id}.json");
        let item: Option<HnItem> = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?
            .json()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?;

        let Some(item) = item else { return Ok(None) };
        if item.deleted || item.dead {
            return Ok(None);
        }
        if item.item_type.as_deref() != Some("story") {
            return Ok(None);
        }
        if item.title.as_deref().unwrap_or("").is_empty() {
            return Ok(None);
        }
        Ok(Some(item))
    }
}

#[async_trait]
impl Ingester for HackerNewsIngester {
    async fn fetch(&self, source: &Source) -> Result<Vec<NormalizedItem>, BrieflyError> {
        let story_type = source
            .config
            .get("story_type")
            .and_then(|v| v.as_str())
            .unwrap_or("top");

        let list_url = format!("{BASE_URL}/{story_type}stories.json");
        let ids: Vec<u64> = self
            .http
            .get(&list_url)
            .send()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?
            .json()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?;

        let mut items = Vec::new();
        for id in ids.into_iter().take(self.max_items) {
            match self.fetch_story(id).await {
                Ok(Some(story)) => items.push(to_normalized(story)),
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(id, error = %err, "hn story fetch failed, skipping");
                }
            }
        }
        Ok(items)
    }
}

fn to_normalized(story: HnItem) -> NormalizedItem {
    let title = story.title.clone().unwrap_or_default();
    let kind = if title.starts_with("Ask HN:")
        || title.starts_with("Tell HN:")
        || title.starts_with("Show HN:")
    {
        ItemKind::Post
    } else {
        ItemKind::Article
    };

    let hn_url = format!("{HN_ITEM_URL}{}", story.id);
    let item_url = story.url.clone().unwrap_or_else(|| hn_url.clone());
    let published_at: Option<DateTime<Utc>> = story.time.and_then(|t| Utc.timestamp_opt(t, 0).single());
    let kids: Vec<u64> = story.kids.iter().take(10).copied().collect();

    NormalizedItem {
        external_id: story.id.to_string(),
        url: Some(item_url.clone()),
        canonical_url: Some(item_url),
        title,
        kind,
        raw_text: story.text,
        author: story.by,
        published_at,
        raw_payload: serde_json::json!({
            "hn_id": story.id,
            "score": story.score,
            "descendants": story.descendants,
            "by": story.by,
            "type": "story",
            "hn_url": hn_url,
            "kids": kids,
        }),
    }
}
