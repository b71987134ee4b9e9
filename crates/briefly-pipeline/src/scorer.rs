use std::sync::Arc;

use ai_client::ClaudeClient;
use briefly_core::budget::RateBudget;
use briefly_core::error::BrieflyError;
use briefly_core::store::Store;
use briefly_core::types::{ItemScore, RawItem, RawItemStatus};
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;

const WEIGHT_RELEVANCE: f64 = 0.40;
const WEIGHT_VELOCITY: f64 = 0.20;
const WEIGHT_CROSS_SOURCE: f64 = 0.20;
const WEIGHT_NOVELTY: f64 = 0.20;
const HIGH_SIGNAL_THRESHOLD: f64 = 0.6;

#[derive(Debug, Deserialize, JsonSchema)]
struct RelevanceJudgement {
    /// 0-10 relevance rating.
    score: f64,
}

/// Scoring stage (spec §4.5): four normalized axes combined into one
/// append-only `signal_score` per computation.
pub struct Scorer {
    store: Arc<dyn Store>,
    llm: Option<ClaudeClient>,
    llm_budget: Arc<RateBudget>,
}

impl Scorer {
    pub fn new(store: Arc<dyn Store>, llm: Option<ClaudeClient>, llm_budget: Arc<RateBudget>) -> Self {
        Self { store, llm, llm_budget }
    }

    pub async fn run_pending(&self, limit: i64) -> Result<usize, BrieflyError> {
        let items = self
            .store
            .fetch_pending(RawItemStatus::Clustered, limit)
            .await?;
        let mut processed = 0usize;
        for item in items {
            self.score_item(&item).await?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Re-scores every member of a cluster, used after a merge changes
    /// cluster-size-derived `cross_source` axes for the whole group.
    pub async fn score_cluster(&self, cluster_id: Uuid, members: &[Uuid]) -> Result<(), BrieflyError> {
        for raw_item_id in members {
            let item = self.store.get_raw_item(*raw_item_id).await?;
            self.compute_and_store(&item, cluster_id).await?;
        }
        Ok(())
    }

    async fn score_item(&self, item: &RawItem) -> Result<(), BrieflyError> {
        let cluster = self.store.cluster_for_item(item.id).await?;
        let cluster_id = cluster.map(|c| c.id);
        if let Some(cluster_id) = cluster_id {
            self.compute_and_store(item, cluster_id).await?;
        } else {
            // Defensive: an item reaching the score stage should already
            // have a cluster (cluster stage always assigns one), but a
            // singleton cluster of itself is the correct fallback.
            self.compute_and_store_singleton(item).await?;
        }
        self.store.advance_status(item.id, RawItemStatus::Scored).await?;
        Ok(())
    }

    async fn compute_and_store(&self, item: &RawItem, cluster_id: Uuid) -> Result<(), BrieflyError> {
        let cluster_size = self.store.cluster_member_count(cluster_id).await?;
        let score = self.compute(item, cluster_size).await?;
        self.store.insert_score(&score).await
    }

    async fn compute_and_store_singleton(&self, item: &RawItem) -> Result<(), BrieflyError> {
        let score = self.compute(item, 1).await?;
        self.store.insert_score(&score).await
    }

    async fn compute(&self, item: &RawItem, cluster_size: i64) -> Result<ItemScore, BrieflyError> {
        let extracted = self.store.get_extracted_content(item.id).await?;
        let body_len = extracted
            .as_ref()
            .map(|c| c.text.len())
            .unwrap_or_else(|| item.raw_text.as_ref().map(String::len).unwrap_or(0));

        let source = self.store.get_source(item.source_id).await?;
        let (relevance, llm_used) = self
            .compute_relevance(item, body_len, source.credibility_tier)
            .await;
        let velocity = compute_velocity(item);
        let cross_source = compute_cross_source(cluster_size);
        let novelty = compute_novelty(item);

        let signal = WEIGHT_RELEVANCE * relevance
            + WEIGHT_VELOCITY * velocity
            + WEIGHT_CROSS_SOURCE * cross_source
            + WEIGHT_NOVELTY * novelty;

        Ok(ItemScore {
            raw_item_id: item.id,
            computed_at: Utc::now(),
            relevance,
            velocity,
            cross_source,
            novelty,
            signal_score: signal,
            score_meta: serde_json::json!({
                "weights": {
                    "relevance": WEIGHT_RELEVANCE,
                    "velocity": WEIGHT_VELOCITY,
                    "cross_source": WEIGHT_CROSS_SOURCE,
                    "novelty": WEIGHT_NOVELTY,
                },
                "llm_contributed": llm_used,
                "cluster_size": cluster_size,
            }),
        })
    }

    /// LLM-judged relevance (0-10 / 10) when an LLM is configured; on any
    /// transport/parse failure, falls back to the heuristic silently
    /// (spec §4.5: never block scoring on the LLM).
    async fn compute_relevance(
        &self,
        item: &RawItem,
        body_len: usize,
        credibility_tier: i16,
    ) -> (f64, bool) {
        if let Some(client) = &self.llm {
            let now = Utc::now().timestamp();
            if !self.llm_budget.has_capacity(now, 1) {
                tracing::warn!(raw_item_id = %item.id, "llm call budget exhausted, using heuristic relevance");
                return (heuristic_relevance(item, body_len, credibility_tier), false);
            }

            let system = "You are a news relevance judge. Rate how significant this item is \
                          to a technically literate reader on a 0-10 scale.";
            let user = format!("Title: {}\n\nBody (truncated): {}", item.title, item.raw_text
                .as_deref()
                .unwrap_or("")
                .chars()
                .take(1000)
                .collect::<String>());
            let result: Result<RelevanceJudgement, _> = client.extract(system, &user, 256).await;
            if let Ok(judgement) = result {
                self.llm_budget.record(now, 1);
                return ((judgement.score / 10.0).clamp(0.0, 1.0), true);
            }
        }
        (heuristic_relevance(item, body_len, credibility_tier), false)
    }
}

fn heuristic_relevance(item: &RawItem, body_len: usize, credibility_tier: i16) -> f64 {
    let mut score = credibility_tier as f64 / 5.0;
    if body_len >= 200 {
        score += 0.1;
    }
    if item.title.chars().count() < 20 {
        score -= 0.1;
    }
    score.clamp(0.0, 1.0)
}

fn compute_velocity(item: &RawItem) -> f64 {
    if let Some(raw_score) = item.raw_payload.get("score").and_then(|v| v.as_f64()) {
        if item.raw_payload.get("hn_id").is_some() {
            return (raw_score / 200.0).min(1.0);
        }
        if item.raw_payload.get("reddit_id").is_some() {
            let ratio = item
                .raw_payload
                .get("upvote_ratio")
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0);
            return ((raw_score / 500.0) * ratio).min(1.0);
        }
    }
    0.5
}

fn compute_cross_source(cluster_size: i64) -> f64 {
    match cluster_size {
        n if n >= 3 => 1.0,
        2 => 0.7,
        _ => 0.3,
    }
}

fn compute_novelty(item: &RawItem) -> f64 {
    let now = Utc::now();
    match item.published_at {
        Some(published) => novelty_band(now - published, 0.9, 0.7, 0.5, 0.3),
        None => novelty_band(now - item.fetched_at, 0.8, 0.6, 0.4, 0.4),
    }
}

fn novelty_band(
    age: chrono::Duration,
    under_6h: f64,
    under_24h: f64,
    under_72h: f64,
    otherwise: f64,
) -> f64 {
    let hours = age.num_hours();
    if hours < 6 {
        under_6h
    } else if hours < 24 {
        under_24h
    } else if hours < 72 {
        under_72h
    } else {
        otherwise
    }
}

pub const fn high_signal_threshold() -> f64 {
    HIGH_SIGNAL_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_source_bands() {
        assert_eq!(compute_cross_source(1), 0.3);
        assert_eq!(compute_cross_source(2), 0.7);
        assert_eq!(compute_cross_source(3), 1.0);
        assert_eq!(compute_cross_source(10), 1.0);
    }

    #[test]
    fn novelty_bands_for_published_at() {
        assert_eq!(novelty_band(chrono::Duration::hours(1), 0.9, 0.7, 0.5, 0.3), 0.9);
        assert_eq!(novelty_band(chrono::Duration::hours(12), 0.9, 0.7, 0.5, 0.3), 0.7);
        assert_eq!(novelty_band(chrono::Duration::hours(48), 0.9, 0.7, 0.5, 0.3), 0.5);
        assert_eq!(novelty_band(chrono::Duration::hours(96), 0.9, 0.7, 0.5, 0.3), 0.3);
    }

    #[test]
    fn heuristic_relevance_clips_to_unit_interval() {
        let item = RawItem {
            id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            external_id: None,
            url: None,
            canonical_url: None,
            title: "A very long and descriptive headline".to_string(),
            author: None,
            published_at: None,
            fetched_at: Utc::now(),
            raw_text: None,
            raw_payload: serde_json::json!({}),
            content_hash: "x".to_string(),
            kind: briefly_core::types::ItemKind::Article,
            status: briefly_core::types::RawItemStatus::Clustered,
        };
        // tier/5 = 1.0, body >= 200 adds 0.1, clipped back down to 1.0.
        assert_eq!(heuristic_relevance(&item, 300, 5), 1.0);
    }

    #[test]
    fn heuristic_relevance_penalizes_short_titles() {
        let item = RawItem {
            id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            external_id: None,
            url: None,
            canonical_url: None,
            title: "Short".to_string(),
            author: None,
            published_at: None,
            fetched_at: Utc::now(),
            raw_text: None,
            raw_payload: serde_json::json!({}),
            content_hash: "x".to_string(),
            kind: briefly_core::types::ItemKind::Article,
            status: briefly_core::types::RawItemStatus::Clustered,
        };
        // tier/5 = 0.6, title < 20 chars subtracts 0.1.
        assert!((heuristic_relevance(&item, 0, 3) - 0.5).abs() < 1e-9);
    }
}
