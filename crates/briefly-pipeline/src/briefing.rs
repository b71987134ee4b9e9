use std::sync::Arc;

use ai_client::ClaudeClient;
use briefly_core::budget::RateBudget;
use briefly_core::error::BrieflyError;
use briefly_core::store::Store;
use briefly_core::types::{
    Briefing, BriefingItem, Confidence, ItemScore, RawItem, Source, UserPreference,
};
use chrono::{Duration, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;

use crate::scorer::high_signal_threshold;

const CANDIDATE_PULL_LIMIT: i64 = 500;

#[derive(Debug, Deserialize, JsonSchema)]
struct ComposedBriefing {
    briefing: String,
    items_used: Vec<Uuid>,
}

type Candidate = (RawItem, ItemScore, Source);

/// Briefing composition (spec §4.6). Per-scope idempotency on the UTC-day
/// axis lives here: `generate` refuses a second briefing for the same
/// scope on the same day unless `force` is set.
pub struct BriefingComposer {
    store: Arc<dyn Store>,
    llm: Option<ClaudeClient>,
    target_words: u32,
    num_items: usize,
    llm_budget: Arc<RateBudget>,
}

impl BriefingComposer {
    pub fn new(
        store: Arc<dyn Store>,
        llm: Option<ClaudeClient>,
        target_words: u32,
        num_items: usize,
        llm_budget: Arc<RateBudget>,
    ) -> Self {
        Self {
            store,
            llm,
            target_words,
            num_items,
            llm_budget,
        }
    }

    /// Returns the briefing plus whether it was freshly generated this call
    /// (`false` means an existing same-day briefing was reused, spec §8).
    pub async fn generate_for_user(
        &self,
        user_id: Uuid,
        force: bool,
    ) -> Result<(Briefing, bool), BrieflyError> {
        let scope = Briefing::user_scope(user_id);
        if let Some(existing) = self.existing_briefing_today(&scope, force).await? {
            return Ok((existing, false));
        }
        let prefs = self.store.get_preferences(user_id).await?;
        let candidates = self.select_candidates(Some(&prefs)).await?;
        Ok((self.compose(scope, candidates).await?, true))
    }

    pub async fn generate_global(&self, force: bool) -> Result<(Briefing, bool), BrieflyError> {
        let scope = Briefing::GLOBAL_SCOPE.to_string();
        if let Some(existing) = self.existing_briefing_today(&scope, force).await? {
            return Ok((existing, false));
        }
        let candidates = self.select_candidates(None).await?;
        Ok((self.compose(scope, candidates).await?, true))
    }

    /// Batch entry point for the scheduler's daily briefing tick: silently
    /// skips users who already have one since UTC midnight (spec §4.6 step 5).
    pub async fn generate_all_pending(&self) -> Result<Vec<Briefing>, BrieflyError> {
        let user_ids = self.store.list_daily_briefing_user_ids().await?;
        let mut briefings = Vec::new();
        for user_id in user_ids {
            let scope = Briefing::user_scope(user_id);
            if self.existing_briefing_today(&scope, false).await?.is_some() {
                continue;
            }
            match self.generate_for_user(user_id, false).await {
                Ok((b, _generated)) => briefings.push(b),
                Err(err) => {
                    tracing::warn!(%user_id, error = %err, "briefing generation failed, skipping user");
                }
            }
        }
        Ok(briefings)
    }

    async fn existing_briefing_today(
        &self,
        scope: &str,
        force: bool,
    ) -> Result<Option<Briefing>, BrieflyError> {
        if force {
            return Ok(None);
        }
        self.store.briefing_for_scope_since(scope, utc_midnight_today()).await
    }

    async fn select_candidates(
        &self,
        prefs: Option<&UserPreference>,
    ) -> Result<Vec<Candidate>, BrieflyError> {
        let since = Utc::now() - Duration::hours(24);
        let pulled = self
            .store
            .get_high_signals(high_signal_threshold(), CANDIDATE_PULL_LIMIT)
            .await?;

        let mut candidates = Vec::new();
        for (item, score) in pulled {
            let reference_time = item.published_at.unwrap_or(item.fetched_at);
            if reference_time < since {
                continue;
            }
            let source = self.store.get_source(item.source_id).await?;
            if let Some(prefs) = prefs {
                if prefs.sources_blocked.contains(&source.id) {
                    continue;
                }
                if !prefs.topics.is_empty() {
                    let matches = source
                        .category
                        .as_deref()
                        .map(|c| prefs.topics.iter().any(|t| t == c))
                        .unwrap_or(false);
                    if !matches {
                        continue;
                    }
                }
            }
            candidates.push((item, score, source));
        }

        candidates.truncate(self.num_items * 2);
        candidates.truncate(self.num_items);
        Ok(candidates)
    }

    async fn compose(
        &self,
        scope: String,
        candidates: Vec<Candidate>,
    ) -> Result<Briefing, BrieflyError> {
        let now = Utc::now();
        let period_start = now - Duration::hours(24);

        let (summary_md, llm_used) = match &self.llm {
            Some(client) if self.llm_budget.has_capacity(now.timestamp(), 1) => {
                match self.compose_via_llm(client, &candidates).await {
                    Ok(md) => {
                        self.llm_budget.record(now.timestamp(), 1);
                        (md, true)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "llm briefing composition failed, using fallback template");
                        (self.compose_fallback(&candidates), false)
                    }
                }
            }
            Some(_) => {
                tracing::warn!("llm call budget exhausted for today, using fallback template");
                (self.compose_fallback(&candidates), false)
            }
            None => (self.compose_fallback(&candidates), false),
        };

        let briefing = self
            .store
            .create_briefing(
                &scope,
                period_start,
                now,
                &summary_md,
                serde_json::json!({ "llm_used": llm_used, "candidate_count": candidates.len() }),
            )
            .await?;

        for (rank, (item, score, source)) in candidates.iter().enumerate() {
            let cluster_id = self.store.cluster_for_item(item.id).await?.map(|c| c.id);
            self.store
                .add_briefing_item(&BriefingItem {
                    briefing_id: briefing.id,
                    rank: rank as i32 + 1,
                    raw_item_id: item.id,
                    cluster_id,
                    title: item.title.clone(),
                    one_liner: one_liner_for(item),
                    why_it_matters: why_it_matters_for(score, source),
                    confidence: confidence_for(score.signal_score),
                    signal_score: score.signal_score,
                    sources: serde_json::json!([source.name]),
                })
                .await?;
        }

        Ok(briefing)
    }

    async fn compose_via_llm(
        &self,
        client: &ClaudeClient,
        candidates: &[Candidate],
    ) -> Result<String, BrieflyError> {
        let system = "You are a senior news analyst writing a concise daily briefing for a \
                      technically literate reader. Be direct, skip filler.";
        let payload: Vec<_> = candidates
            .iter()
            .map(|(item, score, source)| {
                serde_json::json!({
                    "id": item.id,
                    "title": item.title,
                    "source": source.name,
                    "signal_score": score.signal_score,
                })
            })
            .collect();
        let user = format!(
            "Candidate items (JSON): {}\n\nTarget word count: {}\nWrite a briefing covering the \
             most significant items. Respond with the structured result only.",
            serde_json::to_string(&payload).unwrap_or_default(),
            self.target_words,
        );

        let composed: ComposedBriefing = client
            .extract(system, &user, self.target_words.saturating_mul(2).max(512))
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?;
        Ok(composed.briefing)
    }

    fn compose_fallback(&self, candidates: &[Candidate]) -> String {
        let mut md = format!("# Daily Briefing — {}\n\n", Utc::now().format("%Y-%m-%d"));
        if candidates.is_empty() {
            md.push_str("No high-signal items in the last 24 hours.\n");
            return md;
        }
        for (rank, (item, score, source)) in candidates.iter().enumerate() {
            md.push_str(&format!(
                "{}. **{}** — {} (signal {:.2})\n   {}\n   {}\n\n",
                rank + 1,
                item.title,
                source.name,
                score.signal_score,
                one_liner_for(item),
                item.url.as_deref().unwrap_or(""),
            ));
        }
        md
    }
}

fn one_liner_for(item: &RawItem) -> String {
    let body = item.raw_text.as_deref().unwrap_or("");
    let snippet: String = body.chars().take(160).collect();
    if snippet.is_empty() {
        item.title.clone()
    } else {
        format!("{snippet}…")
    }
}

fn why_it_matters_for(score: &ItemScore, source: &Source) -> String {
    format!(
        "Signal {:.2} from {} (credibility tier {}).",
        score.signal_score, source.name, source.credibility_tier
    )
}

fn confidence_for(signal_score: f64) -> Confidence {
    if signal_score >= 0.8 {
        Confidence::High
    } else if signal_score >= high_signal_threshold() + 0.05 {
        Confidence::Med
    } else {
        Confidence::Low
    }
}

fn utc_midnight_today() -> chrono::DateTime<Utc> {
    let now = Utc::now();
    now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_bands_track_signal_score() {
        assert_eq!(confidence_for(0.85), Confidence::High);
        assert_eq!(confidence_for(0.7), Confidence::Med);
        assert_eq!(confidence_for(0.6), Confidence::Low);
    }

    #[test]
    fn one_liner_truncates_long_bodies() {
        let item = RawItem {
            id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            external_id: None,
            url: None,
            canonical_url: None,
            title: "Title".to_string(),
            author: None,
            published_at: None,
            fetched_at: Utc::now(),
            raw_text: Some("x".repeat(500)),
            raw_payload: serde_json::json!({}),
            content_hash: "h".to_string(),
            kind: briefly_core::types::ItemKind::Article,
            status: briefly_core::types::RawItemStatus::Scored,
        };
        let snippet = one_liner_for(&item);
        assert!(snippet.chars().count() <= 161);
    }
}
