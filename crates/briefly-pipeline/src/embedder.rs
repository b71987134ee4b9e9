use std::sync::Arc;

use ai_client::OpenAiClient;
use async_trait::async_trait;
use briefly_core::budget::RateBudget;
use briefly_core::error::BrieflyError;
use briefly_core::store::Store;
use briefly_core::types::{ItemEmbedding, RawItem, RawItemStatus};
use chrono::Utc;

const EMBED_CHAR_BUDGET: usize = 8_000;
const DEV_EMBEDDING_DIM: usize = 256;

#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BrieflyError>;
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
}

/// Wraps the Voyage AI embeddings endpoint via its OpenAI-compatible API,
/// the way the teacher's embedder does.
pub struct ProviderEmbedder {
    client: OpenAiClient,
    model_id: String,
    dim: usize,
}

impl ProviderEmbedder {
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>, dim: usize) -> Self {
        let model_id = model_id.into();
        Self {
            client: OpenAiClient::new(api_key)
                .with_base_url("https://api.voyageai.com/v1")
                .with_embedding_model(model_id.clone()),
            model_id,
            dim,
        }
    }
}

#[async_trait]
impl TextEmbedder for ProviderEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BrieflyError> {
        self.client
            .embed(text)
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Deterministic pseudo-random vectors for development when no embedding
/// credentials are configured, so the rest of the pipeline (clustering,
/// scoring) stays exercisable without an external dependency. Real
/// deployments never select this path; `Embedder::dev_fallback` logs once
/// at construction so the gap is visible in metrics.
pub struct DeterministicDevEmbedder {
    dim: usize,
}

impl DeterministicDevEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl TextEmbedder for DeterministicDevEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BrieflyError> {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();

        let mut vector = Vec::with_capacity(self.dim);
        for _ in 0..self.dim {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let unit = ((seed >> 11) as f64 / (1u64 << 53) as f64) as f32;
            vector.push(unit * 2.0 - 1.0);
        }
        Ok(vector)
    }

    fn model_id(&self) -> &str {
        "dev-deterministic-v1"
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Embedding stage (spec §4.3): title + best available body, truncated to
/// an 8,000-character budget, capped at `MAX_EMBEDDINGS_PER_HOUR`.
pub struct Embedder {
    inner: Arc<dyn TextEmbedder>,
    store: Arc<dyn Store>,
    budget: RateBudget,
}

impl Embedder {
    pub fn with_provider(store: Arc<dyn Store>, api_key: String, max_per_hour: u32) -> Self {
        Self {
            inner: Arc::new(ProviderEmbedder::new(api_key, "voyage-3-large", 1536)),
            store,
            budget: RateBudget::per_hour(max_per_hour),
        }
    }

    pub fn dev_fallback(store: Arc<dyn Store>, max_per_hour: u32) -> Self {
        tracing::warn!("no embedding provider credentials configured; using deterministic dev embedder");
        Self {
            inner: Arc::new(DeterministicDevEmbedder::new(DEV_EMBEDDING_DIM)),
            store,
            budget: RateBudget::per_hour(max_per_hour),
        }
    }

    pub async fn run_pending(&self, limit: i64) -> Result<usize, BrieflyError> {
        let items = self
            .store
            .fetch_pending(RawItemStatus::Extracted, limit)
            .await?;

        let mut processed = 0usize;
        for item in items {
            let now = Utc::now().timestamp();
            if !self.budget.has_capacity(now, 1) {
                tracing::warn!("embedding rate cap reached for this window, deferring remaining items");
                break;
            }
            self.embed_item(&item).await?;
            self.budget.record(now, 1);
            processed += 1;
        }
        Ok(processed)
    }

    async fn embed_item(&self, item: &RawItem) -> Result<(), BrieflyError> {
        let body = match self.store.get_extracted_content(item.id).await? {
            Some(content) => content.text,
            None => item.raw_text.clone().unwrap_or_default(),
        };
        let text = truncate_chars(&format!("{}\n{}", item.title, body), EMBED_CHAR_BUDGET);

        let vector = self.inner.embed(&text).await?;
        self.store
            .upsert_embedding(&ItemEmbedding {
                raw_item_id: item.id,
                model_id: self.inner.model_id().to_string(),
                dim: self.inner.dim() as i32,
                vector,
                created_at: Utc::now(),
            })
            .await?;
        self.store.advance_status(item.id, RawItemStatus::Embedded).await?;
        Ok(())
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
