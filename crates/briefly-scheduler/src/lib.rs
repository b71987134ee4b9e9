//! Multi-queue job runner (spec §4.7). Six logical queues map to six
//! independently-ticking tasks, each wrapping one pipeline stage in a
//! bounded-retry/backoff envelope; a shared semaphore caps how many batches
//! run concurrently the way `worker_prefetch_multiplier=1` caps Celery.

pub mod queue;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use ai_client::ClaudeClient;
use briefly_core::config::Config;
use briefly_core::store::Store;
use briefly_ingest::IngestionService;
use briefly_pipeline::{BriefingComposer, ContentExtractor, Deduplicator, Embedder, Scorer};
use tokio::task::JoinHandle;

pub use queue::Queue;
pub use retry::{run_with_retry, RetryPolicy};

/// Bounded batch size per tick — the primary backpressure and cost-control
/// mechanism (spec §4.7): a tick never processes more than this many items,
/// regardless of how much is pending.
const BATCH_SIZE: i64 = 100;

pub struct Scheduler {
    store: Arc<dyn Store>,
    ingestion: Arc<IngestionService>,
    extractor: Arc<ContentExtractor>,
    embedder: Arc<Embedder>,
    deduplicator: Arc<Deduplicator>,
    scorer: Arc<Scorer>,
    briefing: Arc<BriefingComposer>,
    ingestion_interval_minutes: u32,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn Store>,
        ingestion: Arc<IngestionService>,
        extractor: Arc<ContentExtractor>,
        embedder: Arc<Embedder>,
        deduplicator: Arc<Deduplicator>,
        scorer: Arc<Scorer>,
        briefing: Arc<BriefingComposer>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            ingestion,
            extractor,
            embedder,
            deduplicator,
            scorer,
            briefing,
            ingestion_interval_minutes: config.ingestion_interval_minutes,
        }
    }

    /// Builds a trimmed Scheduler straight from ambient process
    /// dependencies, wiring the LLM client in only when credentials are
    /// present (spec §4.3/§4.5/§4.6: AI providers are optional).
    pub fn from_parts(
        store: Arc<dyn Store>,
        ingestion: IngestionService,
        extractor: ContentExtractor,
        embedder: Embedder,
        deduplicator: Deduplicator,
        scorer: Scorer,
        briefing: BriefingComposer,
        config: &Config,
    ) -> Self {
        Self::new(
            store,
            Arc::new(ingestion),
            Arc::new(extractor),
            Arc::new(embedder),
            Arc::new(deduplicator),
            Arc::new(scorer),
            Arc::new(briefing),
            config,
        )
    }

    /// Spawns one task per queue and returns their handles. Callers
    /// typically `futures::future::join_all` these and let the process
    /// run until killed (spec §4.7: at-least-once, restart-safe since every
    /// stage is itself idempotent).
    pub fn spawn_all(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.spawn_ingest(),
            self.spawn_extract(),
            self.spawn_embed_and_cluster(),
            self.spawn_score(),
            self.spawn_briefing(),
        ]
    }

    fn spawn_ingest(&self) -> JoinHandle<()> {
        let ingestion = self.ingestion.clone();
        let period = Duration::from_secs(self.ingestion_interval_minutes as u64 * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let ingestion = ingestion.clone();
                let outcome = run_with_retry(Queue::Ingest, RetryPolicy::default(), move || {
                    let ingestion = ingestion.clone();
                    async move { ingestion.ingest_all_enabled().await }
                })
                .await;
                log_tick(Queue::Ingest, outcome);
            }
        })
    }

    fn spawn_extract(&self) -> JoinHandle<()> {
        let extractor = self.extractor.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(10 * 60));
            loop {
                ticker.tick().await;
                let extractor = extractor.clone();
                let outcome = run_with_retry(Queue::Extract, RetryPolicy::default(), move || {
                    let extractor = extractor.clone();
                    async move { extractor.run_pending(BATCH_SIZE).await }
                })
                .await;
                log_tick(Queue::Extract, outcome);
            }
        })
    }

    /// Embed and cluster share the 15-minute cadence (spec §4.7) and both
    /// run on the `score` logical queue per the spec's own grouping
    /// ("score (dedup + scoring)"). The exact-match dedup pass runs first,
    /// against items still at `extracted`, so an exact duplicate never
    /// reaches the embedder at all; only the semantic pass follows embedding.
    fn spawn_embed_and_cluster(&self) -> JoinHandle<()> {
        let embedder = self.embedder.clone();
        let deduplicator = self.deduplicator.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(15 * 60));
            loop {
                ticker.tick().await;
                let exact_dedup = deduplicator.clone();
                let exact_outcome = run_with_retry(Queue::Score, RetryPolicy::default(), move || {
                    let exact_dedup = exact_dedup.clone();
                    async move { exact_dedup.run_exact_pending(BATCH_SIZE).await }
                })
                .await;
                log_tick(Queue::Score, exact_outcome);

                let embedder = embedder.clone();
                let embed_outcome = run_with_retry(Queue::Embed, RetryPolicy::default(), move || {
                    let embedder = embedder.clone();
                    async move { embedder.run_pending(BATCH_SIZE).await }
                })
                .await;
                log_tick(Queue::Embed, embed_outcome);

                let deduplicator = deduplicator.clone();
                let cluster_outcome = run_with_retry(Queue::Score, RetryPolicy::default(), move || {
                    let deduplicator = deduplicator.clone();
                    async move { deduplicator.run_pending(BATCH_SIZE).await }
                })
                .await;
                log_tick(Queue::Score, cluster_outcome);
            }
        })
    }

    fn spawn_score(&self) -> JoinHandle<()> {
        let scorer = self.scorer.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(15 * 60));
            loop {
                ticker.tick().await;
                let scorer = scorer.clone();
                let outcome = run_with_retry(Queue::Score, RetryPolicy::default(), move || {
                    let scorer = scorer.clone();
                    async move { scorer.run_pending(BATCH_SIZE).await }
                })
                .await;
                log_tick(Queue::Score, outcome);
            }
        })
    }

    /// Briefing composition at 06:50 UTC, email delivery at 07:00 UTC
    /// (spec §4.7). Email sending is an out-of-scope collaborator (spec
    /// §1 Non-goals); this task only produces the `summarise` side.
    fn spawn_briefing(&self) -> JoinHandle<()> {
        let briefing = self.briefing.clone();
        tokio::spawn(async move {
            loop {
                let wait = duration_until_utc(6, 50);
                tokio::time::sleep(wait).await;
                let briefing = briefing.clone();
                let outcome = run_with_retry(Queue::Summarise, RetryPolicy::default(), move || {
                    let briefing = briefing.clone();
                    async move { briefing.generate_all_pending().await }
                })
                .await;
                log_tick(Queue::Summarise, outcome.map(|v| v.len()));
            }
        })
    }
}

fn log_tick<T>(queue: Queue, outcome: Result<T, briefly_core::error::BrieflyError>)
where
    T: std::fmt::Debug,
{
    match outcome {
        Ok(result) => tracing::info!(%queue, ?result, "tick completed"),
        Err(err) => tracing::error!(%queue, error = %err, "tick failed after retries"),
    }
}

fn duration_until_utc(hour: u32, minute: u32) -> Duration {
    use chrono::{Timelike, Utc};
    let now = Utc::now();
    let mut target = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc();
    if target <= now {
        target += chrono::Duration::days(1);
    }
    (target - now).to_std().unwrap_or(Duration::from_secs(60))
}

/// Builds the shared Claude client the `briefly-worker` binary wires into
/// the scorer and briefing composer, when credentials are configured.
pub fn llm_client_from_config(config: &Config) -> Option<ClaudeClient> {
    config.anthropic_api_key.clone().map(ClaudeClient::new)
}

impl std::fmt::Display for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
