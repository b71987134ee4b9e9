use std::sync::Arc;

use briefly_core::budget::RateBudget;
use briefly_core::config::Config;
use briefly_core::store::{PgStore, Store};
use briefly_ingest::{FeedIngester, HackerNewsIngester, IngestionService, RedditIngester};
use briefly_pipeline::{BriefingComposer, ContentExtractor, Deduplicator, Embedder, Scorer};
use briefly_scheduler::{llm_client_from_config, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let store: Arc<dyn Store> = Arc::new(PgStore::connect(&config.database_url).await?);

    let ingestion = IngestionService::new(
        store.clone(),
        FeedIngester::new(config.max_items_per_source as usize),
        HackerNewsIngester::new(config.max_items_per_source as usize),
        RedditIngester::new(
            config.reddit_client_id.clone(),
            config.reddit_client_secret.clone(),
            config.reddit_user_agent.clone(),
            config.max_items_per_source as usize,
        ),
    );

    let extractor = ContentExtractor::new(store.clone());

    let embedder = match &config.voyage_api_key {
        Some(key) => Embedder::with_provider(store.clone(), key.clone(), config.max_embeddings_per_hour),
        None => Embedder::dev_fallback(store.clone(), config.max_embeddings_per_hour),
    };

    let deduplicator = Deduplicator::new(store.clone());

    let llm = if config.ai_scoring_enabled {
        llm_client_from_config(&config)
    } else {
        None
    };
    let llm_budget = Arc::new(RateBudget::per_day(config.max_llm_calls_per_user_day));
    let scorer = Scorer::new(store.clone(), llm.clone(), llm_budget.clone());

    let briefing = BriefingComposer::new(
        store.clone(),
        llm,
        config.briefing_target_words,
        config.briefing_num_items,
        llm_budget,
    );

    let scheduler = Scheduler::from_parts(
        store,
        ingestion,
        extractor,
        embedder,
        deduplicator,
        scorer,
        briefing,
        &config,
    );

    tracing::info!("briefly-worker starting");
    let handles = scheduler.spawn_all();
    futures::future::join_all(handles).await;

    Ok(())
}
