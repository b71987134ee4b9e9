mod error;
mod routes;
mod state;

use std::sync::Arc;

use briefly_core::budget::RateBudget;
use briefly_core::config::Config;
use briefly_core::store::{PgStore, Store};
use briefly_pipeline::BriefingComposer;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let store: Arc<dyn Store> = Arc::new(PgStore::connect(&config.database_url).await?);

    let llm = if config.ai_scoring_enabled {
        config.anthropic_api_key.clone().map(ai_client::ClaudeClient::new)
    } else {
        None
    };

    let llm_budget = Arc::new(RateBudget::per_day(config.max_llm_calls_per_user_day));
    let briefing = Arc::new(BriefingComposer::new(
        store.clone(),
        llm,
        config.briefing_target_words,
        config.briefing_num_items,
        llm_budget,
    ));

    let state = AppState { store, briefing };
    let app = routes::router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "briefly-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
