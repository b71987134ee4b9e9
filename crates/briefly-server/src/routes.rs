use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use briefly_pipeline::scorer::high_signal_threshold;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(health_ready))
        .route("/signals", get(list_signals))
        .route("/signals/top", get(top_signals))
        .route("/signals/:id", get(get_signal))
        .route("/signals/categories/stats", get(category_stats))
        .route("/briefings/latest", get(latest_briefing))
        .route("/briefings/:id", get(get_briefing))
        .route("/briefings/generate", post(generate_briefing))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn health_ready(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    // A cheap round trip is enough to prove the pool is usable; the
    // read-only surface doesn't need a deeper liveness probe.
    state.store.list_daily_briefing_user_ids().await?;
    Ok("ready")
}

#[derive(Debug, Deserialize)]
struct SignalsQuery {
    min_score: Option<f64>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SignalView {
    id: Uuid,
    title: String,
    url: Option<String>,
    signal_score: f64,
    relevance: f64,
    velocity: f64,
    cross_source: f64,
    novelty: f64,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
}

async fn list_signals(
    State(state): State<AppState>,
    Query(query): Query<SignalsQuery>,
) -> Result<Json<Vec<SignalView>>, ApiError> {
    let min_score = query.min_score.unwrap_or(0.0);
    let limit = query.limit.unwrap_or(50).min(200);
    let rows = state.store.get_high_signals(min_score, limit).await?;
    Ok(Json(rows.into_iter().map(to_signal_view).collect()))
}

async fn top_signals(State(state): State<AppState>) -> Result<Json<Vec<SignalView>>, ApiError> {
    let rows = state.store.get_high_signals(high_signal_threshold(), 50).await?;
    Ok(Json(rows.into_iter().map(to_signal_view).collect()))
}

async fn get_signal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SignalView>, ApiError> {
    let item = state.store.get_raw_item(id).await?;
    let score = state
        .store
        .latest_score(id)
        .await?
        .ok_or_else(|| briefly_core::error::BrieflyError::NotFound(format!("score for {id}")))?;
    Ok(Json(to_signal_view((item, score))))
}

fn to_signal_view(
    (item, score): (briefly_core::types::RawItem, briefly_core::types::ItemScore),
) -> SignalView {
    SignalView {
        id: item.id,
        title: item.title,
        url: item.url,
        signal_score: score.signal_score,
        relevance: score.relevance,
        velocity: score.velocity,
        cross_source: score.cross_source,
        novelty: score.novelty,
        published_at: item.published_at,
    }
}

async fn category_stats(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, CategoryStats>>, ApiError> {
    let rows = state.store.get_high_signals(0.0, 500).await?;
    let mut stats: HashMap<String, CategoryStats> = HashMap::new();
    for (item, score) in rows {
        let source = state.store.get_source(item.source_id).await?;
        let key = source.category.unwrap_or_else(|| "uncategorized".to_string());
        let entry = stats.entry(key).or_default();
        entry.count += 1;
        entry.avg_signal = (entry.avg_signal * (entry.count - 1) as f64 + score.signal_score)
            / entry.count as f64;
    }
    Ok(Json(stats))
}

#[derive(Debug, Default, Serialize)]
struct CategoryStats {
    count: u32,
    avg_signal: f64,
}

#[derive(Debug, Deserialize)]
struct LatestBriefingQuery {
    scope: Option<String>,
}

async fn latest_briefing(
    State(state): State<AppState>,
    Query(query): Query<LatestBriefingQuery>,
) -> Result<Json<briefly_core::types::Briefing>, ApiError> {
    let scope = query
        .scope
        .unwrap_or_else(|| briefly_core::types::Briefing::GLOBAL_SCOPE.to_string());
    let briefing = state
        .store
        .latest_briefing(&scope)
        .await?
        .ok_or_else(|| briefly_core::error::BrieflyError::NotFound(format!("briefing for {scope}")))?;
    Ok(Json(briefing))
}

#[derive(Debug, Serialize)]
struct BriefingDetail {
    #[serde(flatten)]
    briefing: briefly_core::types::Briefing,
    items: Vec<briefly_core::types::BriefingItem>,
}

async fn get_briefing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BriefingDetail>, ApiError> {
    let briefing = state
        .store
        .get_briefing(id)
        .await?
        .ok_or_else(|| briefly_core::error::BrieflyError::NotFound(format!("briefing {id}")))?;
    let items = state.store.briefing_items(id).await?;
    Ok(Json(BriefingDetail { briefing, items }))
}

#[derive(Debug, Deserialize)]
struct GenerateBriefingRequest {
    user_id: Option<Uuid>,
    #[serde(default)]
    force: bool,
}

#[derive(Debug, Serialize)]
struct GenerateBriefingResponse {
    generated: bool,
    #[serde(flatten)]
    briefing: briefly_core::types::Briefing,
}

async fn generate_briefing(
    State(state): State<AppState>,
    Json(request): Json<GenerateBriefingRequest>,
) -> Result<Json<GenerateBriefingResponse>, ApiError> {
    let (briefing, generated) = match request.user_id {
        Some(user_id) => state.briefing.generate_for_user(user_id, request.force).await?,
        None => state.briefing.generate_global(request.force).await?,
    };
    Ok(Json(GenerateBriefingResponse { generated, briefing }))
}
