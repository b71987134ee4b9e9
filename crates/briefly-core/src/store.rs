//! Persistence layer. `Store` is the async trait every pipeline stage
//! depends on (grounded on the teacher's `SignalReader`/`ContentFetcher`
//! trait-object pattern); `PgStore` is the `sqlx`/Postgres implementation.
//! Queries are runtime-checked (`sqlx::query`/`query_as`, not the `!`
//! macros) since no database is available to verify against at build time.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::BrieflyError;
use crate::types::{
    Briefing, BriefingItem, Cluster, ClusterStatus, ExtractedContent, ItemEmbedding, ItemScore,
    NormalizedItem, RawItem, RawItemStatus, Source, SourceType, UserPreference,
};

pub type Result<T> = std::result::Result<T, BrieflyError>;

/// A cluster member similarity match, returned by the semantic dedup pass.
#[derive(Debug, Clone)]
pub struct SemanticMatch {
    pub raw_item_id: Uuid,
    pub similarity: f64,
}

#[async_trait]
pub trait Store: Send + Sync {
    // -- sources --
    async fn list_enabled_sources(&self, source_type: Option<SourceType>) -> Result<Vec<Source>>;
    async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>>;
    async fn get_source(&self, id: Uuid) -> Result<Source>;
    async fn create_source(
        &self,
        name: &str,
        source_type: SourceType,
        url: &str,
        category: Option<&str>,
        credibility_tier: i16,
        config: serde_json::Value,
    ) -> Result<Source>;

    // -- raw items --
    /// Inserts the item with `status = new` unless a row already exists for
    /// `(source_id, external_id)`, in which case returns `Ok(None)` (spec §4.1
    /// per-source idempotency).
    async fn insert_raw_item_if_new(
        &self,
        source_id: Uuid,
        item: &NormalizedItem,
    ) -> Result<Option<RawItem>>;
    async fn get_raw_item(&self, id: Uuid) -> Result<RawItem>;
    async fn find_raw_item_by_url(&self, url: &str, exclude: Uuid) -> Result<Option<RawItem>>;
    async fn find_raw_item_by_title_window(
        &self,
        title: &str,
        since: DateTime<Utc>,
        exclude: Uuid,
    ) -> Result<Option<RawItem>>;
    async fn fetch_pending(&self, status: RawItemStatus, limit: i64) -> Result<Vec<RawItem>>;
    async fn advance_status(&self, id: Uuid, to: RawItemStatus) -> Result<()>;

    // -- extraction --
    async fn upsert_extracted_content(&self, content: &ExtractedContent) -> Result<()>;
    async fn get_extracted_content(&self, raw_item_id: Uuid) -> Result<Option<ExtractedContent>>;

    // -- embeddings --
    async fn upsert_embedding(&self, embedding: &ItemEmbedding) -> Result<()>;
    async fn get_embedding(&self, raw_item_id: Uuid) -> Result<Option<ItemEmbedding>>;
    /// Top-`limit` items above `threshold` cosine similarity to `vector`,
    /// ordered by similarity desc then `published_at` asc (spec §4.4 tie
    /// break favors the older item as canonical).
    async fn find_semantic_matches(
        &self,
        vector: &[f32],
        threshold: f64,
        limit: i64,
        exclude: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<SemanticMatch>>;

    // -- clusters --
    async fn create_cluster(&self, canonical_item_id: Uuid) -> Result<Cluster>;
    async fn cluster_for_item(&self, raw_item_id: Uuid) -> Result<Option<Cluster>>;
    async fn add_cluster_member(
        &self,
        cluster_id: Uuid,
        raw_item_id: Uuid,
        is_canonical: bool,
        similarity: f64,
    ) -> Result<()>;
    async fn cluster_member_count(&self, cluster_id: Uuid) -> Result<i64>;
    async fn merge_clusters(&self, keep: Uuid, absorbed: &[Uuid]) -> Result<()>;
    async fn archive_old_clusters(&self, older_than_days: i64) -> Result<u64>;

    // -- scoring --
    /// Append-only; never overwrites a prior `ItemScore` row (spec §4.5).
    async fn insert_score(&self, score: &ItemScore) -> Result<()>;
    async fn latest_score(&self, raw_item_id: Uuid) -> Result<Option<ItemScore>>;
    async fn get_high_signals(&self, min_score: f64, limit: i64) -> Result<Vec<(RawItem, ItemScore)>>;

    // -- briefings --
    async fn briefing_for_scope_since(
        &self,
        scope: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Briefing>>;
    async fn create_briefing(
        &self,
        scope: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        summary_md: &str,
        meta: serde_json::Value,
    ) -> Result<Briefing>;
    async fn add_briefing_item(&self, item: &BriefingItem) -> Result<()>;
    async fn latest_briefing(&self, scope: &str) -> Result<Option<Briefing>>;
    async fn get_briefing(&self, id: Uuid) -> Result<Option<Briefing>>;
    async fn briefing_items(&self, briefing_id: Uuid) -> Result<Vec<BriefingItem>>;

    // -- user preferences --
    async fn get_preferences(&self, user_id: Uuid) -> Result<UserPreference>;
    async fn list_daily_briefing_user_ids(&self) -> Result<Vec<Uuid>>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_enabled_sources(&self, source_type: Option<SourceType>) -> Result<Vec<Source>> {
        let rows = match source_type {
            Some(t) => {
                sqlx::query_as::<_, Source>(
                    "SELECT id, name, type as source_type, url, category, credibility_tier, \
                     enabled, config, created_at FROM sources WHERE enabled AND type = $1",
                )
                .bind(t)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Source>(
                    "SELECT id, name, type as source_type, url, category, credibility_tier, \
                     enabled, config, created_at FROM sources WHERE enabled",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, Source>(
            "SELECT id, name, type as source_type, url, category, credibility_tier, enabled, \
             config, created_at FROM sources WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_source(&self, id: Uuid) -> Result<Source> {
        sqlx::query_as::<_, Source>(
            "SELECT id, name, type as source_type, url, category, credibility_tier, enabled, \
             config, created_at FROM sources WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BrieflyError::NotFound(format!("source {id}")))
    }

    async fn create_source(
        &self,
        name: &str,
        source_type: SourceType,
        url: &str,
        category: Option<&str>,
        credibility_tier: i16,
        config: serde_json::Value,
    ) -> Result<Source> {
        let row = sqlx::query_as::<_, Source>(
            "INSERT INTO sources (id, name, type, url, category, credibility_tier, enabled, \
             config, created_at) VALUES ($1, $2, $3, $4, $5, $6, true, $7, now()) \
             RETURNING id, name, type as source_type, url, category, credibility_tier, enabled, \
             config, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(source_type)
        .bind(url)
        .bind(category)
        .bind(credibility_tier)
        .bind(config)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_raw_item_if_new(
        &self,
        source_id: Uuid,
        item: &NormalizedItem,
    ) -> Result<Option<RawItem>> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM raw_items WHERE source_id = $1 AND external_id = $2",
        )
        .bind(source_id)
        .bind(&item.external_id)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, RawItem>(
            "INSERT INTO raw_items (id, source_id, external_id, url, canonical_url, title, \
             author, published_at, fetched_at, raw_text, raw_payload, content_hash, kind, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), $9, $10, $11, $12, 'new') \
             RETURNING id, source_id, external_id, url, canonical_url, title, author, \
             published_at, fetched_at, raw_text, raw_payload, content_hash, kind, status",
        )
        .bind(Uuid::new_v4())
        .bind(source_id)
        .bind(&item.external_id)
        .bind(&item.url)
        .bind(&item.canonical_url)
        .bind(&item.title)
        .bind(&item.author)
        .bind(item.published_at)
        .bind(&item.raw_text)
        .bind(&item.raw_payload)
        .bind(item.content_hash())
        .bind(item.kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(Some(row))
    }

    async fn get_raw_item(&self, id: Uuid) -> Result<RawItem> {
        sqlx::query_as::<_, RawItem>("SELECT * FROM raw_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BrieflyError::NotFound(format!("raw_item {id}")))
    }

    async fn find_raw_item_by_url(&self, url: &str, exclude: Uuid) -> Result<Option<RawItem>> {
        let row = sqlx::query_as::<_, RawItem>(
            "SELECT * FROM raw_items WHERE url = $1 AND id != $2 ORDER BY fetched_at ASC LIMIT 1",
        )
        .bind(url)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_raw_item_by_title_window(
        &self,
        title: &str,
        since: DateTime<Utc>,
        exclude: Uuid,
    ) -> Result<Option<RawItem>> {
        let row = sqlx::query_as::<_, RawItem>(
            "SELECT * FROM raw_items WHERE title = $1 AND fetched_at >= $2 AND id != $3 \
             ORDER BY fetched_at ASC LIMIT 1",
        )
        .bind(title)
        .bind(since)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn fetch_pending(&self, status: RawItemStatus, limit: i64) -> Result<Vec<RawItem>> {
        let rows = sqlx::query_as::<_, RawItem>(
            "SELECT * FROM raw_items WHERE status = $1 ORDER BY fetched_at ASC LIMIT $2",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn advance_status(&self, id: Uuid, to: RawItemStatus) -> Result<()> {
        sqlx::query("UPDATE raw_items SET status = $1 WHERE id = $2")
            .bind(to)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_extracted_content(&self, content: &ExtractedContent) -> Result<()> {
        sqlx::query(
            "INSERT INTO extracted_content (raw_item_id, final_url, text, word_count, method, \
             quality, created_at) VALUES ($1, $2, $3, $4, $5, $6, now()) \
             ON CONFLICT (raw_item_id) DO UPDATE SET final_url = excluded.final_url, \
             text = excluded.text, word_count = excluded.word_count, method = excluded.method, \
             quality = excluded.quality",
        )
        .bind(content.raw_item_id)
        .bind(&content.final_url)
        .bind(&content.text)
        .bind(content.word_count)
        .bind(&content.method)
        .bind(content.quality)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_extracted_content(&self, raw_item_id: Uuid) -> Result<Option<ExtractedContent>> {
        let row = sqlx::query_as::<_, ExtractedContent>(
            "SELECT * FROM extracted_content WHERE raw_item_id = $1",
        )
        .bind(raw_item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_embedding(&self, embedding: &ItemEmbedding) -> Result<()> {
        let vector = Vector::from(embedding.vector.clone());
        sqlx::query(
            "INSERT INTO item_embeddings (raw_item_id, model_id, dim, embedding, created_at) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (raw_item_id) DO UPDATE SET model_id = excluded.model_id, \
             dim = excluded.dim, embedding = excluded.embedding",
        )
        .bind(embedding.raw_item_id)
        .bind(&embedding.model_id)
        .bind(embedding.dim)
        .bind(vector)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_embedding(&self, raw_item_id: Uuid) -> Result<Option<ItemEmbedding>> {
        let row = sqlx::query(
            "SELECT raw_item_id, model_id, dim, embedding, created_at FROM item_embeddings \
             WHERE raw_item_id = $1",
        )
        .bind(raw_item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| {
            let vector: Vector = r.get("embedding");
            ItemEmbedding {
                raw_item_id: r.get("raw_item_id"),
                model_id: r.get("model_id"),
                dim: r.get("dim"),
                vector: vector.to_vec(),
                created_at: r.get("created_at"),
            }
        }))
    }

    async fn find_semantic_matches(
        &self,
        vector: &[f32],
        threshold: f64,
        limit: i64,
        exclude: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<SemanticMatch>> {
        let target = Vector::from(vector.to_vec());
        // Tie-break on oldest `published_at` (spec §4.4): the most
        // authoritative origin wins when similarity ties exactly.
        let rows = sqlx::query(
            "SELECT ie.raw_item_id as raw_item_id, \
             1 - (ie.embedding <=> $1) as similarity \
             FROM item_embeddings ie \
             JOIN raw_items ri ON ri.id = ie.raw_item_id \
             WHERE ie.raw_item_id != $2 AND 1 - (ie.embedding <=> $1) >= $3 \
             AND ri.fetched_at >= $5 \
             ORDER BY similarity DESC, ri.published_at ASC NULLS LAST LIMIT $4",
        )
        .bind(target)
        .bind(exclude)
        .bind(threshold)
        .bind(limit)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| SemanticMatch {
                raw_item_id: r.get("raw_item_id"),
                similarity: r.get::<f64, _>("similarity"),
            })
            .collect())
    }

    async fn create_cluster(&self, canonical_item_id: Uuid) -> Result<Cluster> {
        let row = sqlx::query_as::<_, Cluster>(
            "INSERT INTO clusters (id, canonical_item_id, status, created_at) \
             VALUES ($1, $2, 'open', now()) RETURNING id, canonical_item_id, status, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(canonical_item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn cluster_for_item(&self, raw_item_id: Uuid) -> Result<Option<Cluster>> {
        let row = sqlx::query_as::<_, Cluster>(
            "SELECT c.id, c.canonical_item_id, c.status, c.created_at FROM clusters c \
             JOIN cluster_members cm ON cm.cluster_id = c.id \
             WHERE cm.raw_item_id = $1 AND c.status = 'open' LIMIT 1",
        )
        .bind(raw_item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn add_cluster_member(
        &self,
        cluster_id: Uuid,
        raw_item_id: Uuid,
        is_canonical: bool,
        similarity: f64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO cluster_members (cluster_id, raw_item_id, is_canonical, similarity) \
             VALUES ($1, $2, $3, $4) ON CONFLICT (cluster_id, raw_item_id) DO NOTHING",
        )
        .bind(cluster_id)
        .bind(raw_item_id)
        .bind(is_canonical)
        .bind(similarity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn cluster_member_count(&self, cluster_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM cluster_members WHERE cluster_id = $1")
                .bind(cluster_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn merge_clusters(&self, keep: Uuid, absorbed: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for id in absorbed {
            sqlx::query(
                "UPDATE cluster_members SET cluster_id = $1, is_canonical = false \
                 WHERE cluster_id = $2",
            )
            .bind(keep)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE clusters SET status = 'merged' WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn archive_old_clusters(&self, older_than_days: i64) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let result = sqlx::query(
            "UPDATE clusters SET status = 'archived' WHERE status = 'open' AND created_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_score(&self, score: &ItemScore) -> Result<()> {
        sqlx::query(
            "INSERT INTO item_scores (raw_item_id, computed_at, relevance, velocity, \
             cross_source, novelty, signal_score, score_meta) \
             VALUES ($1, now(), $2, $3, $4, $5, $6, $7)",
        )
        .bind(score.raw_item_id)
        .bind(score.relevance)
        .bind(score.velocity)
        .bind(score.cross_source)
        .bind(score.novelty)
        .bind(score.signal_score)
        .bind(&score.score_meta)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_score(&self, raw_item_id: Uuid) -> Result<Option<ItemScore>> {
        let row = sqlx::query_as::<_, ItemScore>(
            "SELECT * FROM item_scores WHERE raw_item_id = $1 ORDER BY computed_at DESC LIMIT 1",
        )
        .bind(raw_item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_high_signals(&self, min_score: f64, limit: i64) -> Result<Vec<(RawItem, ItemScore)>> {
        let rows = sqlx::query(
            "SELECT ri.*, s.computed_at as s_computed_at, s.relevance as s_relevance, \
             s.velocity as s_velocity, s.cross_source as s_cross_source, s.novelty as s_novelty, \
             s.signal_score as s_signal_score, s.score_meta as s_score_meta \
             FROM raw_items ri \
             JOIN LATERAL ( \
               SELECT * FROM item_scores WHERE raw_item_id = ri.id \
               ORDER BY computed_at DESC LIMIT 1 \
             ) s ON true \
             WHERE s.signal_score >= $1 \
             ORDER BY s.signal_score DESC LIMIT $2",
        )
        .bind(min_score)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let item = RawItem {
                    id: r.get("id"),
                    source_id: r.get("source_id"),
                    external_id: r.get("external_id"),
                    url: r.get("url"),
                    canonical_url: r.get("canonical_url"),
                    title: r.get("title"),
                    author: r.get("author"),
                    published_at: r.get("published_at"),
                    fetched_at: r.get("fetched_at"),
                    raw_text: r.get("raw_text"),
                    raw_payload: r.get("raw_payload"),
                    content_hash: r.get("content_hash"),
                    kind: r.get("kind"),
                    status: r.get("status"),
                };
                let score = ItemScore {
                    raw_item_id: item.id,
                    computed_at: r.get("s_computed_at"),
                    relevance: r.get("s_relevance"),
                    velocity: r.get("s_velocity"),
                    cross_source: r.get("s_cross_source"),
                    novelty: r.get("s_novelty"),
                    signal_score: r.get("s_signal_score"),
                    score_meta: r.get("s_score_meta"),
                };
                (item, score)
            })
            .collect())
    }

    async fn briefing_for_scope_since(
        &self,
        scope: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Briefing>> {
        let row = sqlx::query_as::<_, Briefing>(
            "SELECT * FROM briefings WHERE scope = $1 AND created_at >= $2 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(scope)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_briefing(
        &self,
        scope: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        summary_md: &str,
        meta: serde_json::Value,
    ) -> Result<Briefing> {
        let row = sqlx::query_as::<_, Briefing>(
            "INSERT INTO briefings (id, scope, period_start, period_end, summary_md, meta, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, now()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(scope)
        .bind(period_start)
        .bind(period_end)
        .bind(summary_md)
        .bind(meta)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn add_briefing_item(&self, item: &BriefingItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO briefing_items (briefing_id, rank, raw_item_id, cluster_id, title, \
             one_liner, why_it_matters, confidence, signal_score, sources) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(item.briefing_id)
        .bind(item.rank)
        .bind(item.raw_item_id)
        .bind(item.cluster_id)
        .bind(&item.title)
        .bind(&item.one_liner)
        .bind(&item.why_it_matters)
        .bind(item.confidence)
        .bind(item.signal_score)
        .bind(&item.sources)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_briefing(&self, scope: &str) -> Result<Option<Briefing>> {
        let row = sqlx::query_as::<_, Briefing>(
            "SELECT * FROM briefings WHERE scope = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_briefing(&self, id: Uuid) -> Result<Option<Briefing>> {
        let row = sqlx::query_as::<_, Briefing>("SELECT * FROM briefings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn briefing_items(&self, briefing_id: Uuid) -> Result<Vec<BriefingItem>> {
        let rows = sqlx::query_as::<_, BriefingItem>(
            "SELECT * FROM briefing_items WHERE briefing_id = $1 ORDER BY rank ASC",
        )
        .bind(briefing_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_preferences(&self, user_id: Uuid) -> Result<UserPreference> {
        let row = sqlx::query_as::<_, UserPreference>(
            "SELECT * FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.unwrap_or(UserPreference {
            user_id,
            ..Default::default()
        }))
    }

    async fn list_daily_briefing_user_ids(&self) -> Result<Vec<Uuid>> {
        let rows =
            sqlx::query_scalar("SELECT user_id FROM user_preferences WHERE email_daily = true")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}
