use std::sync::Arc;

use briefly_core::error::BrieflyError;
use briefly_core::store::Store;
use briefly_core::types::{ClusterStatus, RawItem, RawItemStatus};
use chrono::{Duration, Utc};
use uuid::Uuid;

const TITLE_WINDOW_DAYS: i64 = 7;
const SEMANTIC_THRESHOLD: f64 = 0.92;
const SEMANTIC_LIMIT: i64 = 5;
const CLUSTER_ARCHIVE_DAYS: i64 = 30;

/// Dedup + clustering stage (spec §4.4). The exact pass (URL, then title
/// within a 7-day window) runs on `extracted` items, before embedding is ever
/// generated, since an exact duplicate never needs its own embedding. The
/// semantic pass runs afterwards on `embedded` items, over the vector index.
pub struct Deduplicator {
    store: Arc<dyn Store>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Exact-match pass over items that have just been extracted but not yet
    /// embedded (spec §4.4: "runs during initial processing of a new item").
    /// A hit joins the matched cluster and skips straight to `clustered`,
    /// saving an embedding call entirely; a miss leaves the item at
    /// `extracted` so the embedder picks it up normally.
    pub async fn run_exact_pending(&self, limit: i64) -> Result<usize, BrieflyError> {
        let items = self
            .store
            .fetch_pending(RawItemStatus::Extracted, limit)
            .await?;
        let mut matched = 0usize;
        for item in items {
            if self.try_exact_pass(&item).await? {
                self.store.advance_status(item.id, RawItemStatus::Clustered).await?;
                matched += 1;
            }
        }
        Ok(matched)
    }

    /// Semantic pass over items that finished embedding. Still tries the
    /// exact pass first as a safety net for items that reach `embedded`
    /// without having gone through `run_exact_pending` (e.g. a reprocessed
    /// item), but in steady state the exact pass already caught these.
    pub async fn run_pending(&self, limit: i64) -> Result<usize, BrieflyError> {
        let items = self
            .store
            .fetch_pending(RawItemStatus::Embedded, limit)
            .await?;
        let mut processed = 0usize;
        for item in items {
            self.cluster_item(&item).await?;
            processed += 1;
        }
        Ok(processed)
    }

    async fn cluster_item(&self, item: &RawItem) -> Result<(), BrieflyError> {
        // Semantic pass is a no-op if the item already belongs to a cluster
        // (e.g. a concurrent exact-pass hit from a sibling item's run).
        if self.store.cluster_for_item(item.id).await?.is_some() {
            self.store.advance_status(item.id, RawItemStatus::Clustered).await?;
            return Ok(());
        }

        if self.try_exact_pass(item).await? {
            self.store.advance_status(item.id, RawItemStatus::Clustered).await?;
            return Ok(());
        }

        if self.try_semantic_pass(item).await? {
            self.store.advance_status(item.id, RawItemStatus::Clustered).await?;
            return Ok(());
        }

        // No match on either pass: item becomes its own cluster's canonical.
        let cluster = self.store.create_cluster(item.id).await?;
        self.store
            .add_cluster_member(cluster.id, item.id, true, 1.0)
            .await?;
        self.store.advance_status(item.id, RawItemStatus::Clustered).await?;
        Ok(())
    }

    async fn try_exact_pass(&self, item: &RawItem) -> Result<bool, BrieflyError> {
        if let Some(url) = item.url.as_deref() {
            if let Some(dup) = self.store.find_raw_item_by_url(url, item.id).await? {
                self.join_cluster(dup.id, item.id, 1.0).await?;
                return Ok(true);
            }
        }

        let since = item.fetched_at - Duration::days(TITLE_WINDOW_DAYS);
        if let Some(dup) = self
            .store
            .find_raw_item_by_title_window(&item.title, since, item.id)
            .await?
        {
            self.join_cluster(dup.id, item.id, 1.0).await?;
            return Ok(true);
        }

        Ok(false)
    }

    async fn try_semantic_pass(&self, item: &RawItem) -> Result<bool, BrieflyError> {
        let Some(embedding) = self.store.get_embedding(item.id).await? else {
            // No embedding: can still be clustered exactly, never semantically.
            return Ok(false);
        };

        let since = item.fetched_at - Duration::days(TITLE_WINDOW_DAYS);
        let matches = self
            .store
            .find_semantic_matches(
                &embedding.vector,
                SEMANTIC_THRESHOLD,
                SEMANTIC_LIMIT,
                item.id,
                since,
            )
            .await?;

        let Some(best) = matches.into_iter().next() else {
            return Ok(false);
        };

        self.join_cluster(best.raw_item_id, item.id, best.similarity).await?;
        Ok(true)
    }

    /// Cluster assignment protocol (spec §4.4): `canonical_candidate` is
    /// the matched item. If it already has a cluster, `joiner` joins that
    /// one; otherwise a new cluster is created with `canonical_candidate`
    /// as the canonical member before `joiner` is added.
    async fn join_cluster(
        &self,
        canonical_candidate: Uuid,
        joiner: Uuid,
        similarity: f64,
    ) -> Result<Uuid, BrieflyError> {
        let cluster = match self.store.cluster_for_item(canonical_candidate).await? {
            Some(c) => c,
            None => {
                let c = self.store.create_cluster(canonical_candidate).await?;
                self.store
                    .add_cluster_member(c.id, canonical_candidate, true, 1.0)
                    .await?;
                c
            }
        };
        self.store
            .add_cluster_member(cluster.id, joiner, false, similarity)
            .await?;
        Ok(cluster.id)
    }

    /// Administrative operation: folds `absorbed` clusters into `keep`,
    /// marking the absorbed ones `merged` (spec §4.4 cluster lifecycle).
    pub async fn merge_clusters(&self, keep: Uuid, absorbed: &[Uuid]) -> Result<(), BrieflyError> {
        self.store.merge_clusters(keep, absorbed).await
    }

    /// Marks `open` clusters older than 30 days `archived`. Read-only
    /// otherwise: archived clusters are never deleted or further mutated.
    pub async fn archive_old_clusters(&self) -> Result<u64, BrieflyError> {
        self.store.archive_old_clusters(CLUSTER_ARCHIVE_DAYS).await
    }
}

/// Only meaningful while a cluster is `open`; merged/archived clusters are
/// excluded from `Store::cluster_for_item` lookups.
pub fn is_joinable(status: ClusterStatus) -> bool {
    matches!(status, ClusterStatus::Open)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_clusters_are_joinable() {
        assert!(is_joinable(ClusterStatus::Open));
        assert!(!is_joinable(ClusterStatus::Merged));
        assert!(!is_joinable(ClusterStatus::Archived));
    }
}
