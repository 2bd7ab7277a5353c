//! Recommendation Store & Lifecycle Manager.
//!
//! Owns the write path (replace a user's active set, enforcing the
//! per-user cap via eviction), the read path (paged, cache-through), and
//! the idempotent view/dismiss transitions. Per-user mutation is
//! serialized through [`DashMap`]-backed locks, mirroring the teacher's
//! per-key mutex pattern for avoiding lost updates under concurrent writers.

use crate::cache::{page_key, RecommendationCache};
use crate::recommendation::explain;
use crate::types::{ContentRecommendation, GroupRecommendation, RecommendationKind, ScoredCandidate};
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use showsync_core::config::RecommendationConfig;
use showsync_core::error::RecommendationError;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

pub struct RecommendationStore {
    pool: PgPool,
    cache: RecommendationCache,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl RecommendationStore {
    pub fn new(pool: PgPool, cache: RecommendationCache) -> Self {
        Self {
            pool,
            cache,
            locks: DashMap::new(),
        }
    }

    async fn lock_for(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Persists freshly-generated candidates as the user's active
    /// recommendation set, evicting older rows to respect
    /// `maxActivePerUser`. Eviction priority: dismissed, then expired, then
    /// the oldest viewed row, then the oldest row outright.
    pub async fn replace_active(
        &self,
        user_id: Uuid,
        candidates: Vec<ScoredCandidate>,
        config: &RecommendationConfig,
    ) -> Result<Vec<ContentRecommendation>> {
        let _guard = self.lock_for(user_id).await;
        let now = Utc::now();
        let expires_at = now + ChronoDuration::days(config.content_rec_expiry_days);

        let mut rows = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let explanation = explain(&candidate);
            let row = ContentRecommendation {
                id: Uuid::new_v4(),
                user_id,
                media_id: candidate.media_id,
                score: candidate.score,
                reason: candidate.reason,
                explanation,
                rec_type: candidate.rec_type,
                created_at: now,
                expires_at,
                viewed_at: None,
                dismissed_at: None,
                dismiss_reason: None,
            };

            sqlx::query(
                r#"
                INSERT INTO content_recommendations
                    (id, user_id, media_id, score, reason, explanation, rec_type, created_at, expires_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(row.id)
            .bind(row.user_id)
            .bind(row.media_id)
            .bind(row.score)
            .bind(serde_json::to_string(&row.reason)?)
            .bind(&row.explanation)
            .bind(serde_json::to_string(&row.rec_type)?)
            .bind(row.created_at)
            .bind(row.expires_at)
            .execute(&self.pool)
            .await?;

            rows.push(row);
        }

        self.evict_excess(user_id, config.max_active_per_user).await?;
        self.cache.invalidate_user_pages(user_id).await;
        info!(%user_id, inserted = rows.len(), "replaced active recommendations");
        Ok(rows)
    }

    async fn evict_excess(&self, user_id: Uuid, max_active: u32) -> Result<()> {
        let active_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM content_recommendations
            WHERE user_id = $1 AND dismissed_at IS NULL AND expires_at > now()
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let overflow = active_count - max_active as i64;
        if overflow <= 0 {
            return Ok(());
        }

        // Dismissed rows first (already inactive, just pruning), then
        // expired, then oldest-viewed, then oldest outright.
        let stages = [
            "dismissed_at IS NOT NULL",
            "expires_at <= now()",
            "viewed_at IS NOT NULL ORDER BY created_at ASC",
            "TRUE ORDER BY created_at ASC",
        ];

        let mut remaining = overflow;
        for stage in stages {
            if remaining <= 0 {
                break;
            }
            let query = format!(
                r#"
                DELETE FROM content_recommendations
                WHERE id IN (
                    SELECT id FROM content_recommendations
                    WHERE user_id = $1 AND {}
                    LIMIT $2
                )
                "#,
                stage
            );
            let deleted = sqlx::query(&query)
                .bind(user_id)
                .bind(remaining)
                .execute(&self.pool)
                .await?
                .rows_affected();
            remaining -= deleted as i64;
        }

        if remaining > 0 {
            warn!(%user_id, remaining, "could not evict enough rows to respect max_active_per_user");
        }
        Ok(())
    }

    /// Cache-through paged read of a user's active recommendations,
    /// ordered by score desc with createdAt desc as the tiebreaker.
    pub async fn active_for_user(
        &self,
        user_id: Uuid,
        page: u32,
        size: u32,
    ) -> Result<Page<ContentRecommendation>> {
        let key = page_key(user_id, page, size);
        if let Some(cached) = self.cache.get::<Vec<ContentRecommendationRow>>(&key).await {
            let rows: Result<Vec<ContentRecommendation>> =
                cached.into_iter().map(|r| r.into_domain()).collect();
            let content = rows?;
            let total_elements = self.count_active(user_id).await?;
            return Ok(Page {
                content,
                page,
                size,
                total_elements,
            });
        }

        let offset = (page as i64) * (size as i64);
        let rows = sqlx::query_as::<_, ContentRecommendationRow>(
            r#"
            SELECT id, user_id, media_id, score, reason, explanation, rec_type,
                   created_at, expires_at, viewed_at, dismissed_at, dismiss_reason
            FROM content_recommendations
            WHERE user_id = $1 AND dismissed_at IS NULL AND expires_at > now()
            ORDER BY score DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.cache
            .set(&key, &rows, std::time::Duration::from_secs(60))
            .await;

        let total_elements = self.count_active(user_id).await?;
        let content: Result<Vec<ContentRecommendation>> =
            rows.into_iter().map(|r| r.into_domain()).collect();

        Ok(Page {
            content: content?,
            page,
            size,
            total_elements,
        })
    }

    async fn count_active(&self, user_id: Uuid) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM content_recommendations
            WHERE user_id = $1 AND dismissed_at IS NULL AND expires_at > now()
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    /// Marks a recommendation viewed. Idempotent: a second call is a no-op.
    pub async fn mark_viewed(&self, kind: RecommendationKind, id: Uuid) -> Result<()> {
        let table = table_for(kind);
        let query = format!(
            "UPDATE {} SET viewed_at = now() WHERE id = $1 AND viewed_at IS NULL",
            table
        );
        sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    /// Marks a recommendation dismissed with an optional reason. Idempotent.
    pub async fn dismiss(
        &self,
        kind: RecommendationKind,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<()> {
        let table = table_for(kind);
        let query = format!(
            "UPDATE {} SET dismissed_at = now(), dismiss_reason = $2 WHERE id = $1 AND dismissed_at IS NULL",
            table
        );
        sqlx::query(&query)
            .bind(id)
            .bind(reason)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn replace_group_active(
        &self,
        user_id: Uuid,
        rows: Vec<GroupRecommendation>,
    ) -> Result<()> {
        let _guard = self.lock_for(user_id).await;
        for row in &rows {
            sqlx::query(
                r#"
                INSERT INTO group_recommendations
                    (id, user_id, group_id, score, reason, explanation, created_at, expires_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(row.id)
            .bind(row.user_id)
            .bind(row.group_id)
            .bind(row.score)
            .bind(serde_json::to_string(&row.reason)?)
            .bind(&row.explanation)
            .bind(row.created_at)
            .bind(row.expires_at)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

fn table_for(kind: RecommendationKind) -> &'static str {
    match kind {
        RecommendationKind::Content => "content_recommendations",
        RecommendationKind::Group => "group_recommendations",
    }
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize)]
struct ContentRecommendationRow {
    id: Uuid,
    user_id: Uuid,
    media_id: Uuid,
    score: f64,
    reason: String,
    explanation: String,
    rec_type: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    viewed_at: Option<DateTime<Utc>>,
    dismissed_at: Option<DateTime<Utc>>,
    dismiss_reason: Option<String>,
}

impl ContentRecommendationRow {
    fn into_domain(self) -> Result<ContentRecommendation> {
        Ok(ContentRecommendation {
            id: self.id,
            user_id: self.user_id,
            media_id: self.media_id,
            score: self.score,
            reason: serde_json::from_str(&self.reason)
                .map_err(|e| RecommendationError::database(e, "decode reason"))?,
            explanation: self.explanation,
            rec_type: serde_json::from_str(&self.rec_type)
                .map_err(|e| RecommendationError::database(e, "decode rec_type"))?,
            created_at: self.created_at,
            expires_at: self.expires_at,
            viewed_at: self.viewed_at,
            dismissed_at: self.dismissed_at,
            dismiss_reason: self.dismiss_reason,
        })
    }
}
