//! Platform-wide trending snapshot.
//!
//! Backs the `/recommendations/trending` endpoint and the cold-start path.
//! The snapshot is cheap to recompute and heavily cached (§6's `trending`
//! cache TTL of 6h); this module owns only the query/ranking, not caching.

use anyhow::Result;
use showsync_core::math::rank_with_decay;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TrendingItem {
    pub media_id: Uuid,
    pub score: f64,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TrendingCandidates {
    pub items: Vec<TrendingItem>,
}

/// Recomputes platform-wide trending media: highly-rated items weighted by
/// recency, ranked with a small positional decay so the top slots don't
/// freeze for the whole cache TTL.
pub struct TrendingSnapshotBuilder {
    pool: PgPool,
}

impl TrendingSnapshotBuilder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn build(&self, limit: usize) -> Result<TrendingCandidates> {
        let rows = sqlx::query_as::<_, TrendingRow>(
            r#"
            SELECT m.id as media_id, m.average_rating, m.genres
            FROM media m
            WHERE m.average_rating IS NOT NULL
            ORDER BY m.average_rating DESC, m.rating_count DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64 * 2)
        .fetch_all(&self.pool)
        .await?;

        let scores: Vec<f64> = rows.iter().map(|r| r.average_rating / 10.0).collect();
        let decayed = rank_with_decay(&scores, 0.98);

        let mut items: Vec<TrendingItem> = rows
            .into_iter()
            .zip(decayed)
            .map(|(row, score)| TrendingItem {
                media_id: row.media_id,
                score,
                genres: row.genres,
            })
            .collect();
        items.truncate(limit);

        Ok(TrendingCandidates { items })
    }
}

#[derive(sqlx::FromRow)]
struct TrendingRow {
    media_id: Uuid,
    average_rating: f64,
    genres: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trending_candidates_default_is_empty() {
        let candidates = TrendingCandidates::default();
        assert!(candidates.items.is_empty());
    }
}
