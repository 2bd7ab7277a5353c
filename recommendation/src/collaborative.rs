//! Collaborative candidate generation.
//!
//! Finds users compatible with the target (cosine similarity of
//! genre-weight vectors, see [`crate::profile::compatibility`]) and
//! surfaces media those users rated highly that the target hasn't seen.

use crate::profile::compatibility;
use crate::types::{Media, PreferenceProfile, RecommendationReason, RecommendationType,
    ScoredCandidate};
use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Minimum rating (out of 10) a similar user must have given an item for it
/// to be considered a collaborative candidate.
const SIMILAR_USER_MIN_RATING: f64 = 8.0; // corresponds to the spec's "rated >= 4" on a 1-5 scale

/// How many of the most compatible users to pool candidates from.
const TOP_SIMILAR_USERS: usize = 20;

pub struct CollaborativeEngine {
    pool: PgPool,
}

impl CollaborativeEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the most compatible users to `profile`, among users who have
    /// cached preference profiles, excluding the target itself.
    pub async fn similar_users(
        &self,
        profile: &PreferenceProfile,
        all_profiles: &[PreferenceProfile],
    ) -> Result<Vec<(Uuid, f64)>> {
        let mut scored: Vec<(Uuid, f64)> = all_profiles
            .iter()
            .filter(|p| p.user_id != profile.user_id)
            .map(|p| (p.user_id, compatibility(&profile.genre_weights, &p.genre_weights)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(TOP_SIMILAR_USERS);
        Ok(scored)
    }

    /// Media rated highly by similar users, excluded if already in the
    /// target's library, weighted by the rating similar user's compatibility.
    pub async fn candidates(
        &self,
        similar_users: &[(Uuid, f64)],
        library_media_ids: &[Uuid],
        candidate_pool: &[Media],
    ) -> Result<Vec<ScoredCandidate>> {
        let similar_ids: Vec<Uuid> = similar_users.iter().map(|(id, _)| *id).collect();
        if similar_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, HighRatingRow>(
            r#"
            SELECT user_id, media_id, rating
            FROM interactions
            WHERE user_id = ANY($1) AND rating >= $2
            "#,
        )
        .bind(&similar_ids)
        .bind(SIMILAR_USER_MIN_RATING)
        .fetch_all(&self.pool)
        .await?;

        let weight_by_user: std::collections::HashMap<Uuid, f64> =
            similar_users.iter().cloned().collect();
        let media_by_id: std::collections::HashMap<Uuid, &Media> =
            candidate_pool.iter().map(|m| (m.id, m)).collect();

        let mut accumulated: std::collections::HashMap<Uuid, f64> = std::collections::HashMap::new();
        for row in rows {
            if library_media_ids.contains(&row.media_id) {
                continue;
            }
            if !media_by_id.contains_key(&row.media_id) {
                continue;
            }
            let weight = weight_by_user.get(&row.user_id).copied().unwrap_or(0.0);
            *accumulated.entry(row.media_id).or_insert(0.0) += weight * (row.rating / 10.0);
        }

        Ok(accumulated
            .into_iter()
            .filter_map(|(media_id, score)| {
                let media = media_by_id.get(&media_id)?;
                Some(ScoredCandidate {
                    media_id,
                    score,
                    reason: RecommendationReason::SimilarUsers,
                    rec_type: RecommendationType::Collaborative,
                    genres: media.genres.clone(),
                    top_genre: media.genres.first().cloned(),
                    anchor_title: None,
                })
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct HighRatingRow {
    user_id: Uuid,
    media_id: Uuid,
    rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile_with_genre(genre: &str) -> PreferenceProfile {
        let mut profile = PreferenceProfile::empty(Uuid::new_v4());
        profile.genre_weights.insert(genre.to_string(), 1.0);
        profile
    }

    #[tokio::test]
    async fn similar_users_excludes_target_and_ranks_by_compatibility() {
        let pool = sqlx::PgPool::connect_lazy("postgresql://localhost/showsync").unwrap();
        let engine = CollaborativeEngine::new(pool);
        let target = profile_with_genre("drama");
        let close = profile_with_genre("drama");
        let far = profile_with_genre("comedy");
        let all = vec![target.clone(), close.clone(), far.clone()];

        let result = engine.similar_users(&target, &all).await.unwrap();
        assert!(result.iter().all(|(id, _)| *id != target.user_id));
        assert_eq!(result[0].0, close.user_id);
        let _ = Utc::now();
    }
}
