//! Cold start handling.
//!
//! A user lacking sufficient interaction history falls back to trending
//! content rather than a low-confidence personal ranking.

use crate::explain::cold_start_explanation;
use crate::trending::TrendingCandidates;
use crate::types::{PreferenceProfile, RecommendationReason, RecommendationType, ScoredCandidate};

/// Whether the generator should route this user through the cold-start
/// (trending + exploration) path instead of personal scoring.
pub fn is_cold_start(profile: &PreferenceProfile) -> bool {
    !profile.has_sufficient_data()
}

/// Build cold-start candidates: trending media tagged `TRENDING_GLOBAL`
/// with an explanation that calls out the low-confidence profile.
pub fn cold_start_candidates(trending: &TrendingCandidates, limit: usize) -> Vec<ScoredCandidate> {
    trending
        .items
        .iter()
        .take(limit)
        .map(|item| ScoredCandidate {
            media_id: item.media_id,
            score: item.score,
            reason: RecommendationReason::TrendingGlobal,
            rec_type: RecommendationType::Trending,
            genres: item.genres.clone(),
            top_genre: item.genres.first().cloned(),
            anchor_title: None,
        })
        .collect()
}

pub fn cold_start_reason_text() -> String {
    cold_start_explanation()
}
