//! Content-based candidate generation: "similar to X" and genre/era/platform
//! overlap scoring against a single anchor profile or media item.

use crate::explain::reason_for_scores;
use crate::types::{Media, PreferenceProfile, RecommendationType, ScoredCandidate};
use showsync_core::config::ScoreWeights;
use showsync_core::math::cosine_similarity;

/// Score one candidate media item against a profile using the weighted
/// genre/rating/platform/era formula. `weights` MUST already be validated
/// (sum to 1 ± 1e-6) — callers fail fast at config load, not here.
pub fn score_candidate(
    media: &Media,
    profile: &PreferenceProfile,
    weights: &ScoreWeights,
) -> ScoredCandidate {
    let genre_match = cosine_similarity(&media.genre_vector(), &profile.genre_weights);
    let rating_fit = media
        .average_rating
        .map(|r| 1.0 - ((r / 10.0) - (profile.avg_rating / 10.0)).abs())
        .unwrap_or(0.5);
    let platform_match = profile
        .platform_weights
        .get(&media.media_type)
        .copied()
        .unwrap_or(0.0);
    let era_match = profile
        .era_weights
        .get(&media.era_bucket())
        .copied()
        .unwrap_or(0.0);

    let score = weights.genre * genre_match
        + weights.rating * rating_fit
        + weights.platform * platform_match
        + weights.era * era_match;

    let (reason, top_genre) = reason_for_scores(
        &[
            (weights.genre * genre_match, "genre"),
            (weights.rating * rating_fit, "rating"),
            (weights.platform * platform_match, "platform"),
            (weights.era * era_match, "era"),
        ],
        media,
    );

    ScoredCandidate {
        media_id: media.id,
        score,
        reason,
        rec_type: RecommendationType::Personal,
        genres: media.genres.clone(),
        top_genre,
        anchor_title: None,
    }
}

/// Score every candidate against an anchor media item (not a profile) for
/// "similar to X" requests: genre-overlap scoring only.
pub fn score_against_anchor(candidate: &Media, anchor: &Media) -> ScoredCandidate {
    let score = cosine_similarity(&candidate.genre_vector(), &anchor.genre_vector());
    ScoredCandidate {
        media_id: candidate.id,
        score,
        reason: crate::types::RecommendationReason::SimilarContent,
        rec_type: RecommendationType::ContentBased,
        genres: candidate.genres.clone(),
        top_genre: candidate.genres.first().cloned(),
        anchor_title: Some(anchor.title.clone()),
    }
}
