//! Diversification via greedy maximal-marginal-relevance re-ranking.
//!
//! Penalizes genre overlap with already-selected items so a ranked list
//! doesn't collapse into a single-genre monoculture.

use crate::types::ScoredCandidate;
use showsync_core::math::jaccard_similarity;
use std::collections::HashSet;

/// Greedily select `limit` candidates from `candidates` (already scored,
/// any order) maximizing `score - lambda * max_overlap(selected)`, where
/// overlap is Jaccard similarity over genre tags.
pub fn diversify(mut candidates: Vec<ScoredCandidate>, lambda: f64, limit: usize) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<ScoredCandidate> = Vec::new();
    let mut selected_genres: Vec<HashSet<String>> = Vec::new();
    let mut remaining = candidates;

    while selected.len() < limit && !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_mmr = f64::NEG_INFINITY;

        for (index, candidate) in remaining.iter().enumerate() {
            let candidate_genres: HashSet<String> = candidate.genres.iter().cloned().collect();
            let max_overlap = selected_genres
                .iter()
                .map(|g| jaccard_similarity(g, &candidate_genres))
                .fold(0.0_f64, f64::max);

            let mmr = candidate.score - lambda * max_overlap;
            if mmr > best_mmr {
                best_mmr = mmr;
                best_index = index;
            }
        }

        let chosen = remaining.remove(best_index);
        selected_genres.push(chosen.genres.iter().cloned().collect());
        selected.push(chosen);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecommendationReason, RecommendationType};
    use uuid::Uuid;

    fn candidate(score: f64, genres: &[&str]) -> ScoredCandidate {
        ScoredCandidate {
            media_id: Uuid::new_v4(),
            score,
            reason: RecommendationReason::General,
            rec_type: RecommendationType::Personal,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            top_genre: genres.first().map(|g| g.to_string()),
            anchor_title: None,
        }
    }

    #[test]
    fn strong_diversity_factor_limits_genre_monoculture() {
        let mut candidates: Vec<ScoredCandidate> = (0..25)
            .map(|i| candidate(0.9 - (i as f64 * 0.001), &["drama"]))
            .collect();
        candidates.extend((0..5).map(|i| candidate(0.5 - (i as f64 * 0.01), &["comedy"])));

        let result = diversify(candidates, 0.5, 10);
        let drama_count = result.iter().filter(|c| c.genres.contains(&"drama".to_string())).count();
        assert!(drama_count <= 6);
    }

    #[test]
    fn zero_diversity_factor_allows_full_monoculture() {
        let candidates: Vec<ScoredCandidate> = (0..10)
            .map(|i| candidate(0.9 - (i as f64 * 0.001), &["drama"]))
            .collect();
        let result = diversify(candidates, 0.0, 10);
        assert_eq!(result.len(), 10);
    }
}
