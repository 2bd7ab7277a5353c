//! Pure mathematical primitives behind recommendation scoring.
//!
//! Every function here is stateless, deterministic, and side-effect free so
//! it can be unit- and property-tested in isolation from the rest of the
//! recommendation pipeline.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Cosine similarity of two sparse vectors given as weight maps.
///
/// Uses the union of both maps' keys; a key missing from one side
/// contributes 0 for that side. Empty input on either side returns 0.
pub fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let keys: HashSet<&String> = a.keys().chain(b.keys()).collect();
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for key in keys {
        let va = a.get(key).copied().unwrap_or(0.0);
        let vb = b.get(key).copied().unwrap_or(0.0);
        dot += va * vb;
        norm_a += va * va;
        norm_b += vb * vb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Jaccard similarity of two sets. By convention (tag overlap use only),
/// two empty sets are considered identical and return 1.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Pearson correlation coefficient. Returns 0 when lengths differ, fewer
/// than 2 samples are given, or either series has zero variance.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for i in 0..xs.len() {
        let dx = xs[i] - mean_x;
        let dy = ys[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Apply exponential time decay: `score * decayPerDay ^ daysOld`.
///
/// `daysOld` is computed as whole days between `timestamp` and now;
/// negative values (future timestamps) are clamped to 0.
pub fn apply_time_decay(score: f64, timestamp: DateTime<Utc>, decay_per_day: f64) -> f64 {
    let days_old = (Utc::now() - timestamp).num_days().max(0);
    score * decay_per_day.powi(days_old as i32)
}

/// Min-max normalize a map of scores into `[0, 1]`.
///
/// If all values are equal (including the single-entry case), every output
/// is 0.5.
pub fn normalize_scores(scores: &HashMap<String, f64>) -> HashMap<String, f64> {
    if scores.is_empty() {
        return HashMap::new();
    }

    let min = scores.values().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        return scores.keys().map(|k| (k.clone(), 0.5)).collect();
    }

    scores
        .iter()
        .map(|(k, v)| (k.clone(), (v - min) / (max - min)))
        .collect()
}

/// Weighted average of `values` by `weights`. Returns 0 if the slices have
/// different lengths, are empty, or the total weight is 0.
pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    if values.len() != weights.len() || values.is_empty() {
        return 0.0;
    }

    let total_weight: f64 = weights.iter().sum();
    if total_weight == 0.0 {
        return 0.0;
    }

    let weighted_sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    weighted_sum / total_weight
}

/// Shannon entropy of a distribution, normalized by `log2(|categories|)` so
/// the result lies in `[0, 1]`. Empty or single-category distributions
/// return 0.
pub fn calculate_diversity(distribution: &HashMap<String, f64>) -> f64 {
    let categories = distribution.len();
    if categories <= 1 {
        return 0.0;
    }

    let total: f64 = distribution.values().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let entropy: f64 = distribution
        .values()
        .filter(|&&v| v > 0.0)
        .map(|&v| {
            let p = v / total;
            -p * p.log2()
        })
        .sum();

    let max_entropy = (categories as f64).log2();
    if max_entropy <= 0.0 {
        0.0
    } else {
        (entropy / max_entropy).clamp(0.0, 1.0)
    }
}

/// Confidence score from interaction volume, time span, and diversity.
///
/// `confidence = 0.5 * min(1, n/50) + 0.3 * min(1, days/30) + 0.2 * diversity`.
pub fn calculate_confidence_score(
    interaction_count: u32,
    time_span_days: i64,
    diversity: f64,
) -> f64 {
    let volume_term = 0.5 * (interaction_count as f64 / 50.0).min(1.0);
    let recency_term = 0.3 * (time_span_days.max(0) as f64 / 30.0).min(1.0);
    let diversity_term = 0.2 * diversity.clamp(0.0, 1.0);
    (volume_term + recency_term + diversity_term).clamp(0.0, 1.0)
}

/// Logistic sigmoid with adjustable steepness: `1 / (1 + e^(-k*x))`.
pub fn sigmoid(x: f64, steepness: f64) -> f64 {
    1.0 / (1.0 + (-steepness * x).exp())
}

/// Sort `scores` descending and apply positional decay:
/// `scores[i] * decay_rate ^ position`.
pub fn rank_with_decay(scores: &[f64], decay_rate: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = scores.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    sorted
        .into_iter()
        .enumerate()
        .map(|(position, score)| score * decay_rate.powi(position as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn cosine_similarity_identity() {
        let a = map(&[("action", 0.8), ("drama", 0.2)]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_similarity_symmetric() {
        let a = map(&[("action", 0.8), ("drama", 0.2)]);
        let b = map(&[("drama", 0.5), ("comedy", 0.5)]);
        assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn cosine_similarity_empty_is_zero() {
        assert_eq!(cosine_similarity(&HashMap::new(), &map(&[("a", 1.0)])), 0.0);
    }

    #[test]
    fn jaccard_both_empty_is_one() {
        assert_eq!(jaccard_similarity(&HashSet::new(), &HashSet::new()), 1.0);
    }

    #[test]
    fn jaccard_overlap() {
        let a = set(&["action", "comedy"]);
        let b = set(&["action", "drama"]);
        assert!((jaccard_similarity(&a, &b) - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn pearson_requires_two_samples() {
        assert_eq!(pearson_correlation(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn pearson_zero_variance_is_zero() {
        assert_eq!(pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn normalize_scores_uniform_inputs_are_half() {
        let scores = map(&[("a", 5.0), ("b", 5.0)]);
        let normalized = normalize_scores(&scores);
        assert_eq!(normalized["a"], 0.5);
        assert_eq!(normalized["b"], 0.5);
    }

    #[test]
    fn normalize_scores_preserves_order() {
        let scores = map(&[("a", 1.0), ("b", 3.0), ("c", 2.0)]);
        let normalized = normalize_scores(&scores);
        assert!(normalized["a"] < normalized["c"]);
        assert!(normalized["c"] < normalized["b"]);
        for v in normalized.values() {
            assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn weighted_average_mismatched_lengths_is_zero() {
        assert_eq!(weighted_average(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn diversity_single_key_is_zero() {
        let dist = map(&[("drama", 10.0)]);
        assert_eq!(calculate_diversity(&dist), 0.0);
    }

    #[test]
    fn diversity_uniform_distribution_is_one() {
        let dist = map(&[("a", 1.0), ("b", 1.0), ("c", 1.0), ("d", 1.0)]);
        assert!((calculate_diversity(&dist) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_score_is_bounded() {
        let score = calculate_confidence_score(1000, 1000, 1.0);
        assert!(score <= 1.0);
        let score = calculate_confidence_score(0, 0, 0.0);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn rank_with_decay_sorts_descending_and_decays() {
        let ranked = rank_with_decay(&[0.2, 0.9, 0.5], 0.5);
        assert_eq!(ranked[0], 0.9);
        assert_eq!(ranked[1], 0.25);
        assert_eq!(ranked[2], 0.125);
    }
}
