//! Preference Profile Builder
//!
//! Rebuilds a user's [`PreferenceProfile`] from their interaction history.
//! Pure with respect to I/O: callers fetch interactions, this module does
//! the accumulation and classification.

use crate::types::{Interaction, InteractionStatus, Media, PreferenceProfile, PreferredLength,
    ViewingPersonality};
use anyhow::Result;
use chrono::{DateTime, Utc};
use showsync_core::config::PersonalityThresholds;
use showsync_core::math::{calculate_confidence_score, calculate_diversity, cosine_similarity,
    normalize_scores};
use std::collections::HashMap;
use uuid::Uuid;

/// Contributions are dropped from a weight map once their accumulated
/// magnitude falls below this epsilon, keeping maps small and meaningful.
const WEIGHT_EPSILON: f64 = 1e-6;

/// Default average rating assumed when a user has no rated interactions yet.
const DEFAULT_AVG_RATING: f64 = 7.0;

pub struct PreferenceProfileBuilder {
    pub decay_per_day: f64,
    pub thresholds: PersonalityThresholds,
}

impl PreferenceProfileBuilder {
    pub fn new(decay_per_day: f64, thresholds: PersonalityThresholds) -> Self {
        Self {
            decay_per_day,
            thresholds,
        }
    }

    /// Rebuild a profile from interactions (most recent first) joined with
    /// their media metadata. Interactions missing a media lookup are skipped.
    pub fn build(
        &self,
        user_id: Uuid,
        interactions: &[(Interaction, Media)],
    ) -> Result<PreferenceProfile> {
        if interactions.is_empty() {
            return Ok(PreferenceProfile::empty(user_id));
        }

        let now = Utc::now();
        let mut genre_acc: HashMap<String, f64> = HashMap::new();
        let mut platform_acc: HashMap<String, f64> = HashMap::new();
        let mut era_acc: HashMap<String, f64> = HashMap::new();

        let ratings: Vec<f64> = interactions
            .iter()
            .filter_map(|(i, _)| i.rating)
            .collect();
        let avg_rating = if ratings.is_empty() {
            DEFAULT_AVG_RATING
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        };

        let mut length_votes: HashMap<PreferredLength, u32> = HashMap::new();
        let mut total_completed = 0u32;

        for (interaction, media) in interactions {
            let rating = interaction.rating.unwrap_or(avg_rating);
            let influence = rating - avg_rating;
            let decayed = showsync_core::math::apply_time_decay(
                influence,
                interaction.updated_at,
                self.decay_per_day,
            );

            for genre in &media.genres {
                *genre_acc.entry(genre.clone()).or_insert(0.0) += decayed;
            }
            *platform_acc.entry(media.media_type.clone()).or_insert(0.0) += decayed;
            *era_acc.entry(media.era_bucket()).or_insert(0.0) += decayed;

            if let Some(minutes) = media.runtime_minutes {
                *length_votes
                    .entry(PreferredLength::from_minutes(minutes))
                    .or_insert(0) += 1;
            }

            if interaction.status == InteractionStatus::Completed {
                total_completed += 1;
            }
        }

        let genre_weights = drop_small(normalize_scores(&genre_acc));
        let platform_weights = drop_small(normalize_scores(&platform_acc));
        let era_weights = drop_small(normalize_scores(&era_acc));

        let rating_variance = if ratings.len() < 2 {
            0.0
        } else {
            ratings.iter().map(|r| (r - avg_rating).powi(2)).sum::<f64>() / ratings.len() as f64
        };

        let total_interactions = interactions.len() as u32;
        let completion_rate = total_completed as f64 / total_interactions as f64;
        let genre_diversity = calculate_diversity(&genre_weights);

        let first_interaction_at = interactions
            .iter()
            .map(|(i, _)| i.updated_at)
            .min()
            .unwrap_or(now);
        let days_since_first = (now - first_interaction_at).num_days().max(0);

        let confidence = calculate_confidence_score(
            total_interactions,
            days_since_first,
            genre_diversity,
        );

        let personality = self.classify_personality(
            total_interactions,
            completion_rate,
            rating_variance,
            genre_diversity,
        );

        let preferred_length = length_votes
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(length, _)| length)
            .unwrap_or(PreferredLength::Medium);

        Ok(PreferenceProfile {
            user_id,
            genre_weights,
            platform_weights,
            era_weights,
            preferred_length,
            avg_rating,
            rating_variance,
            total_interactions,
            total_completed,
            personality,
            confidence,
            last_calculated_at: now,
        })
    }

    /// Classify viewing personality from simple thresholds on interaction
    /// volume, completion rate, rating variance, and genre diversity. Ties
    /// between personalities break in the order the enum declares them.
    fn classify_personality(
        &self,
        total_interactions: u32,
        completion_rate: f64,
        rating_variance: f64,
        genre_diversity: f64,
    ) -> ViewingPersonality {
        if total_interactions < self.thresholds.min_interactions_for_classification {
            return ViewingPersonality::Casual;
        }
        if rating_variance >= self.thresholds.high_rating_variance {
            return ViewingPersonality::Critic;
        }
        if completion_rate >= self.thresholds.high_completion_rate {
            return ViewingPersonality::BingeWatcher;
        }
        if genre_diversity >= self.thresholds.high_genre_diversity {
            return ViewingPersonality::Explorer;
        }
        ViewingPersonality::Casual
    }
}

/// Cosine similarity of two users' genre-weight vectors; used by
/// collaborative scoring and group-compatibility matching.
pub fn compatibility(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    cosine_similarity(a, b)
}

fn drop_small(map: HashMap<String, f64>) -> HashMap<String, f64> {
    map.into_iter().filter(|(_, v)| v.abs() > WEIGHT_EPSILON).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InteractionStatus;

    fn media(genres: &[&str], media_type: &str, year: i32) -> Media {
        Media {
            id: Uuid::new_v4(),
            title: "Title".to_string(),
            media_type: media_type.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            release_date: DateTime::parse_from_rfc3339(&format!("{}-01-01T00:00:00Z", year))
                .unwrap()
                .with_timezone(&Utc),
            runtime_minutes: Some(100),
            average_rating: Some(8.0),
            rating_count: Some(100),
        }
    }

    fn interaction(rating: Option<f64>, status: InteractionStatus) -> Interaction {
        Interaction {
            user_id: Uuid::new_v4(),
            media_id: Uuid::new_v4(),
            rating,
            status,
            progress: Some(1.0),
            favorite: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_interactions_yields_zero_confidence_profile() {
        let builder = PreferenceProfileBuilder::new(0.995, PersonalityThresholds::default());
        let profile = builder.build(Uuid::new_v4(), &[]).unwrap();
        assert_eq!(profile.confidence, 0.0);
        assert_eq!(profile.personality, ViewingPersonality::Casual);
        assert!(!profile.has_sufficient_data());
    }

    #[test]
    fn sci_fi_heavy_history_dominates_genre_weights() {
        let builder = PreferenceProfileBuilder::new(0.995, PersonalityThresholds::default());
        let interactions: Vec<(Interaction, Media)> = (0..10)
            .map(|_| {
                (
                    interaction(Some(9.0), InteractionStatus::Completed),
                    media(&["sci-fi"], "streaming", 2020),
                )
            })
            .collect();

        let profile = builder.build(Uuid::new_v4(), &interactions).unwrap();
        assert!(profile.genre_weights.get("sci-fi").copied().unwrap_or(0.0) > 0.0);
        assert_eq!(profile.total_interactions, 10);
        assert_eq!(profile.total_completed, 10);
        assert!(profile.has_sufficient_data());
    }

    #[test]
    fn weight_maps_never_contain_zero_magnitude_entries() {
        let builder = PreferenceProfileBuilder::new(0.995, PersonalityThresholds::default());
        let interactions = vec![(
            interaction(Some(7.0), InteractionStatus::Completed),
            media(&["drama"], "streaming", 2015),
        )];
        let profile = builder.build(Uuid::new_v4(), &interactions).unwrap();
        for weight in profile.genre_weights.values() {
            assert!(weight.abs() > WEIGHT_EPSILON);
        }
    }

    #[test]
    fn compatibility_is_symmetric_cosine() {
        let mut a = HashMap::new();
        a.insert("drama".to_string(), 1.0);
        let mut b = HashMap::new();
        b.insert("drama".to_string(), 1.0);
        assert_eq!(compatibility(&a, &b), compatibility(&b, &a));
        assert!((compatibility(&a, &b) - 1.0).abs() < 1e-9);
    }
}
