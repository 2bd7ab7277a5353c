//! Group-facing recommendations: suggesting groups to a user, and scoring
//! content for a group's members collectively.

use crate::profile::compatibility;
use crate::recommendation::GeneratorMode;
use crate::types::{
    Group, GroupRecommendation, GroupVisibility, Media, PreferenceProfile, RecommendationReason,
    ScoredCandidate,
};
use chrono::{Duration as ChronoDuration, Utc};
use showsync_core::math::{cosine_similarity, normalize_scores};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Weight of each term in the group-suggestion score. Not exposed as
/// config since the terms aren't independently tunable without a
/// calibration dataset; revisit if `/recommendations/groups` quality needs
/// operator-facing tuning knobs.
const WEIGHT_COMPATIBILITY: f64 = 0.4;
const WEIGHT_ACTIVITY: f64 = 0.2;
const WEIGHT_SIZE_FIT: f64 = 0.15;
const WEIGHT_GENRE: f64 = 0.25;

/// Member count a group is considered ideally sized at; size fit falls off
/// linearly on either side.
const IDEAL_GROUP_SIZE: f64 = 8.0;

/// Scores candidate groups for a user: `α·meanMemberCompatibility +
/// β·groupActivityLevel + γ·sizeFit + δ·genreCompatibility`, filtered to
/// groups the user is eligible to see.
pub fn suggest_groups(
    profile: &PreferenceProfile,
    candidates: &[(Group, Vec<PreferenceProfile>)],
    eligible_private_group_ids: &HashSet<Uuid>,
) -> Vec<(Uuid, f64)> {
    candidates
        .iter()
        .filter(|(group, _)| {
            group.visibility == GroupVisibility::Public
                || eligible_private_group_ids.contains(&group.id)
        })
        .map(|(group, members)| {
            let mean_compatibility = if members.is_empty() {
                0.0
            } else {
                members
                    .iter()
                    .map(|m| compatibility(&profile.genre_weights, &m.genre_weights))
                    .sum::<f64>()
                    / members.len() as f64
            };

            let size_fit = 1.0 - ((group.member_count as f64 - IDEAL_GROUP_SIZE).abs() / IDEAL_GROUP_SIZE)
                .clamp(0.0, 1.0);

            let group_genre_vector = aggregate_genre_vector(members);
            let genre_compatibility = cosine_similarity(&profile.genre_weights, &group_genre_vector);

            let score = WEIGHT_COMPATIBILITY * mean_compatibility
                + WEIGHT_ACTIVITY * group.activity_level.clamp(0.0, 1.0)
                + WEIGHT_SIZE_FIT * size_fit
                + WEIGHT_GENRE * genre_compatibility;

            (group.id, score)
        })
        .collect()
}

fn aggregate_genre_vector(members: &[PreferenceProfile]) -> HashMap<String, f64> {
    let mut accumulated: HashMap<String, f64> = HashMap::new();
    for member in members {
        for (genre, weight) in &member.genre_weights {
            *accumulated.entry(genre.clone()).or_insert(0.0) += weight;
        }
    }
    normalize_scores(&accumulated)
}

pub fn build_group_recommendation(
    user_id: Uuid,
    group_id: Uuid,
    score: f64,
    expiry_days: i64,
) -> GroupRecommendation {
    let now = Utc::now();
    GroupRecommendation {
        id: Uuid::new_v4(),
        user_id,
        group_id,
        score,
        reason: RecommendationReason::GroupActivity,
        explanation: "Matches your taste and the group's activity".to_string(),
        created_at: now,
        expires_at: now + ChronoDuration::days(expiry_days),
        viewed_at: None,
        dismissed_at: None,
        dismiss_reason: None,
    }
}

/// Content recommendations for a group as a whole: candidates the group's
/// active members haven't all rated poorly, scored by the mean per-member
/// score and left for global diversification by the caller.
pub struct GroupMode<'a> {
    pub member_profiles: &'a [PreferenceProfile],
    pub low_rated_media_ids: &'a HashSet<Uuid>,
}

impl GeneratorMode for GroupMode<'_> {
    fn generate(&self, ctx: &crate::recommendation::GenerationContext) -> Vec<ScoredCandidate> {
        ctx.catalog
            .iter()
            .filter(|media| !self.low_rated_media_ids.contains(&media.id))
            .map(|media| self.score_for_group(media))
            .collect()
    }
}

impl GroupMode<'_> {
    fn score_for_group(&self, media: &Media) -> ScoredCandidate {
        let genre_vector = media.genre_vector();
        let scores: Vec<f64> = self
            .member_profiles
            .iter()
            .map(|profile| cosine_similarity(&genre_vector, &profile.genre_weights))
            .collect();
        let mean_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        ScoredCandidate {
            media_id: media.id,
            score: mean_score,
            reason: RecommendationReason::GroupActivity,
            rec_type: crate::types::RecommendationType::Group,
            genres: media.genres.clone(),
            top_genre: media.genres.first().cloned(),
            anchor_title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_genre(genre: &str, weight: f64) -> PreferenceProfile {
        let mut profile = PreferenceProfile::empty(Uuid::new_v4());
        profile.genre_weights.insert(genre.to_string(), weight);
        profile
    }

    #[test]
    fn private_groups_are_excluded_unless_eligible() {
        let profile = profile_with_genre("drama", 1.0);
        let private_group = Group {
            id: Uuid::new_v4(),
            visibility: GroupVisibility::Private,
            member_count: 5,
            activity_level: 0.5,
        };
        let candidates = vec![(private_group, vec![profile_with_genre("drama", 1.0)])];
        let result = suggest_groups(&profile, &candidates, &HashSet::new());
        assert!(result.is_empty());
    }

    #[test]
    fn ideal_size_group_scores_higher_on_size_fit_than_oversized() {
        let profile = profile_with_genre("drama", 1.0);
        let small = Group {
            id: Uuid::new_v4(),
            visibility: GroupVisibility::Public,
            member_count: IDEAL_GROUP_SIZE as u32,
            activity_level: 0.5,
        };
        let huge = Group {
            id: Uuid::new_v4(),
            visibility: GroupVisibility::Public,
            member_count: 500,
            activity_level: 0.5,
        };
        let members = vec![profile_with_genre("drama", 1.0)];
        let candidates = vec![(small.clone(), members.clone()), (huge.clone(), members)];
        let result = suggest_groups(&profile, &candidates, &HashSet::new());
        let score_small = result.iter().find(|(id, _)| *id == small.id).unwrap().1;
        let score_huge = result.iter().find(|(id, _)| *id == huge.id).unwrap().1;
        assert!(score_small > score_huge);
    }
}
