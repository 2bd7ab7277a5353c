//! Explanation templates for [`crate::types::RecommendationReason`].

use crate::types::{Media, RecommendationReason};

/// Picks the dominant weighted scoring term as the reason, and renders its
/// explanation template. Returns the reason and, when relevant, the genre
/// that drove it.
pub fn reason_for_scores(
    terms: &[(f64, &str)],
    media: &Media,
) -> (RecommendationReason, Option<String>) {
    let dominant = terms
        .iter()
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, name)| *name)
        .unwrap_or("general");

    match dominant {
        "genre" => (
            RecommendationReason::GenreMatch,
            media.genres.first().cloned(),
        ),
        "rating" => (RecommendationReason::HighlyRated, None),
        "platform" | "era" => (RecommendationReason::General, None),
        _ => (RecommendationReason::General, None),
    }
}

/// Renders the explanation string for a reason, filling in the template
/// with whatever context is available (top genre, anchor title).
pub fn explanation_for(
    reason: RecommendationReason,
    top_genre: Option<&str>,
    anchor_title: Option<&str>,
) -> String {
    match reason {
        RecommendationReason::GenreMatch => match top_genre {
            Some(genre) => format!("Based on your love for {}", genre),
            None => "Matches your genre preferences".to_string(),
        },
        RecommendationReason::SimilarContent => match anchor_title {
            Some(title) => format!("Because you watched {}", title),
            None => "Similar to content you've enjoyed".to_string(),
        },
        RecommendationReason::GroupActivity => "Popular with your group".to_string(),
        RecommendationReason::SimilarUsers => match anchor_title {
            Some(title) => format!("Users who liked {} also enjoyed this", title),
            None => "Liked by users with similar taste".to_string(),
        },
        RecommendationReason::TrendingGlobal => cold_start_explanation(),
        RecommendationReason::TrendingGenre => match top_genre {
            Some(genre) => format!("Trending in {}", genre),
            None => "Trending now".to_string(),
        },
        RecommendationReason::HighlyRated => "Highly rated by other viewers".to_string(),
        RecommendationReason::NewRelease => "A new release you might like".to_string(),
        RecommendationReason::AwardWinner => "An award-winning title".to_string(),
        RecommendationReason::CompletionPattern => {
            "Matches shows you tend to finish".to_string()
        }
        RecommendationReason::BingeWorthy => "Binge-worthy pick for you".to_string(),
        RecommendationReason::General => "Recommended for you".to_string(),
    }
}

/// Explanation used for cold-start trending fallbacks; always calls out
/// that the profile doesn't yet carry enough signal to personalize.
pub fn cold_start_explanation() -> String {
    "Trending now — personalize this by rating a few titles".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_match_explanation_includes_genre_name() {
        let text = explanation_for(RecommendationReason::GenreMatch, Some("sci-fi"), None);
        assert!(text.contains("sci-fi"));
    }

    #[test]
    fn cold_start_explanation_mentions_trending() {
        assert!(cold_start_explanation().to_lowercase().contains("trending"));
    }
}
