//! Feedback ingestion: view/dismiss transitions and explicit feedback
//! submission, the signal that drives profile recalculation.

use crate::store::RecommendationStore;
use crate::types::{ActionTaken, FeedbackType, RecommendationFeedback, RecommendationKind};
use anyhow::Result;
use chrono::Utc;
use showsync_core::error::RecommendationError;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

pub struct FeedbackService {
    pool: PgPool,
    store: RecommendationStore,
}

impl FeedbackService {
    pub fn new(pool: PgPool, store: RecommendationStore) -> Self {
        Self { pool, store }
    }

    pub async fn view(&self, kind: RecommendationKind, id: Uuid) -> Result<()> {
        self.store.mark_viewed(kind, id).await
    }

    pub async fn dismiss(
        &self,
        kind: RecommendationKind,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<()> {
        self.store.dismiss(kind, id, reason).await
    }

    /// Records explicit feedback, infers the coarse [`FeedbackType`] from
    /// the score when present, clips free-text comments to the documented
    /// max, and flags the giver's profile for recalculation on the next
    /// generation pass.
    pub async fn submit(
        &self,
        user_id: Uuid,
        recommendation_kind: RecommendationKind,
        recommendation_id: Uuid,
        score: Option<u8>,
        comment: Option<String>,
        action_taken: Option<ActionTaken>,
    ) -> Result<RecommendationFeedback> {
        if let Some(value) = score {
            if value > 5 {
                return Err(RecommendationError::validation_field(
                    "feedback score must be between 0 and 5",
                    "score",
                )
                .into());
            }
        }

        let feedback_type = score.map(FeedbackType::from_score).unwrap_or(FeedbackType::Neutral);
        let comment = comment.map(|text| RecommendationFeedback::clip_comment(&text));

        let feedback = RecommendationFeedback {
            id: Uuid::new_v4(),
            user_id,
            recommendation_kind,
            recommendation_id,
            feedback_type,
            score,
            comment,
            action_taken,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO recommendation_feedback
                (id, user_id, recommendation_kind, recommendation_id, feedback_type, score, comment, action_taken, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(feedback.id)
        .bind(feedback.user_id)
        .bind(serde_json::to_string(&feedback.recommendation_kind)?)
        .bind(feedback.recommendation_id)
        .bind(serde_json::to_string(&feedback.feedback_type)?)
        .bind(feedback.score.map(|s| s as i16))
        .bind(&feedback.comment)
        .bind(feedback.action_taken.map(|a| serde_json::to_string(&a)).transpose()?)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE preference_profiles SET confidence = 0 WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.store.mark_viewed(recommendation_kind, recommendation_id).await?;
        info!(%user_id, feedback_type = ?feedback.feedback_type, "feedback recorded");
        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_type_is_inferred_from_score_boundaries() {
        assert_eq!(FeedbackType::from_score(5), FeedbackType::Positive);
        assert_eq!(FeedbackType::from_score(4), FeedbackType::Positive);
        assert_eq!(FeedbackType::from_score(3), FeedbackType::Neutral);
        assert_eq!(FeedbackType::from_score(2), FeedbackType::Negative);
        assert_eq!(FeedbackType::from_score(0), FeedbackType::Negative);
    }

    #[test]
    fn long_comments_are_clipped_to_max_chars() {
        let long = "a".repeat(2000);
        let clipped = RecommendationFeedback::clip_comment(&long);
        assert_eq!(clipped.chars().count(), crate::types::FEEDBACK_TEXT_MAX_CHARS);
    }
}
