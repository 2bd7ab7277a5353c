//! Persistence for [`PreferenceProfile`] rows. Unlike `catalog`, this data
//! is owned by this crate.

use crate::types::PreferenceProfile;
use anyhow::Result;
use showsync_core::error::RecommendationError;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn load(pool: &PgPool, user_id: Uuid) -> Result<Option<PreferenceProfile>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT profile FROM preference_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    row.map(|(json,)| {
        serde_json::from_str(&json).map_err(|e| RecommendationError::database(e, "decode profile").into())
    })
    .transpose()
}

pub async fn save(pool: &PgPool, profile: &PreferenceProfile) -> Result<()> {
    let json = serde_json::to_string(profile)?;
    sqlx::query(
        r#"
        INSERT INTO preference_profiles (user_id, profile, confidence, updated_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id) DO UPDATE SET profile = $2, confidence = $3, updated_at = $4
        "#,
    )
    .bind(profile.user_id)
    .bind(json)
    .bind(profile.confidence)
    .bind(profile.last_calculated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// All profiles with enough signal to contribute to collaborative
/// candidate generation for other users.
pub async fn load_all_confident(pool: &PgPool) -> Result<Vec<PreferenceProfile>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT profile FROM preference_profiles WHERE confidence >= 0.3",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(json,)| {
            serde_json::from_str(&json)
                .map_err(|e| RecommendationError::database(e, "decode profile").into())
        })
        .collect()
}
