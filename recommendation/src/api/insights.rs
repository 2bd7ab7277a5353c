use super::{AdminUser, ApiError, AuthenticatedUser};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use showsync_core::error::RecommendationError;

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    #[serde(default)]
    pub days: Option<i64>,
}

/// System-level counters: active recommendations, feedback volume, and
/// how many profiles carry enough signal to personalize.
pub async fn analytics(
    _admin: AdminUser,
    query: web::Query<DaysQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let days = query.days.unwrap_or(7);

    let active_content: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM content_recommendations WHERE dismissed_at IS NULL AND expires_at > now()",
    )
    .fetch_one(&state.pool)
    .await
    .map_err(anyhow::Error::from)?;

    let feedback_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM recommendation_feedback WHERE created_at >= now() - ($1 || ' days')::interval",
    )
    .bind(days.to_string())
    .fetch_one(&state.pool)
    .await
    .map_err(anyhow::Error::from)?;

    let confident_profiles: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM preference_profiles WHERE confidence >= 0.3")
            .fetch_one(&state.pool)
            .await
            .map_err(anyhow::Error::from)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "activeContentRecommendations": active_content,
        "feedbackCount": feedback_count,
        "windowDays": days,
        "confidentProfiles": confident_profiles,
    })))
}

/// Profile insights for the caller: confidence, personality, and top
/// weighted genres.
pub async fn insights_me(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let profile = crate::profile_repo::load(&state.pool, user.0)
        .await?
        .ok_or_else(|| RecommendationError::not_found("preference profile"))?;

    let mut top_genres: Vec<(&String, &f64)> = profile.genre_weights.iter().collect();
    top_genres.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "confidence": profile.confidence,
        "personality": profile.personality,
        "topGenres": top_genres.into_iter().take(5).map(|(g, w)| serde_json::json!({"genre": g, "weight": w})).collect::<Vec<_>>(),
        "totalInteractions": profile.total_interactions,
        "completionRate": profile.completion_rate(),
    })))
}

/// Dashboard summary for the caller: active recommendation count plus the
/// insights payload, in one round trip.
pub async fn summary_me(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let page = state.store.active_for_user(user.0, 0, 1).await?;
    let profile = crate::profile_repo::load(&state.pool, user.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "activeRecommendations": page.total_elements,
        "hasProfile": profile.is_some(),
        "confidence": profile.map(|p| p.confidence).unwrap_or(0.0),
    })))
}
