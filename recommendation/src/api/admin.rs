use super::{AdminUser, ApiError, AuthenticatedUser};
use crate::AppState;
use actix_web::{web, HttpResponse};
use tracing::info;

/// Triggers a full batch regeneration for every user with interaction
/// history. Fires the work in the background and returns immediately;
/// callers poll `/recommendations/personal` for fresh results.
pub async fn generate_all(
    _admin: AdminUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let state = state.get_ref().clone();
    tokio::spawn(async move {
        let user_ids: Result<Vec<uuid::Uuid>, _> =
            sqlx::query_scalar("SELECT DISTINCT user_id FROM interactions")
                .fetch_all(&state.pool)
                .await;

        match user_ids {
            Ok(ids) => {
                info!(count = ids.len(), "admin-triggered batch regeneration starting");
                for user_id in ids {
                    if let Err(err) = crate::regenerate_personal(&state, user_id).await {
                        tracing::error!(%user_id, error = %err, "batch regeneration failed for user");
                    }
                }
            }
            Err(err) => tracing::error!(error = %err, "failed to list users for batch regeneration"),
        }
    });

    Ok(HttpResponse::Accepted().finish())
}

pub async fn generate_me(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let state = state.get_ref().clone();
    tokio::spawn(async move {
        if let Err(err) = crate::regenerate_personal(&state, user.0).await {
            tracing::error!(user_id = %user.0, error = %err, "self-triggered regeneration failed");
        }
    });

    Ok(HttpResponse::Accepted().finish())
}
