use super::recommendations::parse_kind;
use super::{ApiError, AuthenticatedUser};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use showsync_core::error::RecommendationError;
use uuid::Uuid;

pub async fn view(
    _user: AuthenticatedUser,
    path: web::Path<(String, Uuid)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    state.feedback.view(parse_kind(&kind)?, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct DismissQuery {
    pub reason: Option<String>,
}

pub async fn dismiss(
    _user: AuthenticatedUser,
    path: web::Path<(String, Uuid)>,
    query: web::Query<DismissQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    state
        .feedback
        .dismiss(parse_kind(&kind)?, id, query.into_inner().reason)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

pub async fn submit(
    user: AuthenticatedUser,
    path: web::Path<(String, Uuid)>,
    query: web::Query<FeedbackQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let query = query.into_inner();

    if let Some(rating) = query.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError(RecommendationError::validation_field(
                "rating must be between 1 and 5",
                "rating",
            )));
        }
    }

    state
        .feedback
        .submit(user.0, parse_kind(&kind)?, id, query.rating, query.comment, None)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
