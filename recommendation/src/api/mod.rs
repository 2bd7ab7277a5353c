//! HTTP surface: one module per endpoint group, wired together by
//! [`configure`]. `userId` always comes from the authenticated principal,
//! never a query parameter, except the admin-only batch trigger.

pub mod admin;
pub mod feedback;
pub mod insights;
pub mod recommendations;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use showsync_core::error::RecommendationError;
use std::future::{ready, Ready};
use uuid::Uuid;

/// Header carrying the caller's identity, set by the upstream auth
/// collaborator before the request reaches this service.
pub const USER_HEADER: &str = "X-ShowSync-User-Id";

/// Header an admin-scoped principal carries; checked only on the batch
/// generation trigger.
pub const ADMIN_HEADER: &str = "X-ShowSync-Admin";

pub struct AuthenticatedUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok());

        ready(match user_id {
            Some(id) => Ok(AuthenticatedUser(id)),
            None => Err(ApiError(RecommendationError::Authorization)),
        })
    }
}

pub struct AdminUser;

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let is_admin = req
            .headers()
            .get(ADMIN_HEADER)
            .and_then(|value| value.to_str().ok())
            == Some("true");

        ready(if is_admin {
            Ok(AdminUser)
        } else {
            Err(ApiError(RecommendationError::Authorization))
        })
    }
}

#[derive(Debug)]
pub struct ApiError(pub RecommendationError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
        }
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        match &self.0 {
            RecommendationError::Validation { .. } => HttpResponse::BadRequest().json(body),
            RecommendationError::NotFound { .. } => HttpResponse::NotFound().json(body),
            RecommendationError::Authorization => HttpResponse::Unauthorized().json(body),
            RecommendationError::Transient { .. } | RecommendationError::Database { .. } => {
                HttpResponse::ServiceUnavailable().json(body)
            }
            RecommendationError::Configuration { .. } | RecommendationError::Invariant { .. } => {
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<RecommendationError>() {
            Ok(known) => ApiError(known),
            Err(other) => ApiError(RecommendationError::database(other, "unclassified")),
        }
    }
}

/// Stable paged envelope used by every paging endpoint.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> From<crate::store::Page<T>> for PagedResponse<T> {
    fn from(page: crate::store::Page<T>) -> Self {
        Self {
            content: page.content,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/recommendations")
            .route("/personal", web::get().to(recommendations::personal))
            .route("/realtime", web::get().to(recommendations::realtime))
            .route("/trending", web::get().to(recommendations::trending))
            .route("/groups", web::get().to(recommendations::groups))
            .route(
                "/groups/{group_id}/content",
                web::get().to(recommendations::group_content),
            )
            .route("/similar/{media_id}", web::get().to(recommendations::similar))
            .route("/by-type", web::get().to(recommendations::by_type))
            .route("/view/{kind}/{id}", web::post().to(feedback::view))
            .route("/dismiss/{kind}/{id}", web::post().to(feedback::dismiss))
            .route("/feedback/{kind}/{id}", web::post().to(feedback::submit))
            .route("/generate", web::post().to(admin::generate_all))
            .route("/generate/me", web::post().to(admin::generate_me))
            .route("/analytics", web::get().to(insights::analytics))
            .route("/insights/me", web::get().to(insights::insights_me))
            .route("/summary/me", web::get().to(insights::summary_me)),
    );
}
