//! Coverage for the extractors and error mapping every recommendation
//! route depends on, independent of a live Postgres/Redis backend.

use actix_web::{test, web, App, HttpResponse};
use recommendation::api::{ApiError, AuthenticatedUser, AdminUser, ADMIN_HEADER, USER_HEADER};
use showsync_core::error::RecommendationError;
use uuid::Uuid;

async fn echo_user(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(user.0)
}

async fn echo_admin(_admin: AdminUser) -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn fails_with(kind: &str) -> Result<HttpResponse, ApiError> {
    let err = match kind {
        "validation" => RecommendationError::validation_field("bad field", "field"),
        "not_found" => RecommendationError::not_found("thing"),
        "auth" => RecommendationError::Authorization,
        _ => unreachable!(),
    };
    Err(ApiError(err))
}

#[actix_web::test]
async fn authenticated_user_extracts_header_uuid() {
    let app = test::init_service(
        App::new().route("/echo", web::get().to(echo_user)),
    )
    .await;

    let user_id = Uuid::new_v4();
    let req = test::TestRequest::get()
        .uri("/echo")
        .insert_header((USER_HEADER, user_id.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Uuid = test::read_body_json(resp).await;
    assert_eq!(body, user_id);
}

#[actix_web::test]
async fn authenticated_user_rejects_missing_header() {
    let app = test::init_service(
        App::new().route("/echo", web::get().to(echo_user)),
    )
    .await;

    let req = test::TestRequest::get().uri("/echo").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn authenticated_user_rejects_malformed_uuid() {
    let app = test::init_service(
        App::new().route("/echo", web::get().to(echo_user)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/echo")
        .insert_header((USER_HEADER, "not-a-uuid"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn admin_user_requires_true_header() {
    let app = test::init_service(
        App::new().route("/admin-only", web::get().to(echo_admin)),
    )
    .await;

    let denied = test::TestRequest::get().uri("/admin-only").to_request();
    let resp = test::call_service(&app, denied).await;
    assert_eq!(resp.status(), 401);

    let allowed = test::TestRequest::get()
        .uri("/admin-only")
        .insert_header((ADMIN_HEADER, "true"))
        .to_request();
    let resp = test::call_service(&app, allowed).await;
    assert!(resp.status().is_success());

    let wrong_value = test::TestRequest::get()
        .uri("/admin-only")
        .insert_header((ADMIN_HEADER, "yes"))
        .to_request();
    let resp = test::call_service(&app, wrong_value).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn api_error_maps_to_expected_status_codes() {
    async fn handler(path: web::Path<String>) -> Result<HttpResponse, ApiError> {
        fails_with(&path.into_inner()).await
    }

    let app = test::init_service(
        App::new().route("/fail/{kind}", web::get().to(handler)),
    )
    .await;

    for (kind, expected) in [("validation", 400u16), ("not_found", 404), ("auth", 401)] {
        let req = test::TestRequest::get().uri(&format!("/fail/{kind}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "kind={kind}");
    }
}
