//! ShowSync AI Recommendation Core
//!
//! Port: 8082
//! Latency target: <200ms for personal/trending/realtime recommendations

use actix_web::{web, App, HttpResponse, HttpServer};
use recommendation::{
    CollaborativeEngine, FeedbackService, PreferenceProfileBuilder, RecommendationCache,
    RecommendationStore, TrendingSnapshotBuilder,
};
use recommendation::single_flight::SingleFlight;
use recommendation::AppState;
use showsync_core::config::{ConfigLoader, RecommendationConfig, ServiceConfig};
use showsync_core::database::DatabasePool;
use showsync_core::health::HealthChecker;
use showsync_core::shutdown::ShutdownCoordinator;
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    showsync_core::config::load_dotenv();

    let mut service_config = ServiceConfig::from_env().expect("invalid service configuration");
    if std::env::var("SHOWSYNC_SERVICE_PORT").is_err() && std::env::var("PORT").is_err() {
        service_config.port = 8082;
    }
    service_config.validate().expect("invalid service configuration");

    let rec_config = Arc::new(RecommendationConfig::from_env().expect("invalid recommendation configuration"));
    rec_config.validate().expect("invalid recommendation configuration");

    let db_pool = DatabasePool::from_env()
        .await
        .expect("failed to connect to database");
    let pool = db_pool.pool().clone();

    let redis_url = std::env::var("SHOWSYNC_REDIS_URL")
        .or_else(|_| std::env::var("REDIS_URL"))
        .unwrap_or_else(|_| "redis://localhost:6379/0".to_string());
    let redis_client = redis::Client::open(redis_url.clone()).expect("invalid REDIS_URL");
    let redis_conn = redis::aio::ConnectionManager::new(redis_client.clone())
        .await
        .expect("failed to connect to redis");

    let cache = RecommendationCache::new(redis_conn);
    let store = Arc::new(RecommendationStore::new(pool.clone(), cache.clone()));
    let collaborative = Arc::new(CollaborativeEngine::new(pool.clone()));
    let trending = Arc::new(TrendingSnapshotBuilder::new(pool.clone()));
    let profile_builder = Arc::new(PreferenceProfileBuilder::new(0.995, rec_config.personality.clone()));
    let feedback = Arc::new(FeedbackService::new(pool.clone(), RecommendationStore::new(pool.clone(), cache.clone())));

    let state = AppState {
        config: rec_config.clone(),
        pool: pool.clone(),
        cache,
        store,
        feedback,
        collaborative,
        trending,
        profile_builder,
        single_flight: Arc::new(SingleFlight::new()),
    };

    let health_checker = Arc::new(
        HealthChecker::new()
            .with_postgres(pool.clone())
            .with_redis(redis_client),
    );

    let shutdown = ShutdownCoordinator::default();
    let shutdown_signal = shutdown.create_shutdown_signal();
    tokio::spawn(shutdown.wait_for_signal());

    let scheduler_state = state.clone();
    let scheduler = recommendation::scheduler::start(
        rec_config.clone(),
        pool.clone(),
        Arc::new(move |user_id| {
            let state = scheduler_state.clone();
            Box::pin(async move { recommendation::regenerate_personal(&state, user_id).await.map(|_| ()) })
        }),
    )
    .await
    .expect("failed to start scheduler");

    info!(host = %service_config.host, port = service_config.port, "starting recommendation core");

    let server_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(server_state.clone()))
            .app_data(web::Data::new(health_checker.clone()))
            .route("/health", web::get().to(health_check))
            .configure(recommendation::api::configure)
    })
    .bind((service_config.host.as_str(), service_config.port))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal.await;
    info!("shutdown signal received, stopping server gracefully");
    server_handle.stop(true).await;

    if let Some(scheduler) = scheduler {
        let _ = scheduler.shutdown().await;
    }

    match server_task.await {
        Ok(result) => result,
        Err(join_err) => Err(std::io::Error::new(std::io::ErrorKind::Other, join_err)),
    }
}

async fn health_check(checker: web::Data<Arc<HealthChecker>>) -> HttpResponse {
    let health = checker.check_all().await;
    HttpResponse::build(
        actix_web::http::StatusCode::from_u16(health.http_status_code()).unwrap(),
    )
    .json(health)
}
