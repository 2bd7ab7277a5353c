//! Scheduled jobs: daily full regeneration, hourly active-user refresh, and
//! an eviction sweep for expired recommendations. Disabled entirely when
//! `enableSchedulers` is false.

use anyhow::Result;
use chrono::Utc;
use showsync_core::config::RecommendationConfig;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

/// Starts the cron job set. Returns the running [`JobScheduler`] so the
/// caller can shut it down alongside the rest of the service.
pub async fn start(
    config: Arc<RecommendationConfig>,
    pool: PgPool,
    regenerate_one: Arc<dyn Fn(Uuid) -> futures::future::BoxFuture<'static, Result<()>> + Send + Sync>,
) -> Result<Option<JobScheduler>> {
    if !config.enable_schedulers {
        info!("schedulers disabled, skipping job registration");
        return Ok(None);
    }

    let scheduler = JobScheduler::new().await?;
    let worker_permits = Arc::new(Semaphore::new(config.generation_thread_pool_size));

    let daily_pool = pool.clone();
    let daily_permits = worker_permits.clone();
    let daily_regenerate = regenerate_one.clone();
    let daily_job = Job::new_async(config.daily_generation_cron.as_str(), move |_uuid, _lock| {
        let pool = daily_pool.clone();
        let permits = daily_permits.clone();
        let regenerate = daily_regenerate.clone();
        Box::pin(async move {
            if let Err(err) = run_daily_generation(pool, permits, regenerate).await {
                error!(error = %err, "daily generation job failed");
            }
        })
    })?;
    scheduler.add(daily_job).await?;

    let active_users_pool = pool.clone();
    let active_users_permits = worker_permits.clone();
    let active_users_regenerate = regenerate_one.clone();
    let active_hours_back = config.active_users_hours_back;
    let active_users_job = Job::new_async(
        config.active_users_refresh_cron.as_str(),
        move |_uuid, _lock| {
            let pool = active_users_pool.clone();
            let permits = active_users_permits.clone();
            let regenerate = active_users_regenerate.clone();
            Box::pin(async move {
                if let Err(err) =
                    run_active_users_refresh(pool, permits, regenerate, active_hours_back).await
                {
                    error!(error = %err, "active-user refresh job failed");
                }
            })
        },
    )?;
    scheduler.add(active_users_job).await?;

    let eviction_pool = pool.clone();
    let eviction_job = Job::new_async("0 0 */6 * * *", move |_uuid, _lock| {
        let pool = eviction_pool.clone();
        Box::pin(async move {
            if let Err(err) = run_eviction_sweep(pool).await {
                error!(error = %err, "eviction sweep job failed");
            }
        })
    })?;
    scheduler.add(eviction_job).await?;

    scheduler.start().await?;
    Ok(Some(scheduler))
}

async fn run_daily_generation(
    pool: PgPool,
    permits: Arc<Semaphore>,
    regenerate_one: Arc<dyn Fn(Uuid) -> futures::future::BoxFuture<'static, Result<()>> + Send + Sync>,
) -> Result<()> {
    let user_ids: Vec<Uuid> = sqlx::query_scalar("SELECT DISTINCT user_id FROM interactions")
        .fetch_all(&pool)
        .await?;

    info!(count = user_ids.len(), "starting daily full regeneration");
    regenerate_many(user_ids, permits, regenerate_one).await;
    Ok(())
}

async fn run_active_users_refresh(
    pool: PgPool,
    permits: Arc<Semaphore>,
    regenerate_one: Arc<dyn Fn(Uuid) -> futures::future::BoxFuture<'static, Result<()>> + Send + Sync>,
    hours_back: i64,
) -> Result<()> {
    let user_ids: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT user_id FROM interactions
        WHERE updated_at >= now() - ($1 || ' hours')::interval
        "#,
    )
    .bind(hours_back.to_string())
    .fetch_all(&pool)
    .await?;

    info!(count = user_ids.len(), hours_back, "refreshing active users");
    regenerate_many(user_ids, permits, regenerate_one).await;
    Ok(())
}

async fn regenerate_many(
    user_ids: Vec<Uuid>,
    permits: Arc<Semaphore>,
    regenerate_one: Arc<dyn Fn(Uuid) -> futures::future::BoxFuture<'static, Result<()>> + Send + Sync>,
) {
    let mut handles = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        let permits = permits.clone();
        let regenerate = regenerate_one.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            if let Err(err) = regenerate(user_id).await {
                error!(%user_id, error = %err, "regeneration failed");
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }
}

async fn run_eviction_sweep(pool: PgPool) -> Result<()> {
    let now = Utc::now();
    let content_deleted = sqlx::query(
        "DELETE FROM content_recommendations WHERE expires_at <= $1 AND dismissed_at IS NULL",
    )
    .bind(now)
    .execute(&pool)
    .await?
    .rows_affected();

    let group_deleted = sqlx::query(
        "DELETE FROM group_recommendations WHERE expires_at <= $1 AND dismissed_at IS NULL",
    )
    .bind(now)
    .execute(&pool)
    .await?
    .rows_affected();

    info!(content_deleted, group_deleted, "eviction sweep complete");
    Ok(())
}
