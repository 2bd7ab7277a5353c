//! ShowSync AI Recommendation Core.
//!
//! Builds and maintains per-user preference profiles, generates personal,
//! group, trending, and collaborative recommendations, serves them with
//! caching and at-most-one-in-flight guarantees, and absorbs feedback to
//! improve future suggestions.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod cold_start;
pub mod collaborative;
pub mod content_based;
pub mod diversity;
pub mod explain;
pub mod feedback;
pub mod groups;
pub mod profile;
pub mod profile_repo;
pub mod recommendation;
pub mod scheduler;
pub mod single_flight;
pub mod store;
pub mod trending;
pub mod types;

pub use cache::RecommendationCache;
pub use collaborative::CollaborativeEngine;
pub use feedback::FeedbackService;
pub use profile::PreferenceProfileBuilder;
pub use store::RecommendationStore;
pub use trending::TrendingSnapshotBuilder;

use showsync_core::config::RecommendationConfig;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared handles every request handler needs: the config, the store, the
/// caches, and the engines that turn profiles into scored candidates.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RecommendationConfig>,
    pub pool: PgPool,
    pub cache: RecommendationCache,
    pub store: Arc<RecommendationStore>,
    pub feedback: Arc<FeedbackService>,
    pub collaborative: Arc<CollaborativeEngine>,
    pub trending: Arc<TrendingSnapshotBuilder>,
    pub profile_builder: Arc<PreferenceProfileBuilder>,
    pub single_flight: Arc<single_flight::SingleFlight<Result<Vec<types::ContentRecommendation>, String>>>,
}

/// Rebuilds a user's profile from current interactions, persists it, and
/// generates and stores a fresh personal recommendation set. Collapsed
/// through a per-user [`single_flight::SingleFlight`] so concurrent
/// triggers for the same user share one computation.
pub async fn regenerate_personal(
    state: &AppState,
    user_id: Uuid,
) -> anyhow::Result<Vec<types::ContentRecommendation>> {
    let state = state.clone();
    let result = state
        .single_flight
        .run(user_id, async move {
            regenerate_personal_inner(&state, user_id)
                .await
                .map_err(|err| err.to_string())
        })
        .await;

    match &*result {
        Ok(rows) => Ok(rows.clone()),
        Err(message) => Err(anyhow::anyhow!("{}", message)),
    }
}

async fn regenerate_personal_inner(
    state: &AppState,
    user_id: Uuid,
) -> anyhow::Result<Vec<types::ContentRecommendation>> {
    let interactions = catalog::fetch_interactions_with_media(&state.pool, user_id).await?;
    let profile = state.profile_builder.build(user_id, &interactions)?;
    profile_repo::save(&state.pool, &profile).await?;

    let library_ids = catalog::fetch_library_media_ids(&state.pool, user_id).await?;
    let catalog_pool = catalog::fetch_candidate_pool(&state.pool).await?;
    let trending = state.trending.build(50).await?;

    let similar_users = if state.config.enable_collaborative {
        let all_profiles = profile_repo::load_all_confident(&state.pool).await?;
        state.collaborative.similar_users(&profile, &all_profiles).await?
    } else {
        Vec::new()
    };

    let ctx = recommendation::GenerationContext {
        profile: &profile,
        config: &state.config,
        catalog: &catalog_pool,
        library_media_ids: &library_ids,
    };

    let candidates = recommendation::generate_personal(
        &ctx,
        &trending,
        Some(&state.collaborative),
        &similar_users,
        state.config.max_active_per_user as usize,
    )
    .await?;

    state.store.replace_active(user_id, candidates, &state.config).await
}
