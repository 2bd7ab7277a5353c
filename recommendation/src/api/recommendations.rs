use super::{ApiError, AuthenticatedUser, PagedResponse};
use crate::catalog;
use crate::content_based::score_against_anchor;
use crate::groups::{build_group_recommendation, suggest_groups, GroupMode};
use crate::recommendation::{GenerationContext, GeneratorMode};
use crate::types::{ContentRecommendation, RecommendationKind, ScoredCandidate};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use showsync_core::error::RecommendationError;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(0)
    }

    fn size(&self) -> u32 {
        self.size.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Deserialize)]
pub struct RealtimeQuery {
    pub media_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ByTypeQuery {
    #[serde(rename = "type")]
    pub reason: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn personal(
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let page = state
        .store
        .active_for_user(user.0, query.page(), query.size())
        .await?;
    Ok(HttpResponse::Ok().json(PagedResponse::from(page)))
}

pub async fn realtime(
    user: AuthenticatedUser,
    query: web::Query<RealtimeQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(20);

    let candidates: Vec<ScoredCandidate> = if let Some(media_id) = query.media_id {
        let anchor = catalog::fetch_media(&state.pool, media_id)
            .await?
            .ok_or_else(|| RecommendationError::not_found(format!("media {}", media_id)))?;
        let catalog_pool = catalog::fetch_candidate_pool(&state.pool).await?;

        let mut scored: Vec<ScoredCandidate> = catalog_pool
            .iter()
            .filter(|m| m.id != anchor.id)
            .map(|m| score_against_anchor(m, &anchor))
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    } else {
        let trending = state.trending.build(limit).await?;
        let library_ids = catalog::fetch_library_media_ids(&state.pool, user.0).await?;
        let interactions = catalog::fetch_interactions_with_media(&state.pool, user.0).await?;
        let profile = state.profile_builder.build(user.0, &interactions)?;
        let all_profiles = crate::profile_repo::load_all_confident(&state.pool).await?;
        let similar_users = state.collaborative.similar_users(&profile, &all_profiles).await?;
        let catalog_pool = catalog::fetch_candidate_pool(&state.pool).await?;

        let collaborative_candidates = state
            .collaborative
            .candidates(&similar_users, &library_ids, &catalog_pool)
            .await?;

        let blend = state.config.realtime_collaborative_weight;
        let mut by_media: std::collections::HashMap<Uuid, ScoredCandidate> =
            std::collections::HashMap::new();

        for mut candidate in collaborative_candidates {
            candidate.score *= blend;
            by_media.insert(candidate.media_id, candidate);
        }
        for mut candidate in crate::cold_start::cold_start_candidates(&trending, limit) {
            candidate.score *= 1.0 - blend;
            by_media
                .entry(candidate.media_id)
                .and_modify(|existing| existing.score += candidate.score)
                .or_insert(candidate);
        }

        let mut merged: Vec<ScoredCandidate> = by_media.into_values().collect();
        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        merged.truncate(limit);
        merged
    };

    Ok(HttpResponse::Ok().json(candidates_to_json(&candidates)))
}

pub async fn trending(
    _user: AuthenticatedUser,
    query: web::Query<LimitQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(20);
    let snapshot = state.trending.build(limit).await?;
    Ok(HttpResponse::Ok().json(snapshot.items.iter().map(|i| serde_json::json!({
        "mediaId": i.media_id,
        "score": i.score,
        "genres": i.genres,
    })).collect::<Vec<_>>()))
}

pub async fn groups(
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let interactions = catalog::fetch_interactions_with_media(&state.pool, user.0).await?;
    let profile = state.profile_builder.build(user.0, &interactions)?;

    let candidate_rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM groups LIMIT 200")
        .fetch_all(&state.pool)
        .await
        .map_err(anyhow::Error::from)?;

    let mut groups_with_members = Vec::with_capacity(candidate_rows.len());
    for (group_id,) in candidate_rows {
        if let Some((group, memberships)) =
            catalog::fetch_group_with_members(&state.pool, group_id).await?
        {
            let mut member_profiles = Vec::with_capacity(memberships.len());
            for membership in &memberships {
                if let Some(member_profile) =
                    crate::profile_repo::load(&state.pool, membership.user_id).await?
                {
                    member_profiles.push(member_profile);
                }
            }
            groups_with_members.push((group, member_profiles));
        }
    }

    let eligible_private: HashSet<Uuid> = groups_with_members
        .iter()
        .filter(|(g, _)| g.visibility == crate::types::GroupVisibility::Private)
        .map(|(g, _)| g.id)
        .collect();

    let mut scored = suggest_groups(&profile, &groups_with_members, &eligible_private);
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let page = query.page() as usize;
    let size = query.size() as usize;
    let total_elements = scored.len() as u64;
    let content: Vec<_> = scored
        .into_iter()
        .skip(page * size)
        .take(size)
        .map(|(group_id, score)| {
            build_group_recommendation(user.0, group_id, score, state.config.group_rec_expiry_days)
        })
        .collect();

    Ok(HttpResponse::Ok().json(PagedResponse {
        content,
        page: page as u32,
        size: size as u32,
        total_elements,
    }))
}

pub async fn group_content(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let group_id = path.into_inner();
    let (group, memberships) = catalog::fetch_group_with_members(&state.pool, group_id)
        .await?
        .ok_or_else(|| RecommendationError::not_found(format!("group {}", group_id)))?;

    let is_member = memberships.iter().any(|m| m.user_id == user.0);
    if group.visibility == crate::types::GroupVisibility::Private && !is_member {
        return Err(ApiError(RecommendationError::Authorization));
    }

    let mut member_profiles = Vec::with_capacity(memberships.len());
    for membership in &memberships {
        if let Some(profile) = crate::profile_repo::load(&state.pool, membership.user_id).await? {
            member_profiles.push(profile);
        }
    }

    let low_rated: HashSet<Uuid> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT media_id FROM interactions
        WHERE user_id = ANY($1) AND rating IS NOT NULL AND rating < 4
        "#,
    )
    .bind(memberships.iter().map(|m| m.user_id).collect::<Vec<_>>())
    .fetch_all(&state.pool)
    .await
    .map(|ids: Vec<Uuid>| ids.into_iter().collect())
    .map_err(anyhow::Error::from)?;

    let catalog_pool = catalog::fetch_candidate_pool(&state.pool).await?;
    let mode = GroupMode {
        member_profiles: &member_profiles,
        low_rated_media_ids: &low_rated,
    };

    let placeholder_profile = crate::types::PreferenceProfile::empty(user.0);
    let ctx = GenerationContext {
        profile: &placeholder_profile,
        config: &state.config,
        catalog: &catalog_pool,
        library_media_ids: &[],
    };
    let candidates = mode.generate(&ctx);
    let diversified = crate::diversity::diversify(
        candidates,
        state.config.diversity_factor,
        query.size() as usize,
    );

    let total_elements = diversified.len() as u64;
    Ok(HttpResponse::Ok().json(PagedResponse {
        content: candidates_to_json(&diversified),
        page: query.page(),
        size: query.size(),
        total_elements,
    }))
}

pub async fn similar(
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
    query: web::Query<LimitQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let media_id = path.into_inner();
    let anchor = catalog::fetch_media(&state.pool, media_id)
        .await?
        .ok_or_else(|| RecommendationError::not_found(format!("media {}", media_id)))?;

    let catalog_pool = catalog::fetch_candidate_pool(&state.pool).await?;
    let limit = query.limit.unwrap_or(20);
    let mut scored: Vec<ScoredCandidate> = catalog_pool
        .iter()
        .filter(|m| m.id != anchor.id)
        .map(|m| score_against_anchor(m, &anchor))
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    Ok(HttpResponse::Ok().json(candidates_to_json(&scored)))
}

pub async fn by_type(
    user: AuthenticatedUser,
    query: web::Query<ByTypeQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let reason_key = format!("\"{}\"", query.reason.to_uppercase());
    let reason: crate::types::RecommendationReason = serde_json::from_str(&reason_key)
        .map_err(|_| RecommendationError::validation_field("unknown recommendation reason", "type"))?;

    let limit = query.limit.unwrap_or(20) as i64;
    let page = state.store.active_for_user(user.0, 0, limit.max(1) as u32).await?;
    let filtered: Vec<ContentRecommendation> = page
        .content
        .into_iter()
        .filter(|rec| rec.reason == reason)
        .collect();

    Ok(HttpResponse::Ok().json(filtered))
}

fn candidates_to_json(candidates: &[ScoredCandidate]) -> Vec<serde_json::Value> {
    candidates
        .iter()
        .map(|c| {
            serde_json::json!({
                "mediaId": c.media_id,
                "score": c.score,
                "reason": c.reason,
                "type": c.rec_type,
                "explanation": crate::recommendation::explain(c),
            })
        })
        .collect()
}

pub(super) fn parse_kind(raw: &str) -> Result<RecommendationKind, ApiError> {
    match raw.to_uppercase().as_str() {
        "CONTENT" => Ok(RecommendationKind::Content),
        "GROUP" => Ok(RecommendationKind::Group),
        _ => Err(ApiError(RecommendationError::validation_field(
            "kind must be CONTENT or GROUP",
            "kind",
        ))),
    }
}
