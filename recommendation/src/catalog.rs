//! Read-only access to the interaction/media/group views this crate
//! consumes but does not own. Centralizes the SQL so the generator and
//! profile-builder stay pure with respect to I/O.

use crate::types::{
    Group, GroupMembership, GroupVisibility, Interaction, InteractionStatus, Media,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// How many catalog items to pull as the scoring candidate pool per
/// generation run.
pub const CANDIDATE_POOL_LIMIT: i64 = 500;

pub async fn fetch_interactions_with_media(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<(Interaction, Media)>> {
    let rows = sqlx::query_as::<_, InteractionMediaRow>(
        r#"
        SELECT
            i.user_id, i.media_id, i.rating, i.status, i.progress, i.favorite, i.updated_at,
            m.title, m.media_type, m.genres, m.release_date, m.runtime_minutes,
            m.average_rating, m.rating_count
        FROM interactions i
        JOIN media m ON m.id = i.media_id
        WHERE i.user_id = $1
        ORDER BY i.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(InteractionMediaRow::into_domain).collect())
}

pub async fn fetch_library_media_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar("SELECT media_id FROM interactions WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

pub async fn fetch_candidate_pool(pool: &PgPool) -> Result<Vec<Media>> {
    let rows = sqlx::query_as::<_, MediaRow>(
        r#"
        SELECT id, title, media_type, genres, release_date, runtime_minutes,
               average_rating, rating_count
        FROM media
        ORDER BY rating_count DESC NULLS LAST
        LIMIT $1
        "#,
    )
    .bind(CANDIDATE_POOL_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(MediaRow::into_domain).collect())
}

pub async fn fetch_media(pool: &PgPool, media_id: Uuid) -> Result<Option<Media>> {
    let row = sqlx::query_as::<_, MediaRow>(
        r#"
        SELECT id, title, media_type, genres, release_date, runtime_minutes,
               average_rating, rating_count
        FROM media WHERE id = $1
        "#,
    )
    .bind(media_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(MediaRow::into_domain))
}

pub async fn fetch_group_with_members(
    pool: &PgPool,
    group_id: Uuid,
) -> Result<Option<(Group, Vec<GroupMembership>)>> {
    let group_row = sqlx::query_as::<_, GroupRow>(
        "SELECT id, visibility, member_count, activity_level FROM groups WHERE id = $1",
    )
    .bind(group_id)
    .fetch_optional(pool)
    .await?;

    let Some(group_row) = group_row else {
        return Ok(None);
    };

    let memberships = sqlx::query_as::<_, GroupMembershipRow>(
        "SELECT user_id, group_id FROM group_memberships WHERE group_id = $1",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(Some((
        group_row.into_domain(),
        memberships.into_iter().map(GroupMembershipRow::into_domain).collect(),
    )))
}

pub async fn is_member_eligible_for_private_group(
    pool: &PgPool,
    user_id: Uuid,
    group_id: Uuid,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM group_memberships WHERE user_id = $1 AND group_id = $2)",
    )
    .bind(user_id)
    .bind(group_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

#[derive(sqlx::FromRow)]
struct InteractionMediaRow {
    user_id: Uuid,
    media_id: Uuid,
    rating: Option<f64>,
    status: String,
    progress: Option<f64>,
    favorite: bool,
    updated_at: DateTime<Utc>,
    title: String,
    media_type: String,
    genres: Vec<String>,
    release_date: DateTime<Utc>,
    runtime_minutes: Option<i32>,
    average_rating: Option<f64>,
    rating_count: Option<i32>,
}

impl InteractionMediaRow {
    fn into_domain(self) -> (Interaction, Media) {
        let status = match self.status.as_str() {
            "COMPLETED" => InteractionStatus::Completed,
            "PLAN_TO_WATCH" => InteractionStatus::PlanToWatch,
            "DROPPED" => InteractionStatus::Dropped,
            _ => InteractionStatus::Watching,
        };

        (
            Interaction {
                user_id: self.user_id,
                media_id: self.media_id,
                rating: self.rating,
                status,
                progress: self.progress,
                favorite: self.favorite,
                updated_at: self.updated_at,
            },
            Media {
                id: self.media_id,
                title: self.title,
                media_type: self.media_type,
                genres: self.genres,
                release_date: self.release_date,
                runtime_minutes: self.runtime_minutes,
                average_rating: self.average_rating,
                rating_count: self.rating_count.map(|c| c as u32),
            },
        )
    }
}

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: Uuid,
    title: String,
    media_type: String,
    genres: Vec<String>,
    release_date: DateTime<Utc>,
    runtime_minutes: Option<i32>,
    average_rating: Option<f64>,
    rating_count: Option<i32>,
}

impl MediaRow {
    fn into_domain(self) -> Media {
        Media {
            id: self.id,
            title: self.title,
            media_type: self.media_type,
            genres: self.genres,
            release_date: self.release_date,
            runtime_minutes: self.runtime_minutes,
            average_rating: self.average_rating,
            rating_count: self.rating_count.map(|c| c as u32),
        }
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    visibility: String,
    member_count: i32,
    activity_level: f64,
}

impl GroupRow {
    fn into_domain(self) -> Group {
        Group {
            id: self.id,
            visibility: if self.visibility == "public" {
                GroupVisibility::Public
            } else {
                GroupVisibility::Private
            },
            member_count: self.member_count.max(0) as u32,
            activity_level: self.activity_level,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GroupMembershipRow {
    user_id: Uuid,
    group_id: Uuid,
}

impl GroupMembershipRow {
    fn into_domain(self) -> GroupMembership {
        GroupMembership {
            user_id: self.user_id,
            group_id: self.group_id,
        }
    }
}
