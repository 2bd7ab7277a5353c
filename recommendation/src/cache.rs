//! Redis-backed caches: the per-user read-through page cache plus the
//! shared snapshot caches (trending, analytics, insights, compatibility,
//! preference maps). Directly modeled on the teacher's Redis cache wrapper
//! — connection pooling, TTL, JSON serialization, and tracing on miss/hit —
//! with SHA256 key hashing dropped since these keys are already structured.

use redis::aio::ConnectionManager;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct RecommendationCache {
    conn: ConnectionManager,
}

impl RecommendationCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, key, "cache read failed");
                None
            });

        raw.and_then(|value| match serde_json::from_str(&value) {
            Ok(parsed) => {
                debug!(key, "cache hit");
                Some(parsed)
            }
            Err(err) => {
                warn!(error = %err, key, "cache value failed to deserialize");
                None
            }
        })
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let mut conn = self.conn.clone();
        let Ok(serialized) = serde_json::to_string(value) else {
            warn!(key, "cache value failed to serialize");
            return;
        };

        if let Err(err) = redis::cmd("SET")
            .arg(key)
            .arg(serialized)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
        {
            warn!(error = %err, key, "cache write failed");
        }
    }

    pub async fn invalidate(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(err) = redis::cmd("DEL").arg(key).query_async::<_, ()>(&mut conn).await {
            warn!(error = %err, key, "cache invalidation failed");
        }
    }

    pub async fn invalidate_user_pages(&self, user_id: Uuid) {
        // Page keys are `page:{user_id}:{page}:{size}`; without a catalog
        // of outstanding pages we drop the handful of commonly-requested
        // first pages, matching the store's read-through repopulation.
        for page in 0..4 {
            for size in [10, 20, 50] {
                self.invalidate(&page_key(user_id, page, size)).await;
            }
        }
    }
}

pub fn page_key(user_id: Uuid, page: u32, size: u32) -> String {
    format!("rec:page:{}:{}:{}", user_id, page, size)
}

pub fn trending_key() -> &'static str {
    "rec:trending"
}

pub fn analytics_key(days: u32) -> String {
    format!("rec:analytics:{}", days)
}

pub fn insights_key(user_id: Uuid) -> String {
    format!("rec:insights:{}", user_id)
}

pub fn compatibility_key(user_id: Uuid) -> String {
    format!("rec:compat:{}", user_id)
}

pub fn preference_map_key(user_id: Uuid) -> String {
    format!("rec:prefmap:{}", user_id)
}
