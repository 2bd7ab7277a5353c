//! Core data model: preference profiles, recommendations, feedback, and the
//! external read-only views this crate consumes but does not own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Bucket for a media item's typical runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferredLength {
    Short,
    Medium,
    Long,
}

impl PreferredLength {
    pub fn from_minutes(minutes: i32) -> Self {
        if minutes < 30 {
            Self::Short
        } else if minutes <= 120 {
            Self::Medium
        } else {
            Self::Long
        }
    }
}

/// Closed-set viewing-personality label. Adding a variant is a schema
/// change requiring explanation-template backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewingPersonality {
    Casual,
    Critic,
    BingeWatcher,
    Explorer,
    ComfortSeeker,
    Social,
    Trendy,
    Niche,
    Completionist,
    Sampler,
}

/// Per-user aggregate taste profile, rebuilt by the profile builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub user_id: Uuid,
    pub genre_weights: HashMap<String, f64>,
    pub platform_weights: HashMap<String, f64>,
    pub era_weights: HashMap<String, f64>,
    pub preferred_length: PreferredLength,
    pub avg_rating: f64,
    pub rating_variance: f64,
    pub total_interactions: u32,
    pub total_completed: u32,
    pub personality: ViewingPersonality,
    pub confidence: f64,
    pub last_calculated_at: DateTime<Utc>,
}

impl PreferenceProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            genre_weights: HashMap::new(),
            platform_weights: HashMap::new(),
            era_weights: HashMap::new(),
            preferred_length: PreferredLength::Medium,
            avg_rating: 7.0,
            rating_variance: 0.0,
            total_interactions: 0,
            total_completed: 0,
            personality: ViewingPersonality::Casual,
            confidence: 0.0,
            last_calculated_at: Utc::now(),
        }
    }

    pub fn completion_rate(&self) -> f64 {
        if self.total_interactions == 0 {
            0.0
        } else {
            self.total_completed as f64 / self.total_interactions as f64
        }
    }

    /// Whether this profile carries enough signal to drive personalization
    /// rather than falling back to trending/cold-start content.
    pub fn has_sufficient_data(&self) -> bool {
        self.total_interactions >= 5 && self.confidence >= 0.3
    }

    /// Forces the next builder pass to recompute this profile from scratch.
    pub fn mark_for_recalculation(&mut self) {
        self.confidence = 0.0;
    }
}

/// Closed enum of reasons a recommendation was produced; drives the
/// explanation template in [`crate::explain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationReason {
    GenreMatch,
    SimilarContent,
    GroupActivity,
    SimilarUsers,
    TrendingGlobal,
    TrendingGenre,
    HighlyRated,
    NewRelease,
    AwardWinner,
    CompletionPattern,
    BingeWorthy,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    Personal,
    Group,
    Trending,
    Collaborative,
    ContentBased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: Uuid,
    pub score: f64,
    pub reason: RecommendationReason,
    pub explanation: String,
    pub rec_type: RecommendationType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub dismiss_reason: Option<String>,
}

impl ContentRecommendation {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.dismissed_at.is_none() && now < self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub score: f64,
    pub reason: RecommendationReason,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub dismiss_reason: Option<String>,
}

impl GroupRecommendation {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.dismissed_at.is_none() && now < self.expires_at
    }
}

/// Which kind of recommendation a feedback/view/dismiss action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationKind {
    Content,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackType {
    Positive,
    Negative,
    Neutral,
}

impl FeedbackType {
    /// score >= 4 => Positive, score <= 2 => Negative, else Neutral.
    pub fn from_score(score: u8) -> Self {
        if score >= 4 {
            Self::Positive
        } else if score <= 2 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
            Self::Neutral => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionTaken {
    JoinedGroup,
    AddedToLibrary,
    Dismissed,
    Viewed,
}

pub const FEEDBACK_TEXT_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationFeedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recommendation_kind: RecommendationKind,
    pub recommendation_id: Uuid,
    pub feedback_type: FeedbackType,
    pub score: Option<u8>,
    pub comment: Option<String>,
    pub action_taken: Option<ActionTaken>,
    pub created_at: DateTime<Utc>,
}

impl RecommendationFeedback {
    pub fn clip_comment(comment: &str) -> String {
        comment.chars().take(FEEDBACK_TEXT_MAX_CHARS).collect()
    }
}

/// External read-only interaction view (owned by the library/rating CRUD
/// collaborator). Joined with [`Media`] when building a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: Uuid,
    pub media_id: Uuid,
    pub rating: Option<f64>,
    pub status: InteractionStatus,
    pub progress: Option<f64>,
    pub favorite: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionStatus {
    Watching,
    Completed,
    PlanToWatch,
    Dropped,
}

/// External read-only media metadata view (owned by the catalog collaborator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub title: String,
    pub media_type: String,
    pub genres: Vec<String>,
    pub release_date: DateTime<Utc>,
    pub runtime_minutes: Option<i32>,
    pub average_rating: Option<f64>,
    pub rating_count: Option<u32>,
}

impl Media {
    pub fn era_bucket(&self) -> String {
        let decade = (self.release_date.format("%Y").to_string().parse::<i32>().unwrap_or(2000)
            / 10)
            * 10;
        format!("{}s", decade)
    }

    pub fn genre_vector(&self) -> HashMap<String, f64> {
        self.genres.iter().map(|g| (g.clone(), 1.0)).collect()
    }
}

/// External read-only group view (owned by the group/chat collaborator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub visibility: GroupVisibility,
    pub member_count: u32,
    pub activity_level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    pub user_id: Uuid,
    pub group_id: Uuid,
}

/// A candidate media item scored for a single user, before diversification.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub media_id: Uuid,
    pub score: f64,
    pub reason: RecommendationReason,
    pub rec_type: RecommendationType,
    pub genres: Vec<String>,
    pub top_genre: Option<String>,
    pub anchor_title: Option<String>,
}
