//! Shared configuration loader module for ShowSync backend services
//!
//! This module provides a unified configuration loading system with environment variable
//! parsing, validation, and support for .env files. All configuration uses the
//! `SHOWSYNC_` prefix for environment variables, falling back to the bare name used by
//! the surrounding platform (`DATABASE_URL`, `REDIS_URL`, `PORT`, `HOST`, `RUST_LOG`).
//!
//! # Features
//!
//! - Environment variable parsing with typed values
//! - .env file support via dotenvy
//! - Configuration validation with clear error messages
//! - Default values for optional fields
//! - URL, port, and timeout validation
//! - Configuration override hierarchy: defaults < .env < environment
//!
//! # Example
//!
//! ```no_run
//! use showsync_core::config::{ConfigLoader, DatabaseConfig, RedisConfig, ServiceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! dotenvy::dotenv().ok();
//!
//! let db_config = DatabaseConfig::from_env()?;
//! let redis_config = RedisConfig::from_env()?;
//! let service_config = ServiceConfig::from_env()?;
//!
//! db_config.validate()?;
//! redis_config.validate()?;
//! service_config.validate()?;
//! # Ok(())
//! # }
//! ```

use crate::error::RecommendationError;
use std::time::Duration;
use url::Url;

/// Configuration loader trait
///
/// Provides standardized methods for loading and validating configuration from
/// environment variables.
pub trait ConfigLoader: Sized {
    /// Load configuration from environment variables
    ///
    /// Reads environment variables with the `SHOWSYNC_` prefix and constructs
    /// a configuration instance with defaults for missing optional values.
    fn from_env() -> Result<Self, RecommendationError>;

    /// Validate configuration values
    fn validate(&self) -> Result<(), RecommendationError>;
}

/// Database configuration
///
/// # Environment Variables
///
/// - `SHOWSYNC_DATABASE_URL` (required, falls back to `DATABASE_URL`)
/// - `SHOWSYNC_DATABASE_MAX_CONNECTIONS` (default: 20)
/// - `SHOWSYNC_DATABASE_MIN_CONNECTIONS` (default: 2)
/// - `SHOWSYNC_DATABASE_CONNECT_TIMEOUT` (default: 30s)
/// - `SHOWSYNC_DATABASE_IDLE_TIMEOUT` (default: 600s)
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/showsync".to_string(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl ConfigLoader for DatabaseConfig {
    fn from_env() -> Result<Self, RecommendationError> {
        let url = std::env::var("SHOWSYNC_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| {
                RecommendationError::Configuration {
                    message: "DATABASE_URL or SHOWSYNC_DATABASE_URL must be set".to_string(),
                    key: Some("SHOWSYNC_DATABASE_URL".to_string()),
                }
            })?;

        let max_connections = parse_env_var(
            "SHOWSYNC_DATABASE_MAX_CONNECTIONS",
            DatabaseConfig::default().max_connections,
        )?;

        let min_connections = parse_env_var(
            "SHOWSYNC_DATABASE_MIN_CONNECTIONS",
            DatabaseConfig::default().min_connections,
        )?;

        let connect_timeout_secs = parse_env_var("SHOWSYNC_DATABASE_CONNECT_TIMEOUT", 30u64)?;
        let idle_timeout_secs = parse_env_var("SHOWSYNC_DATABASE_IDLE_TIMEOUT", 600u64)?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), RecommendationError> {
        Url::parse(&self.url).map_err(|e| RecommendationError::Configuration {
            message: format!("invalid DATABASE_URL: {}", e),
            key: Some("SHOWSYNC_DATABASE_URL".to_string()),
        })?;

        if self.max_connections == 0 {
            return Err(RecommendationError::Configuration {
                message: "max_connections must be greater than 0".to_string(),
                key: Some("SHOWSYNC_DATABASE_MAX_CONNECTIONS".to_string()),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(RecommendationError::Configuration {
                message: format!(
                    "min_connections ({}) cannot exceed max_connections ({})",
                    self.min_connections, self.max_connections
                ),
                key: Some("SHOWSYNC_DATABASE_MIN_CONNECTIONS".to_string()),
            });
        }

        if self.connect_timeout.as_secs() == 0 {
            return Err(RecommendationError::Configuration {
                message: "connect_timeout must be greater than 0 seconds".to_string(),
                key: Some("SHOWSYNC_DATABASE_CONNECT_TIMEOUT".to_string()),
            });
        }

        if self.idle_timeout.as_secs() == 0 {
            return Err(RecommendationError::Configuration {
                message: "idle_timeout must be greater than 0 seconds".to_string(),
                key: Some("SHOWSYNC_DATABASE_IDLE_TIMEOUT".to_string()),
            });
        }

        Ok(())
    }
}

/// Redis configuration
///
/// # Environment Variables
///
/// - `SHOWSYNC_REDIS_URL` (required, falls back to `REDIS_URL`)
/// - `SHOWSYNC_REDIS_MAX_CONNECTIONS` (default: 10)
/// - `SHOWSYNC_REDIS_CONNECTION_TIMEOUT` (default: 10s)
/// - `SHOWSYNC_REDIS_RESPONSE_TIMEOUT` (default: 5s)
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub response_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            max_connections: 10,
            connection_timeout: Duration::from_secs(10),
            response_timeout: Duration::from_secs(5),
        }
    }
}

impl ConfigLoader for RedisConfig {
    fn from_env() -> Result<Self, RecommendationError> {
        let url = std::env::var("SHOWSYNC_REDIS_URL")
            .or_else(|_| std::env::var("REDIS_URL"))
            .map_err(|_| RecommendationError::Configuration {
                message: "REDIS_URL or SHOWSYNC_REDIS_URL must be set".to_string(),
                key: Some("SHOWSYNC_REDIS_URL".to_string()),
            })?;

        let max_connections = parse_env_var(
            "SHOWSYNC_REDIS_MAX_CONNECTIONS",
            RedisConfig::default().max_connections,
        )?;

        let connection_timeout_secs = parse_env_var("SHOWSYNC_REDIS_CONNECTION_TIMEOUT", 10u64)?;
        let response_timeout_secs = parse_env_var("SHOWSYNC_REDIS_RESPONSE_TIMEOUT", 5u64)?;

        Ok(Self {
            url,
            max_connections,
            connection_timeout: Duration::from_secs(connection_timeout_secs),
            response_timeout: Duration::from_secs(response_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), RecommendationError> {
        Url::parse(&self.url).map_err(|e| RecommendationError::Configuration {
            message: format!("invalid REDIS_URL: {}", e),
            key: Some("SHOWSYNC_REDIS_URL".to_string()),
        })?;

        if self.max_connections == 0 {
            return Err(RecommendationError::Configuration {
                message: "max_connections must be greater than 0".to_string(),
                key: Some("SHOWSYNC_REDIS_MAX_CONNECTIONS".to_string()),
            });
        }

        if self.connection_timeout.as_secs() == 0 {
            return Err(RecommendationError::Configuration {
                message: "connection_timeout must be greater than 0 seconds".to_string(),
                key: Some("SHOWSYNC_REDIS_CONNECTION_TIMEOUT".to_string()),
            });
        }

        if self.response_timeout.as_secs() == 0 {
            return Err(RecommendationError::Configuration {
                message: "response_timeout must be greater than 0 seconds".to_string(),
                key: Some("SHOWSYNC_REDIS_RESPONSE_TIMEOUT".to_string()),
            });
        }

        Ok(())
    }
}

/// Service configuration
///
/// # Environment Variables
///
/// - `SHOWSYNC_SERVICE_HOST` (default: "0.0.0.0", falls back to `HOST`)
/// - `SHOWSYNC_SERVICE_PORT` (default: 8080, falls back to `PORT`)
/// - `SHOWSYNC_SERVICE_WORKERS` (default: CPU count)
/// - `SHOWSYNC_SERVICE_LOG_LEVEL` (default: "info", falls back to `RUST_LOG`)
/// - `SHOWSYNC_SERVICE_REQUEST_TIMEOUT` (default: 60s)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub log_level: String,
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: num_cpus::get(),
            log_level: "info".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ConfigLoader for ServiceConfig {
    fn from_env() -> Result<Self, RecommendationError> {
        let host = std::env::var("SHOWSYNC_SERVICE_HOST")
            .or_else(|_| std::env::var("HOST"))
            .unwrap_or_else(|_| ServiceConfig::default().host);

        let port = parse_env_var("SHOWSYNC_SERVICE_PORT", ServiceConfig::default().port)
            .or_else(|_| parse_env_var("PORT", ServiceConfig::default().port))?;

        let workers = parse_env_var(
            "SHOWSYNC_SERVICE_WORKERS",
            ServiceConfig::default().workers,
        )?;

        let log_level = std::env::var("SHOWSYNC_SERVICE_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| ServiceConfig::default().log_level);

        let request_timeout_secs = parse_env_var("SHOWSYNC_SERVICE_REQUEST_TIMEOUT", 60u64)?;

        Ok(Self {
            host,
            port,
            workers,
            log_level,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), RecommendationError> {
        if self.port == 0 {
            return Err(RecommendationError::Configuration {
                message: "port must be greater than 0".to_string(),
                key: Some("SHOWSYNC_SERVICE_PORT".to_string()),
            });
        }

        if self.workers == 0 {
            return Err(RecommendationError::Configuration {
                message: "workers must be greater than 0".to_string(),
                key: Some("SHOWSYNC_SERVICE_WORKERS".to_string()),
            });
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(RecommendationError::Configuration {
                message: format!(
                    "invalid log_level '{}'. Must be one of: {}",
                    self.log_level,
                    valid_log_levels.join(", ")
                ),
                key: Some("SHOWSYNC_SERVICE_LOG_LEVEL".to_string()),
            });
        }

        if self.request_timeout.as_secs() == 0 {
            return Err(RecommendationError::Configuration {
                message: "request_timeout must be greater than 0 seconds".to_string(),
                key: Some("SHOWSYNC_SERVICE_REQUEST_TIMEOUT".to_string()),
            });
        }

        Ok(())
    }
}

/// Score weighting for `score(m) = wG*genreMatch + wR*ratingFit + wP*platformMatch + wE*eraMatch`.
///
/// Must sum to `1.0 ± 1e-6`; `RecommendationConfig::validate` fails fast
/// (and the service refuses to start) otherwise, per the invariant-violation
/// policy.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub genre: f64,
    pub rating: f64,
    pub platform: f64,
    pub era: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            genre: 0.4,
            rating: 0.3,
            platform: 0.2,
            era: 0.1,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.genre + self.rating + self.platform + self.era
    }

    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() <= 1e-6
    }
}

/// Thresholds behind `PersonalityClassifier`.
///
/// These were implicit constants in the source system; the spec's open
/// question asks that they be promoted to documented config rather than
/// guessed at call sites. Defaults below are the documented resolution.
#[derive(Debug, Clone, Copy)]
pub struct PersonalityThresholds {
    /// Interaction count at/above which a profile is no longer CASUAL.
    pub min_interactions_for_classification: u32,
    /// Completion rate at/above which a user leans BINGE_WATCHER/COMPLETIONIST.
    pub high_completion_rate: f64,
    /// Rating variance at/above which a user leans CRITIC.
    pub high_rating_variance: f64,
    /// Genre-distribution diversity (Shannon entropy) at/above which a user leans EXPLORER/SAMPLER.
    pub high_genre_diversity: f64,
    /// Share of recent interactions in trending titles at/above which a user leans TRENDY.
    pub high_trending_overlap: f64,
}

impl Default for PersonalityThresholds {
    fn default() -> Self {
        Self {
            min_interactions_for_classification: 5,
            high_completion_rate: 0.75,
            high_rating_variance: 2.5,
            high_genre_diversity: 0.7,
            high_trending_overlap: 0.5,
        }
    }
}

/// Cache TTLs for the shared (non-per-user) snapshot caches.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub trending: Duration,
    pub analytics: Duration,
    pub insights: Duration,
    pub compatibility: Duration,
    pub preference_maps: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            trending: Duration::from_secs(6 * 3600),
            analytics: Duration::from_secs(6 * 3600),
            insights: Duration::from_secs_f64(1.0 * 3600.0),
            compatibility: Duration::from_secs(12 * 3600),
            preference_maps: Duration::from_secs(6 * 3600),
        }
    }
}

/// Full configuration surface for the recommendation core, per §6's
/// "Configuration surface" table. Loaded once at startup and validated
/// fail-fast; an `Invariant` error here aborts the process.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub weights: ScoreWeights,
    pub personality: PersonalityThresholds,

    pub min_interactions_for_confidence: u32,
    pub min_confidence_to_personalize: f64,

    pub personalization_factor: f64,
    pub diversity_factor: f64,
    pub exploration_factor: f64,

    pub content_rec_expiry_days: i64,
    pub group_rec_expiry_days: i64,

    pub max_active_per_user: u32,
    pub generation_thread_pool_size: usize,

    pub enable_schedulers: bool,
    pub daily_generation_cron: String,
    pub active_users_refresh_cron: String,
    pub active_users_hours_back: i64,

    pub enable_collaborative: bool,
    pub enable_content_based: bool,
    pub enable_trending: bool,
    pub enable_seasonal: bool,
    pub enable_experimental: bool,

    pub cache_ttls: CacheTtls,

    /// Default collaborative weight for `/recommendations/realtime`'s
    /// collaborative/trending blend (open-question resolution: 0.7/0.3).
    pub realtime_collaborative_weight: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            personality: PersonalityThresholds::default(),
            min_interactions_for_confidence: 5,
            min_confidence_to_personalize: 0.3,
            personalization_factor: 1.2,
            diversity_factor: 0.3,
            exploration_factor: 0.05,
            content_rec_expiry_days: 14,
            group_rec_expiry_days: 7,
            max_active_per_user: 20,
            generation_thread_pool_size: num_cpus::get(),
            enable_schedulers: true,
            daily_generation_cron: "0 0 3 * * *".to_string(),
            active_users_refresh_cron: "0 0 * * * *".to_string(),
            active_users_hours_back: 24,
            enable_collaborative: true,
            enable_content_based: true,
            enable_trending: true,
            enable_seasonal: false,
            enable_experimental: false,
            cache_ttls: CacheTtls::default(),
            realtime_collaborative_weight: 0.7,
        }
    }
}

impl ConfigLoader for RecommendationConfig {
    fn from_env() -> Result<Self, RecommendationError> {
        let defaults = RecommendationConfig::default();

        let weights = ScoreWeights {
            genre: parse_env_var("SHOWSYNC_WEIGHT_GENRE", defaults.weights.genre)?,
            rating: parse_env_var("SHOWSYNC_WEIGHT_RATING", defaults.weights.rating)?,
            platform: parse_env_var("SHOWSYNC_WEIGHT_PLATFORM", defaults.weights.platform)?,
            era: parse_env_var("SHOWSYNC_WEIGHT_ERA", defaults.weights.era)?,
        };

        let personality = PersonalityThresholds {
            min_interactions_for_classification: parse_env_var(
                "SHOWSYNC_PERSONALITY_MIN_INTERACTIONS",
                defaults.personality.min_interactions_for_classification,
            )?,
            high_completion_rate: parse_env_var(
                "SHOWSYNC_PERSONALITY_HIGH_COMPLETION_RATE",
                defaults.personality.high_completion_rate,
            )?,
            high_rating_variance: parse_env_var(
                "SHOWSYNC_PERSONALITY_HIGH_RATING_VARIANCE",
                defaults.personality.high_rating_variance,
            )?,
            high_genre_diversity: parse_env_var(
                "SHOWSYNC_PERSONALITY_HIGH_GENRE_DIVERSITY",
                defaults.personality.high_genre_diversity,
            )?,
            high_trending_overlap: parse_env_var(
                "SHOWSYNC_PERSONALITY_HIGH_TRENDING_OVERLAP",
                defaults.personality.high_trending_overlap,
            )?,
        };

        Ok(Self {
            weights,
            personality,
            min_interactions_for_confidence: parse_env_var(
                "SHOWSYNC_MIN_INTERACTIONS_FOR_CONFIDENCE",
                defaults.min_interactions_for_confidence,
            )?,
            min_confidence_to_personalize: parse_env_var(
                "SHOWSYNC_MIN_CONFIDENCE_TO_PERSONALIZE",
                defaults.min_confidence_to_personalize,
            )?,
            personalization_factor: parse_env_var(
                "SHOWSYNC_PERSONALIZATION_FACTOR",
                defaults.personalization_factor,
            )?,
            diversity_factor: parse_env_var(
                "SHOWSYNC_DIVERSITY_FACTOR",
                defaults.diversity_factor,
            )?,
            exploration_factor: parse_env_var(
                "SHOWSYNC_EXPLORATION_FACTOR",
                defaults.exploration_factor,
            )?,
            content_rec_expiry_days: parse_env_var(
                "SHOWSYNC_CONTENT_REC_EXPIRY_DAYS",
                defaults.content_rec_expiry_days,
            )?,
            group_rec_expiry_days: parse_env_var(
                "SHOWSYNC_GROUP_REC_EXPIRY_DAYS",
                defaults.group_rec_expiry_days,
            )?,
            max_active_per_user: parse_env_var(
                "SHOWSYNC_MAX_ACTIVE_PER_USER",
                defaults.max_active_per_user,
            )?,
            generation_thread_pool_size: parse_env_var(
                "SHOWSYNC_GENERATION_THREAD_POOL_SIZE",
                defaults.generation_thread_pool_size,
            )?,
            enable_schedulers: parse_env_var(
                "SHOWSYNC_ENABLE_SCHEDULERS",
                defaults.enable_schedulers,
            )?,
            daily_generation_cron: std::env::var("SHOWSYNC_DAILY_GENERATION_CRON")
                .unwrap_or(defaults.daily_generation_cron),
            active_users_refresh_cron: std::env::var("SHOWSYNC_ACTIVE_USERS_REFRESH_CRON")
                .unwrap_or(defaults.active_users_refresh_cron),
            active_users_hours_back: parse_env_var(
                "SHOWSYNC_ACTIVE_USERS_HOURS_BACK",
                defaults.active_users_hours_back,
            )?,
            enable_collaborative: parse_env_var(
                "SHOWSYNC_ENABLE_COLLABORATIVE",
                defaults.enable_collaborative,
            )?,
            enable_content_based: parse_env_var(
                "SHOWSYNC_ENABLE_CONTENT_BASED",
                defaults.enable_content_based,
            )?,
            enable_trending: parse_env_var("SHOWSYNC_ENABLE_TRENDING", defaults.enable_trending)?,
            enable_seasonal: parse_env_var("SHOWSYNC_ENABLE_SEASONAL", defaults.enable_seasonal)?,
            enable_experimental: parse_env_var(
                "SHOWSYNC_ENABLE_EXPERIMENTAL",
                defaults.enable_experimental,
            )?,
            cache_ttls: defaults.cache_ttls,
            realtime_collaborative_weight: parse_env_var(
                "SHOWSYNC_REALTIME_COLLABORATIVE_WEIGHT",
                defaults.realtime_collaborative_weight,
            )?,
        })
    }

    fn validate(&self) -> Result<(), RecommendationError> {
        if !self.weights.is_valid() {
            return Err(RecommendationError::invariant(format!(
                "score weights must sum to 1.0 +/- 1e-6, got {}",
                self.weights.sum()
            )));
        }

        if !(0.0..=1.0).contains(&self.min_confidence_to_personalize) {
            return Err(RecommendationError::Configuration {
                message: "min_confidence_to_personalize must be in [0, 1]".to_string(),
                key: Some("SHOWSYNC_MIN_CONFIDENCE_TO_PERSONALIZE".to_string()),
            });
        }

        if self.max_active_per_user == 0 {
            return Err(RecommendationError::Configuration {
                message: "max_active_per_user must be greater than 0".to_string(),
                key: Some("SHOWSYNC_MAX_ACTIVE_PER_USER".to_string()),
            });
        }

        if self.generation_thread_pool_size == 0 {
            return Err(RecommendationError::Configuration {
                message: "generation_thread_pool_size must be greater than 0".to_string(),
                key: Some("SHOWSYNC_GENERATION_THREAD_POOL_SIZE".to_string()),
            });
        }

        if !(0.0..=1.0).contains(&self.realtime_collaborative_weight) {
            return Err(RecommendationError::Configuration {
                message: "realtime_collaborative_weight must be in [0, 1]".to_string(),
                key: Some("SHOWSYNC_REALTIME_COLLABORATIVE_WEIGHT".to_string()),
            });
        }

        Ok(())
    }
}

/// Helper function to parse environment variable with default value
fn parse_env_var<T>(key: &str, default: T) -> Result<T, RecommendationError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| {
            v.parse::<T>().map_err(|e| RecommendationError::Configuration {
                message: format!("failed to parse {}: {}", key, e),
                key: Some(key.to_string()),
            })
        })
        .unwrap_or(Ok(default))
}

/// Load .env file if present
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("warning: failed to load .env file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn set_test_env(key: &str, value: &str) {
        env::set_var(key, value);
    }

    fn clear_test_env(key: &str) {
        env::remove_var(key);
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 2);
    }

    #[test]
    fn test_database_url_fallback() {
        set_test_env("DATABASE_URL", "postgresql://fallback/test");
        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.url, "postgresql://fallback/test");
        clear_test_env("DATABASE_URL");
    }

    #[test]
    fn test_redis_url_fallback() {
        set_test_env("REDIS_URL", "redis://fallback:6379");
        let config = RedisConfig::from_env().unwrap();
        assert_eq!(config.url, "redis://fallback:6379");
        clear_test_env("REDIS_URL");
    }

    #[test]
    fn test_service_port_fallback() {
        set_test_env("PORT", "9000");
        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.port, 9000);
        clear_test_env("PORT");
    }

    #[test]
    fn test_service_config_validation_invalid_log_level() {
        let mut config = ServiceConfig::default();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_score_weights_default_is_valid() {
        assert!(ScoreWeights::default().is_valid());
    }

    #[test]
    fn test_score_weights_invalid_sum_rejected() {
        let weights = ScoreWeights {
            genre: 0.5,
            rating: 0.5,
            platform: 0.5,
            era: 0.0,
        };
        assert!(!weights.is_valid());
    }

    #[test]
    fn test_recommendation_config_default_validates() {
        let config = RecommendationConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_recommendation_config_rejects_bad_weights() {
        let mut config = RecommendationConfig::default();
        config.weights.genre = 0.9;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, RecommendationError::Invariant { .. }));
    }

    #[test]
    fn test_recommendation_config_from_env_overrides_weight() {
        set_test_env("SHOWSYNC_WEIGHT_GENRE", "0.5");
        set_test_env("SHOWSYNC_WEIGHT_RATING", "0.2");
        set_test_env("SHOWSYNC_WEIGHT_PLATFORM", "0.2");
        set_test_env("SHOWSYNC_WEIGHT_ERA", "0.1");

        let config = RecommendationConfig::from_env().unwrap();
        assert_eq!(config.weights.genre, 0.5);
        assert!(config.validate().is_ok());

        clear_test_env("SHOWSYNC_WEIGHT_GENRE");
        clear_test_env("SHOWSYNC_WEIGHT_RATING");
        clear_test_env("SHOWSYNC_WEIGHT_PLATFORM");
        clear_test_env("SHOWSYNC_WEIGHT_ERA");
    }
}
