//! Circuit breaker implementation.
//!
//! Three states: `Closed` (calls pass through, failures are counted),
//! `Open` (calls are rejected until `timeout_duration` elapses), and
//! `HalfOpen` (a bounded number of trial calls are allowed through to
//! decide whether to close or reopen).

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        };
        write!(f, "{s}")
    }
}

/// Tunables for a `CircuitBreaker`.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures (while closed) before the circuit opens.
    pub failure_threshold: u32,
    /// Consecutive successes (while half-open) before the circuit closes.
    pub success_threshold: u32,
    /// How long the circuit stays open before trial calls are allowed.
    pub timeout_duration: Duration,
    /// Maximum concurrent trial calls while half-open.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout_duration: Duration::from_secs(30),
            half_open_max_calls: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// Preset tuned for the internal platform catalog API.
    pub fn platform_api() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout_duration: Duration::from_secs(30),
            half_open_max_calls: 3,
        }
    }

    /// Preset tuned for PubNub-style realtime push delivery.
    pub fn pubnub() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 2,
            timeout_duration: Duration::from_secs(10),
            half_open_max_calls: 2,
        }
    }

    /// Preset tuned for a slow, occasionally-flaky embedding/ML service.
    pub fn embedding_service() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout_duration: Duration::from_secs(60),
            half_open_max_calls: 3,
        }
    }
}

/// Error returned by `CircuitBreaker::call`.
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit '{name}' is open")]
    CircuitOpen { name: String },

    #[error("circuit '{name}' has reached its half-open call limit")]
    TooManyCalls { name: String },

    #[error("call failed")]
    CallFailed { source: E },
}

/// Point-in-time counters for a circuit breaker, suitable for logging or
/// exposing on a diagnostics endpoint.
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    half_open_calls: u32,
    opened_at: Option<Instant>,
}

/// An async circuit breaker guarding a single downstream dependency.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                half_open_calls: 0,
                opened_at: None,
            }),
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    pub async fn failure_count(&self) -> u32 {
        self.inner.lock().await.failure_count
    }

    pub async fn success_count(&self) -> u32 {
        self.inner.lock().await.success_count
    }

    pub async fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock().await;
        CircuitBreakerMetrics {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
        }
    }

    /// Force the circuit open, as if `failure_threshold` had just been hit.
    pub async fn force_open(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.half_open_calls = 0;
    }

    /// Reset to a fresh closed state, clearing all counters.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.half_open_calls = 0;
        inner.opened_at = None;
    }

    /// Returns `Err(CircuitOpen)`/`Err(TooManyCalls)` if the circuit rejects
    /// this call outright; otherwise reserves a call slot and returns.
    async fn admit(&self) -> Result<(), CircuitBreakerError<std::convert::Infallible>> {
        let mut inner = self.inner.lock().await;

        if inner.state == CircuitState::Open {
            let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
            if elapsed >= self.config.timeout_duration {
                inner.state = CircuitState::HalfOpen;
                inner.half_open_calls = 0;
                inner.success_count = 0;
            } else {
                return Err(CircuitBreakerError::CircuitOpen {
                    name: self.name.clone(),
                });
            }
        }

        if inner.state == CircuitState::HalfOpen {
            if inner.half_open_calls >= self.config.half_open_max_calls {
                return Err(CircuitBreakerError::TooManyCalls {
                    name: self.name.clone(),
                });
            }
            inner.half_open_calls += 1;
        }

        Ok(())
    }

    async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::HalfOpen => {
                inner.half_open_calls = inner.half_open_calls.saturating_sub(1);
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.half_open_calls = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::HalfOpen => {
                inner.half_open_calls = inner.half_open_calls.saturating_sub(1);
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.success_count = 0;
            }
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Run `fut` through the circuit breaker.
    pub async fn call<T, E, F>(&self, fut: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.admit().await.map_err(|e| match e {
            CircuitBreakerError::CircuitOpen { name } => CircuitBreakerError::CircuitOpen { name },
            CircuitBreakerError::TooManyCalls { name } => {
                CircuitBreakerError::TooManyCalls { name }
            }
            CircuitBreakerError::CallFailed { .. } => unreachable!("admit never fails calls"),
        })?;

        match fut.await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(source) => {
                self.record_failure().await;
                Err(CircuitBreakerError::CallFailed { source })
            }
        }
    }

    /// Run `fut` through the circuit breaker, falling back to a locally
    /// computed value instead of propagating rejection or failure.
    pub async fn call_with_fallback<T, E, F, Fallback>(
        &self,
        fut: F,
        fallback: Fallback,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
        Fallback: FnOnce() -> T,
    {
        match self.call(fut).await {
            Ok(value) => Ok(value),
            Err(CircuitBreakerError::CircuitOpen { .. })
            | Err(CircuitBreakerError::TooManyCalls { .. }) => Ok(fallback()),
            Err(other) => Err(other),
        }
    }
}
