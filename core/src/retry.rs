//! Exponential backoff retry utility
//!
//! Provides configurable retry mechanisms with exponential backoff and jitter
//! for handling transient failures in distributed systems.
//!
//! # Examples
//!
//! ```
//! use showsync_core::retry::{RetryPolicy, retry_with_backoff};
//!
//! async fn fallible_operation() -> Result<String, std::io::Error> {
//!     // Your operation that might fail
//!     Ok("success".to_string())
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Use default policy
//! let result = retry_with_backoff(
//!     || async { fallible_operation().await },
//!     RetryPolicy::default(),
//!     |err: &std::io::Error| err.kind() == std::io::ErrorKind::ConnectionRefused,
//! ).await?;
//!
//! // Use aggressive policy for critical operations
//! let result = retry_with_backoff(
//!     || async { fallible_operation().await },
//!     RetryPolicy::aggressive(),
//!     |_| true,
//! ).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy configuration for exponential backoff
///
/// Defines the behavior of retry attempts including maximum retries,
/// delay parameters, and whether to apply jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 means no retries, only initial attempt)
    pub max_retries: u32,

    /// Base delay in milliseconds for the first retry
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds to cap exponential growth
    pub max_delay_ms: u64,

    /// Whether to add random jitter to delays (recommended for distributed systems)
    pub jitter: bool,
}

impl Default for RetryPolicy {
    /// Creates a default retry policy with sensible defaults
    ///
    /// - max_retries: 3
    /// - base_delay_ms: 100
    /// - max_delay_ms: 5000
    /// - jitter: true
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom parameters
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Maximum number of retry attempts
    /// * `base_delay_ms` - Base delay in milliseconds
    /// * `max_delay_ms` - Maximum delay in milliseconds
    /// * `jitter` - Whether to apply random jitter
    ///
    /// # Examples
    ///
    /// ```
    /// use showsync_core::retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(5, 200, 10000, true);
    /// assert_eq!(policy.max_retries, 5);
    /// assert_eq!(policy.base_delay_ms, 200);
    /// ```
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64, jitter: bool) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            jitter,
        }
    }

    /// Creates an aggressive retry policy for critical operations
    ///
    /// - max_retries: 5
    /// - base_delay_ms: 50
    /// - max_delay_ms: 5000
    /// - jitter: true
    ///
    /// Use this for operations that must succeed and can tolerate more retry attempts.
    ///
    /// # Examples
    ///
    /// ```
    /// use showsync_core::retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::aggressive();
    /// assert_eq!(policy.max_retries, 5);
    /// assert_eq!(policy.base_delay_ms, 50);
    /// ```
    pub fn aggressive() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 50,
            max_delay_ms: 5000,
            jitter: true,
        }
    }

    /// Creates a gentle retry policy for non-critical operations
    ///
    /// - max_retries: 2
    /// - base_delay_ms: 500
    /// - max_delay_ms: 3000
    /// - jitter: true
    ///
    /// Use this for operations that are not time-sensitive and should back off more gracefully.
    ///
    /// # Examples
    ///
    /// ```
    /// use showsync_core::retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::gentle();
    /// assert_eq!(policy.max_retries, 2);
    /// assert_eq!(policy.base_delay_ms, 500);
    /// ```
    pub fn gentle() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 3000,
            jitter: true,
        }
    }

    /// Calculates the delay for a given retry attempt
    ///
    /// Uses exponential backoff: delay = min(base * 2^attempt, max_delay)
    /// Optionally adds random jitter: delay + random(0, delay * 0.3)
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry attempt number (0-indexed)
    ///
    /// # Returns
    ///
    /// Duration to wait before the next retry attempt
    fn calculate_delay(&self, attempt: u32) -> Duration {
        // Calculate exponential backoff: base * 2^attempt
        let exponential_delay = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt));

        // Cap at maximum delay
        let capped_delay = exponential_delay.min(self.max_delay_ms);

        // Apply jitter if enabled
        let final_delay = if self.jitter {
            let jitter_range = (capped_delay as f64 * 0.3) as u64;
            let jitter = if jitter_range > 0 {
                // Use a simple random number generation based on current time
                // For production-grade randomness, this is replaced with rand crate
                let nanos = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .subsec_nanos() as u64;
                nanos % (jitter_range + 1)
            } else {
                0
            };
            capped_delay.saturating_add(jitter)
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay)
    }
}

/// Retries an async operation with exponential backoff
///
/// Executes the provided async closure and retries on failure according to the retry policy.
/// Only retries when the predicate function returns true for the error.
///
/// # Type Parameters
///
/// * `F` - Factory function that creates the future to retry
/// * `Fut` - Future type returned by the factory
/// * `T` - Success type
/// * `E` - Error type
///
/// # Arguments
///
/// * `operation` - Async closure that produces a future to execute
/// * `policy` - Retry policy configuration
/// * `is_retryable` - Predicate to determine if an error should trigger a retry
///
/// # Returns
///
/// Result of the operation after retries are exhausted or success is achieved
///
/// # Examples
///
/// ```
/// use showsync_core::retry::{RetryPolicy, retry_with_backoff};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut attempt = 0;
/// let result = retry_with_backoff(
///     || async {
///         attempt += 1;
///         if attempt < 3 {
///             Err("temporary failure")
///         } else {
///             Ok("success")
///         }
///     },
///     RetryPolicy::default(),
///     |_: &str| true,
/// ).await;
///
/// assert!(result.is_ok());
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    mut operation: F,
    policy: RetryPolicy,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        // Execute the operation
        match operation().await {
            Ok(result) => {
                // Success - return immediately
                tracing::debug!(
                    attempt = attempt,
                    total_attempts = attempt + 1,
                    "Operation succeeded"
                );
                return Ok(result);
            }
            Err(error) => {
                // Check if we should retry
                if attempt >= policy.max_retries {
                    // Exhausted all retries
                    tracing::warn!(
                        attempt = attempt,
                        max_retries = policy.max_retries,
                        "All retry attempts exhausted"
                    );
                    return Err(error);
                }

                // Check if error is retryable
                if !is_retryable(&error) {
                    // Non-retryable error - fail immediately
                    tracing::debug!(
                        attempt = attempt,
                        "Error is not retryable, failing immediately"
                    );
                    return Err(error);
                }

                // Calculate delay and wait
                let delay = policy.calculate_delay(attempt);
                tracing::debug!(
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    max_retries = policy.max_retries,
                    "Retrying after delay"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
