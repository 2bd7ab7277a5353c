//! Validation utilities for ShowSync recommendation data structures
//!
//! Provides validation functions for the numeric ranges and bounds that
//! recur across recommendation requests and feedback payloads.

use crate::error::RecommendationError;

/// Validate rating is within 0.0 to 10.0 range
///
/// # Examples
///
/// ```
/// use showsync_core::validation::validate_rating;
///
/// assert!(validate_rating(7.5).is_ok());
/// assert!(validate_rating(0.0).is_ok());
/// assert!(validate_rating(10.0).is_ok());
/// assert!(validate_rating(-1.0).is_err());
/// assert!(validate_rating(11.0).is_err());
/// ```
pub fn validate_rating(rating: f32) -> Result<(), RecommendationError> {
    if (0.0..=10.0).contains(&rating) {
        Ok(())
    } else {
        Err(RecommendationError::validation_field(
            format!("Rating must be between 0.0 and 10.0, got {}", rating),
            "rating",
        ))
    }
}

/// Validate a confidence or similarity score is within 0.0 to 1.0 range
///
/// # Examples
///
/// ```
/// use showsync_core::validation::validate_unit_score;
///
/// assert!(validate_unit_score(0.85, "confidence").is_ok());
/// assert!(validate_unit_score(0.0, "confidence").is_ok());
/// assert!(validate_unit_score(1.0, "confidence").is_ok());
/// assert!(validate_unit_score(-0.1, "confidence").is_err());
/// assert!(validate_unit_score(1.1, "confidence").is_err());
/// ```
pub fn validate_unit_score(score: f64, field: &str) -> Result<(), RecommendationError> {
    if (0.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(RecommendationError::validation_field(
            format!("Field '{}' must be between 0.0 and 1.0, got {}", field, score),
            field,
        ))
    }
}

/// Validate a page size is within bounds
///
/// # Examples
///
/// ```
/// use showsync_core::validation::validate_page_size;
///
/// assert!(validate_page_size(20, 100).is_ok());
/// assert!(validate_page_size(0, 100).is_err());
/// assert!(validate_page_size(200, 100).is_err());
/// ```
pub fn validate_page_size(size: usize, max: usize) -> Result<(), RecommendationError> {
    if size == 0 {
        Err(RecommendationError::validation_field(
            "Page size must be greater than zero",
            "size",
        ))
    } else if size > max {
        Err(RecommendationError::validation_field(
            format!("Page size must not exceed {}, got {}", max, size),
            "size",
        ))
    } else {
        Ok(())
    }
}

/// Validate string length is within bounds
pub fn validate_string_length(
    value: &str,
    field: &str,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), RecommendationError> {
    let len = value.len();

    if let Some(min_len) = min {
        if len < min_len {
            return Err(RecommendationError::validation_field(
                format!(
                    "Field '{}' must be at least {} characters, got {}",
                    field, min_len, len
                ),
                field,
            ));
        }
    }

    if let Some(max_len) = max {
        if len > max_len {
            return Err(RecommendationError::validation_field(
                format!(
                    "Field '{}' must be at most {} characters, got {}",
                    field, max_len, len
                ),
                field,
            ));
        }
    }

    Ok(())
}

/// Validate a vector is not empty
pub fn validate_not_empty<T>(vec: &[T], field: &str) -> Result<(), RecommendationError> {
    if vec.is_empty() {
        Err(RecommendationError::validation_field(
            format!("Field '{}' must not be empty", field),
            field,
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_validation() {
        assert!(validate_rating(7.5).is_ok());
        assert!(validate_rating(0.0).is_ok());
        assert!(validate_rating(10.0).is_ok());

        assert!(validate_rating(-1.0).is_err());
        assert!(validate_rating(11.0).is_err());
    }

    #[test]
    fn test_unit_score_validation() {
        assert!(validate_unit_score(0.85, "confidence").is_ok());
        assert!(validate_unit_score(0.0, "confidence").is_ok());
        assert!(validate_unit_score(1.0, "confidence").is_ok());

        assert!(validate_unit_score(-0.1, "confidence").is_err());
        assert!(validate_unit_score(1.1, "confidence").is_err());
    }

    #[test]
    fn test_page_size_validation() {
        assert!(validate_page_size(20, 100).is_ok());
        assert!(validate_page_size(100, 100).is_ok());

        assert!(validate_page_size(0, 100).is_err());
        assert!(validate_page_size(200, 100).is_err());
    }

    #[test]
    fn test_string_length_validation() {
        assert!(validate_string_length("hello", "test", Some(1), Some(10)).is_ok());
        assert!(validate_string_length("hello", "test", Some(5), Some(5)).is_ok());

        assert!(validate_string_length("hi", "test", Some(5), None).is_err());
        assert!(validate_string_length("too long string", "test", None, Some(5)).is_err());
    }

    #[test]
    fn test_not_empty_validation() {
        assert!(validate_not_empty(&[1, 2, 3], "test").is_ok());
        assert!(validate_not_empty(&["a"], "test").is_ok());

        let empty: Vec<i32> = vec![];
        assert!(validate_not_empty(&empty, "test").is_err());
    }
}
