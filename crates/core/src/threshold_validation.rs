//! Shared threshold validation helpers.
//!
//! Provides reusable range-checking functions used by the scoring,
//! progress, and matching modules.

use crate::error::CoreError;

/// Validate that a value falls within `[0.0, 1.0]`.
///
/// Returns a `CoreError::Validation` naming the field if out of range.
/// `NaN` is rejected.
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a percentage falls within `[0.0, 100.0]`.
pub fn validate_percentage(value: f64, name: &str) -> Result<(), CoreError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a weight is finite and non-negative.
pub fn validate_weight(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{name} must be a finite, non-negative weight, got {value}"
        )));
    }
    Ok(())
}

/// Validate that an item count is within `1..=max`.
pub fn validate_count_range(count: usize, max: usize, label: &str) -> Result<(), CoreError> {
    if count == 0 {
        return Err(CoreError::Validation(format!(
            "{label} requires at least one item"
        )));
    }
    if count > max {
        return Err(CoreError::Validation(format!(
            "{label} allows at most {max} items, got {count}"
        )));
    }
    Ok(())
}

/// Clamp a user-provided limit to `1..=max`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> usize {
    limit.unwrap_or(default).max(1).min(max) as usize
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round a composite score to six decimal places.
///
/// Weighted sums such as `0.4 + 0.2` otherwise miss thresholds they land
/// on exactly, and equal scores must compare equal for tie-breaks.
pub fn round_score(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_values() {
        assert!(validate_unit_range(0.0, "test").is_ok());
        assert!(validate_unit_range(0.5, "test").is_ok());
        assert!(validate_unit_range(1.0, "test").is_ok());
    }

    #[test]
    fn rejects_below_zero() {
        assert!(validate_unit_range(-0.01, "test").is_err());
    }

    #[test]
    fn rejects_above_one() {
        assert!(validate_unit_range(1.01, "test").is_err());
    }

    #[test]
    fn rejects_nan() {
        assert!(validate_unit_range(f64::NAN, "test").is_err());
        assert!(validate_percentage(f64::NAN, "test").is_err());
        assert!(validate_weight(f64::NAN, "test").is_err());
    }

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage(0.0, "pct").is_ok());
        assert!(validate_percentage(100.0, "pct").is_ok());
        assert!(validate_percentage(100.5, "pct").is_err());
        assert!(validate_percentage(-1.0, "pct").is_err());
    }

    #[test]
    fn weight_rejects_negative_and_infinite() {
        assert!(validate_weight(0.0, "w").is_ok());
        assert!(validate_weight(-0.1, "w").is_err());
        assert!(validate_weight(f64::INFINITY, "w").is_err());
    }

    #[test]
    fn count_range() {
        assert!(validate_count_range(0, 10, "Cohort").is_err());
        assert!(validate_count_range(1, 10, "Cohort").is_ok());
        assert!(validate_count_range(10, 10, "Cohort").is_ok());
        assert!(validate_count_range(11, 10, "Cohort").is_err());
    }

    #[test]
    fn clamp_limit_defaults_and_bounds() {
        assert_eq!(clamp_limit(None, 10, 50), 10);
        assert_eq!(clamp_limit(Some(0), 10, 50), 1);
        assert_eq!(clamp_limit(Some(-5), 10, 50), 1);
        assert_eq!(clamp_limit(Some(500), 10, 50), 50);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert!((round2(33.333_333) - 33.33).abs() < 1e-9);
        assert!((round2(66.666_666) - 66.67).abs() < 1e-9);
    }

    #[test]
    fn round_score_lands_on_threshold() {
        assert_eq!(round_score(0.4 + 0.2), 0.6);
        assert_eq!(round_score(0.1 + 0.2), 0.3);
    }
}
