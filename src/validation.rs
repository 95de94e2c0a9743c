// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

/// Rejects empty or whitespace-only strings
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}

/// Validates that a measurement (height, weight) is strictly positive
pub fn validate_positive_measurement(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("measurement_must_be_positive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("alice").is_ok());
        assert!(validate_not_blank(" a ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t\n").is_err());
    }

    #[test]
    fn test_positive_measurement() {
        assert!(validate_positive_measurement(201.5).is_ok());
        assert!(validate_positive_measurement(0.0).is_err());
        assert!(validate_positive_measurement(-3.0).is_err());
        assert!(validate_positive_measurement(f64::NAN).is_err());
    }
}
