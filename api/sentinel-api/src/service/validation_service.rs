use crate::module::error::AppError;

/// Confidence and risk scores live in the closed unit interval.
pub fn validate_unit_score(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(AppError::unprocessable(
            "SCORE_OUT_OF_RANGE",
            format!("{field} must be between 0.0 and 1.0, got {value}"),
        ));
    }
    Ok(())
}

pub fn validate_optional_unit_score(field: &str, value: Option<f64>) -> Result<(), AppError> {
    match value {
        Some(v) => validate_unit_score(field, v),
        None => Ok(()),
    }
}

pub fn validate_non_negative(field: &str, value: Option<f64>) -> Result<(), AppError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(AppError::unprocessable(
            "INVALID_NUMBER",
            format!("{field} must be a non-negative number"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_bounds_are_inclusive() {
        assert!(validate_unit_score("confidence_score", 0.0).is_ok());
        assert!(validate_unit_score("confidence_score", 1.0).is_ok());
        assert!(validate_unit_score("confidence_score", 1.0001).is_err());
        assert!(validate_unit_score("confidence_score", -0.1).is_err());
        assert!(validate_unit_score("confidence_score", f64::NAN).is_err());
    }

    #[test]
    fn error_names_the_offending_field() {
        let err = validate_optional_unit_score("safe_prompt_score", Some(2.0)).expect_err("range");
        assert!(err.message.contains("safe_prompt_score"));
    }
}
