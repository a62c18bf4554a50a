//! Submission validation and normalization.
//!
//! Turns a raw [`SubmissionRequest`] into a typed
//! [`NewRegistration`](startline_core::record::NewRegistration). Everything
//! here runs before any counter value is consumed or any render call is
//! made: a submission that fails validation costs nothing.

use crate::types::SubmissionRequest;
use chrono::NaiveDate;
use startline_core::entry::Category;
use startline_core::record::NewRegistration;
use std::str::FromStr;
use thiserror::Error;

/// Why a submission was rejected before entering the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The offending field name.
        field: &'static str,
    },

    /// A numeric field did not parse as a number.
    #[error("Invalid number in {field}: {value:?}")]
    InvalidNumber {
        /// The offending field name.
        field: &'static str,
        /// The raw value as submitted.
        value: String,
    },

    /// The birth date was not a valid ISO date.
    #[error("Invalid birth date: {value:?}")]
    InvalidBirthDate {
        /// The raw value as submitted.
        value: String,
    },

    /// The category is not one we register for.
    #[error("Unknown category: {value:?}")]
    UnknownCategory {
        /// The raw value as submitted.
        value: String,
    },
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Validate and normalize a raw submission.
///
/// Strings are trimmed, numeric fields parsed, the category resolved, and a
/// missing or whitespace-only license normalized to the empty string (blank
/// licenses don't participate in the uniqueness invariant).
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first rejected field.
pub fn normalize(request: &SubmissionRequest) -> Result<NewRegistration, ValidationError> {
    let first_name = required("first_name", &request.first_name)?;
    let last_name = required("last_name", &request.last_name)?;

    let birth_date = NaiveDate::from_str(request.birth_date.trim()).map_err(|_| {
        ValidationError::InvalidBirthDate {
            value: request.birth_date.clone(),
        }
    })?;

    let category =
        Category::from_str(&request.category).map_err(|_| ValidationError::UnknownCategory {
            value: request.category.clone(),
        })?;

    let age: u32 =
        request
            .age
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidNumber {
                field: "age",
                value: request.age.clone(),
            })?;

    let weight_kg: f64 =
        request
            .weight_kg
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidNumber {
                field: "weight_kg",
                value: request.weight_kg.clone(),
            })?;
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(ValidationError::InvalidNumber {
            field: "weight_kg",
            value: request.weight_kg.clone(),
        });
    }

    Ok(NewRegistration {
        first_name,
        last_name,
        birth_date,
        club: request
            .club
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        category,
        age,
        weight_kg,
        license_no: request
            .license_no
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_request() -> SubmissionRequest {
        SubmissionRequest {
            first_name: "  Anna ".to_string(),
            last_name: "Kovacs".to_string(),
            birth_date: "2010-03-14".to_string(),
            club: Some(" Falcons ".to_string()),
            category: "cadet".to_string(),
            age: "15".to_string(),
            weight_kg: "52.5".to_string(),
            license_no: Some("  HUN-1234 ".to_string()),
        }
    }

    #[test]
    fn normalizes_a_valid_request() {
        let registration = normalize(&valid_request()).unwrap();
        assert_eq!(registration.first_name, "Anna");
        assert_eq!(registration.club, "Falcons");
        assert_eq!(registration.category, Category::Cadet);
        assert_eq!(registration.age, 15);
        assert!((registration.weight_kg - 52.5).abs() < f64::EPSILON);
        assert_eq!(registration.license_no, "HUN-1234");
    }

    #[test]
    fn blank_license_normalizes_to_empty() {
        let mut request = valid_request();
        request.license_no = Some("   ".to_string());
        assert_eq!(normalize(&request).unwrap().license_no, "");

        request.license_no = None;
        assert_eq!(normalize(&request).unwrap().license_no, "");
    }

    #[test]
    fn rejects_malformed_age() {
        let mut request = valid_request();
        request.age = "fifteen".to_string();
        assert_eq!(
            normalize(&request),
            Err(ValidationError::InvalidNumber {
                field: "age",
                value: "fifteen".to_string(),
            })
        );
    }

    #[test]
    fn rejects_malformed_weight() {
        let mut request = valid_request();
        request.weight_kg = "-3".to_string();
        assert!(matches!(
            normalize(&request),
            Err(ValidationError::InvalidNumber { field: "weight_kg", .. })
        ));
    }

    #[test]
    fn rejects_blank_names() {
        let mut request = valid_request();
        request.last_name = "  ".to_string();
        assert_eq!(
            normalize(&request),
            Err(ValidationError::MissingField { field: "last_name" })
        );
    }

    #[test]
    fn rejects_bad_birth_date_and_category() {
        let mut request = valid_request();
        request.birth_date = "14/03/2010".to_string();
        assert!(matches!(
            normalize(&request),
            Err(ValidationError::InvalidBirthDate { .. })
        ));

        let mut request = valid_request();
        request.category = "veteran".to_string();
        assert!(matches!(
            normalize(&request),
            Err(ValidationError::UnknownCategory { .. })
        ));
    }
}
