//! Wire types for the submission pipeline.
//!
//! [`SubmissionRequest`] is the shape a submission arrives in: numeric
//! fields are strings because that is how form data reaches the backend,
//! and turning them into numbers is a validation concern, not a parsing
//! accident. [`SubmissionReceipt`] is what a successful submission returns.

use serde::{Deserialize, Serialize};
use startline_core::entry::EntryCode;
use startline_core::record::RegistrationRecord;

/// One inbound registration submission, as received from the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    /// Participant first name.
    pub first_name: String,
    /// Participant last name.
    pub last_name: String,
    /// Date of birth in ISO `YYYY-MM-DD` form.
    pub birth_date: String,
    /// Club or team name.
    #[serde(default)]
    pub club: Option<String>,
    /// Registration category (`cadet`, `junior`, `senior`).
    pub category: String,
    /// Age in years; arrives as text and must parse as a number.
    pub age: String,
    /// Weight in kilograms; arrives as text and must parse as a number.
    pub weight_kg: String,
    /// Optional federation license card number.
    #[serde(default)]
    pub license_no: Option<String>,
}

/// The response to a successfully committed submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// The assigned entry code.
    pub entry_code: EntryCode,
    /// File name of the rendered application form.
    pub form_file: String,
    /// Full path to the rendered application form.
    pub form_path: String,
    /// The persisted record with its normalized fields.
    pub record: RegistrationRecord,
}

/// Machine-readable error payload returned to clients.
///
/// `kind` is stable per error taxonomy entry so client code and operators
/// can tell bad input from overload from infrastructure failure without
/// parsing messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error kind, e.g. `validation_error`.
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}
