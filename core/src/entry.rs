//! Entry code and sequence namespace types.
//!
//! This module defines strong types for participant entry codes (`EntryCode`),
//! the counter namespaces they are allocated from (`SequenceName`), and the
//! registration categories (`Category`) that tie the two together.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of zero-padded digits in a formatted entry code.
///
/// Codes widen past this once a namespace outgrows six digits; the width is
/// a floor, not a ceiling.
pub const ENTRY_CODE_DIGITS: usize = 6;

/// Error type for `EntryCode` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid entry code: {0}")]
pub struct ParseEntryCodeError(String);

/// A human-readable sequential participant identifier.
///
/// An entry code is the public identifier of one registration, e.g.
/// `"CAD-000042"`: an uppercase category prefix, a dash, and a zero-padded
/// sequence value. Codes are allocated from a [`SequenceName`] counter and
/// are globally unique across all registrations.
///
/// # Design
///
/// `EntryCode` is a newtype wrapper around `String` that provides:
/// - Type safety (can't accidentally use a regular string)
/// - A single formatting rule ([`EntryCode::format`]) shared by every caller
/// - Suffix re-parsing for seed computation ([`EntryCode::numeric_suffix`])
///
/// # Validation
///
/// - `FromStr::from_str()`: Validates shape (rejects codes without a
///   `PREFIX-digits` structure)
/// - `format()`: No validation needed (constructed from typed parts)
///
/// # Examples
///
/// ```
/// use startline_core::entry::EntryCode;
///
/// let code = EntryCode::format("CAD", 42);
/// assert_eq!(code.as_str(), "CAD-000042");
/// assert_eq!(code.numeric_suffix(), Some(42));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryCode(String);

impl EntryCode {
    /// Format a sequence value into an entry code.
    ///
    /// Pure function: `prefix + "-" + zero_pad(value, 6)`. Values that need
    /// more than six digits keep all of their digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use startline_core::entry::EntryCode;
    ///
    /// assert_eq!(EntryCode::format("CAD", 7).as_str(), "CAD-000007");
    /// assert_eq!(EntryCode::format("SEN", 1_234_567).as_str(), "SEN-1234567");
    /// ```
    #[must_use]
    pub fn format(prefix: &str, value: u64) -> Self {
        let width = ENTRY_CODE_DIGITS;
        Self(format!("{prefix}-{value:0width$}"))
    }

    /// Get the entry code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the `EntryCode` into its inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The prefix part of the code (everything before the last dash).
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.0.rsplit_once('-').map_or("", |(prefix, _)| prefix)
    }

    /// Parse the numeric suffix back out of the code.
    ///
    /// Returns `None` if the code has no parseable trailing number. Used by
    /// seed heuristics that recover the highest previously-issued value from
    /// existing records.
    #[must_use]
    pub fn numeric_suffix(&self) -> Option<u64> {
        self.0
            .rsplit_once('-')
            .and_then(|(_, digits)| digits.parse().ok())
    }
}

impl fmt::Display for EntryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryCode {
    type Err = ParseEntryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('-') {
            Some((prefix, digits))
                if !prefix.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) && !digits.is_empty() =>
            {
                Ok(Self(s.to_string()))
            }
            _ => Err(ParseEntryCodeError(format!(
                "expected PREFIX-digits, got {s:?}"
            ))),
        }
    }
}

impl From<EntryCode> for String {
    fn from(code: EntryCode) -> Self {
        code.0
    }
}

/// Name of a persisted counter namespace.
///
/// One counter row exists per sequence name; parallel registration types
/// (cadets, juniors, seniors) run independent numberings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceName(String);

impl SequenceName {
    /// Create a new `SequenceName` from a string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the sequence name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for `Category` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown category: {0}")]
pub struct ParseCategoryError(String);

/// Registration category.
///
/// Each category owns its own entry-code namespace: a dedicated counter and
/// a distinct code prefix, so cadet and senior numberings advance
/// independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Cadet division (codes prefixed `CAD`).
    Cadet,
    /// Junior division (codes prefixed `JUN`).
    Junior,
    /// Senior division (codes prefixed `SEN`).
    Senior,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 3] = [Self::Cadet, Self::Junior, Self::Senior];

    /// Find the category that allocates from the given sequence namespace.
    #[must_use]
    pub fn from_sequence_name(name: &SequenceName) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.sequence_name() == *name)
    }

    /// The counter namespace this category allocates entry codes from.
    #[must_use]
    pub fn sequence_name(self) -> SequenceName {
        match self {
            Self::Cadet => SequenceName::new("cadet_entries"),
            Self::Junior => SequenceName::new("junior_entries"),
            Self::Senior => SequenceName::new("senior_entries"),
        }
    }

    /// The entry-code prefix for this category.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::Cadet => "CAD",
            Self::Junior => "JUN",
            Self::Senior => "SEN",
        }
    }

    /// Category name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cadet => "cadet",
            Self::Junior => "junior",
            Self::Senior => "senior",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cadet" => Ok(Self::Cadet),
            "junior" => Ok(Self::Junior),
            "senior" => Ok(Self::Senior),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}
