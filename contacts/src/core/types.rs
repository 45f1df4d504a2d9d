//! Shared types for the contact store.
//!
//! These types define stable contracts between the store and its callers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single contact record.
///
/// `name` is the only key. Two contacts are the same entry when their names
/// are equal ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }

    /// True if `name` refers to this contact (case-insensitive).
    pub fn matches_name(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }
}

/// Case-insensitive name comparison used for the uniqueness key.
pub fn same_name(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

/// Result of a store operation that did not fail with an I/O error.
///
/// Rejections (`Duplicate`, `InvalidPhone`, `InvalidField`, `NotFound`) are ordinary values,
/// not errors: the store is left untouched (or, for `update`, only the
/// header is refreshed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
    /// A contact with the same name (ignoring case) already exists.
    Duplicate,
    /// The phone number failed validation.
    InvalidPhone,
    /// Name or email cannot be stored in the line format (separator, line
    /// break, or a name read back as a comment).
    InvalidField,
    /// No contact matched the given name.
    NotFound,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Created | Outcome::Updated | Outcome::Deleted)
    }

    /// Human-readable message for the caller to display.
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Created => "contact created",
            Outcome::Updated => "contact updated",
            Outcome::Deleted => "contact deleted",
            Outcome::Duplicate => "contact already exists",
            Outcome::InvalidPhone => "invalid phone format",
            Outcome::InvalidField => "name or email cannot be stored",
            Outcome::NotFound => "contact not found",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
