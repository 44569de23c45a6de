//! Field validation
//!
//! Pure predicate over the current field values deciding whether forward
//! navigation is allowed.

use funnel_record::FieldSet;
use serde::{Deserialize, Serialize};

/// How a page gates navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Every owned field must be non-blank
    #[default]
    RequireAll,
    /// Blank fields are reported but never block navigation
    Advisory,
}

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validation {
    /// Whether navigation is allowed
    pub allowed: bool,
    /// Owned fields that are blank, in declaration order
    pub missing: Vec<String>,
}

impl Validation {
    /// True when no owned field is blank
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Validator for one page's owned fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidator {
    policy: ValidationPolicy,
    required: Vec<String>,
}

impl FieldValidator {
    /// Create validator for the given fields
    pub fn new<I, S>(policy: ValidationPolicy, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            policy,
            required: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Policy in force
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Validate the given values
    ///
    /// Absent fields count as blank. Structured fields are judged on their
    /// formatted string.
    #[must_use]
    pub fn validate(&self, values: &FieldSet) -> Validation {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| values.get(name.as_str()).map_or(true, |field| field.is_blank()))
            .cloned()
            .collect();

        let allowed = match self.policy {
            ValidationPolicy::RequireAll => missing.is_empty(),
            ValidationPolicy::Advisory => true,
        };

        Validation { allowed, missing }
    }
}
