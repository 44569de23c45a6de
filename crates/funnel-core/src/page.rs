//! Page definitions
//!
//! A [`PageSpec`] is everything that varies between funnel pages: which
//! fields the page owns, how validation gates navigation, whether the page
//! creates the Submission, and where its buttons lead.

use crate::validator::{FieldValidator, ValidationPolicy};
use funnel_record::FieldKind;

/// Field owned by a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name (cache entry and record attribute)
    pub name: String,
    /// Kind of value the input produces
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Plain string field
    #[inline]
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar,
        }
    }

    /// Structured (address) field
    #[inline]
    pub fn structured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Structured,
        }
    }
}

/// Role of a page in the Submission lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRole {
    /// Captures the business key and creates the Submission if absent
    Origin,
    /// Requires the business key and an existing Submission
    Continuation,
}

/// Where a page button leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Relative page route
    Route(String),
    /// External checkout with the cached email pre-filled
    PaymentHandoff,
}

impl Step {
    /// Route step
    #[inline]
    pub fn route(path: impl Into<String>) -> Self {
        Self::Route(path.into())
    }
}

/// One funnel page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    /// 1-based page number, used in diagnostics
    pub number: u8,
    /// Human-readable name
    pub name: String,
    /// Lifecycle role
    pub role: PageRole,
    /// Owned fields, in display order
    pub fields: Vec<FieldSpec>,
    /// Validation policy
    pub policy: ValidationPolicy,
    /// Show the required message on every invalid edit
    pub inline_errors: bool,
    /// Message shown when validation blocks a submit
    pub required_message: String,
    /// Forward step
    pub next: Step,
    /// Backward step
    pub back: Option<Step>,
    /// Skip step
    pub skip: Option<Step>,
}

impl PageSpec {
    /// Create a page with no fields that moves forward to `next`
    pub fn new(number: u8, name: impl Into<String>, role: PageRole, next: Step) -> Self {
        Self {
            number,
            name: name.into(),
            role,
            fields: Vec::new(),
            policy: ValidationPolicy::RequireAll,
            inline_errors: false,
            required_message: "Error: All fields are required.".to_string(),
            next,
            back: None,
            skip: None,
        }
    }

    /// Add an owned field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// With validation policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// With the message shown for blocked submits
    #[inline]
    #[must_use]
    pub fn with_required_message(mut self, message: impl Into<String>) -> Self {
        self.required_message = message.into();
        self
    }

    /// Show the required message while editing
    #[inline]
    #[must_use]
    pub fn with_inline_errors(mut self) -> Self {
        self.inline_errors = true;
        self
    }

    /// With backward step
    #[inline]
    #[must_use]
    pub fn with_back(mut self, step: Step) -> Self {
        self.back = Some(step);
        self
    }

    /// With skip step
    #[inline]
    #[must_use]
    pub fn with_skip(mut self, step: Step) -> Self {
        self.skip = Some(step);
        self
    }

    /// Owned field by name
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// True if the page owns `name`
    #[inline]
    #[must_use]
    pub fn owns(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Validator for the owned fields
    #[must_use]
    pub fn validator(&self) -> FieldValidator {
        FieldValidator::new(self.policy, self.fields.iter().map(|field| field.name.clone()))
    }

    /// Diagnostic written when the Submission is missing at submit time
    #[must_use]
    pub fn missing_record_log(&self) -> String {
        format!("ERROR: No existing row found on Page {}.", self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_record::{Field, FieldSet};

    fn contact_page() -> PageSpec {
        PageSpec::new(3, "contact", PageRole::Continuation, Step::route("/next"))
            .with_field(FieldSpec::scalar("email"))
            .with_field(FieldSpec::structured("address"))
            .with_back(Step::route("/prev"))
    }

    #[test]
    fn owns_declared_fields() {
        let page = contact_page();
        assert!(page.owns("email"));
        assert!(!page.owns("firstName"));
        assert_eq!(page.field("address").unwrap().kind, FieldKind::Structured);
        assert_eq!(page.skip, None);
    }

    #[test]
    fn validator_covers_owned_fields() {
        let page = contact_page();
        let mut values = FieldSet::new();
        values.insert("email".into(), Field::scalar("a@b.co"));
        let result = page.validator().validate(&values);
        assert!(!result.allowed);
        assert_eq!(result.missing, vec!["address"]);
    }

    #[test]
    fn missing_record_log_names_page() {
        assert_eq!(
            contact_page().missing_record_log(),
            "ERROR: No existing row found on Page 3."
        );
    }
}
