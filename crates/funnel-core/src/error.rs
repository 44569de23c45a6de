//! Error types for funnel pages
//!
//! Provides error handling for:
//! - Missing prior-step state (business key not cached)
//! - Validation failures that block navigation
//! - Consistency faults (expected Submission absent)
//! - Store failures caught at the controller boundary
//! - Configuration and navigation target errors

use funnel_record::{BusinessKey, StoreError};
use std::path::PathBuf;

/// Message shown when a continuation page finds no Submission
pub const CONSISTENCY_MESSAGE: &str = "Error: Data inconsistency detected. Please restart the process.";

/// Main page error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum PageError {
    /// Required prior-step state is absent from the session cache
    #[error("precondition missing: '{0}' not in session cache")]
    PreconditionMissing(String),

    /// Current field values do not satisfy the page rule
    #[error("validation failed on page {page}: missing {missing:?}")]
    ValidationFailed {
        /// Page number
        page: u8,
        /// Owned fields that are blank
        missing: Vec<String>,
        /// User-facing message
        message: String,
    },

    /// Expected Submission absent at submit time
    #[error("no existing record for '{key}' on page {page}")]
    ConsistencyFault {
        /// Page number
        page: u8,
        /// Business key that was looked up
        key: BusinessKey,
    },

    /// Remote store call failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Navigation target could not be built
    #[error("navigation error: {0}")]
    Navigation(#[from] NavigationError),
}

impl PageError {
    /// Message to show the user for this error
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PreconditionMissing(_) => {
                "Error: Trust Name missing. Please start again from the first page.".to_string()
            }
            Self::ValidationFailed { message, .. } => message.clone(),
            Self::ConsistencyFault { .. } => CONSISTENCY_MESSAGE.to_string(),
            Self::Store(e) => database_message(e),
            Self::Navigation(e) => format!("Error: {e}"),
        }
    }

    /// Check if the user may retry the same action
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. } | Self::Store(_))
    }

    /// Check if the session must restart from the first page
    #[inline]
    #[must_use]
    pub fn requires_restart(&self) -> bool {
        matches!(
            self,
            Self::PreconditionMissing(_) | Self::ConsistencyFault { .. }
        )
    }
}

/// Diagnostic text for a failed store call, shown and logged
#[inline]
#[must_use]
pub fn database_message(error: &StoreError) -> String {
    format!("Database error: {error}")
}

/// Navigation target errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum NavigationError {
    /// External URL failed to parse
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        /// Offending input
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// Page has no such step
    #[error("page {page} has no {step} step")]
    NoSuchStep {
        /// Page number
        page: u8,
        /// Step name
        step: &'static str,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds unusable values
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_message_is_prefixed() {
        let err = PageError::from(StoreError::unavailable("timeout"));
        assert_eq!(
            err.user_message(),
            "Database error: store unavailable: timeout"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn consistency_fault_requires_restart() {
        let err = PageError::ConsistencyFault {
            page: 3,
            key: BusinessKey::parse("Trust").unwrap(),
        };
        assert!(err.requires_restart());
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), CONSISTENCY_MESSAGE);
    }

    #[test]
    fn validation_message_passthrough() {
        let err = PageError::ValidationFailed {
            page: 2,
            missing: vec!["lastName".into()],
            message: "Error: Both First Name and Last Name are required.".into(),
        };
        assert!(err.to_string().contains("lastName"));
        assert_eq!(
            err.user_message(),
            "Error: Both First Name and Last Name are required."
        );
    }
}
