//! Error types for records and record stores

use crate::record::{BusinessKey, RecordId};

/// Errors building or decoding records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Business key was empty after trimming
    #[error("business key must not be empty")]
    EmptyBusinessKey,

    /// Field name collides with a reserved record attribute
    #[error("field name is reserved: '{0}'")]
    ReservedField(String),

    /// Serialized record could not be decoded
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Errors raised by a [`RecordStore`](crate::RecordStore)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A record with the same business key already exists
    #[error("duplicate business key: '{0}'")]
    DuplicateKey(BusinessKey),

    /// Update targeted an identity the store does not know
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// Update was issued for a record without identity
    #[error("record has no identity")]
    MissingIdentity,

    /// Store refused the record for any other reason
    #[error("store rejected record: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Create an unavailable error from any message
    #[inline]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Check if retrying the same call can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Check if the error is a constraint violation
    #[inline]
    #[must_use]
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKey(_) | Self::NotFound(_) | Self::MissingIdentity | Self::Rejected(_)
        )
    }
}
