//! Fallback error logging
//!
//! When a submit fails against the store, the failure is recorded on the
//! same Submission: the error-log attribute of an existing record is
//! updated in place, otherwise a minimal record carrying the business key
//! and the message is inserted. Failures here are logged and returned as a
//! status, never raised.

use crate::config::DEFAULT_COLLECTION;
use funnel_record::{BusinessKey, Record, RecordId, RecordStore, StoreError};
use std::sync::Arc;

/// What happened to an error-log write
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorLogStatus {
    /// No logging was needed
    #[default]
    NotAttempted,
    /// Error log set on the existing Submission
    Updated(RecordId),
    /// Minimal Submission inserted to carry the error log
    Inserted(RecordId),
    /// The logging write itself failed
    Failed(StoreError),
}

impl ErrorLogStatus {
    /// True if the message reached the store
    #[inline]
    #[must_use]
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Updated(_) | Self::Inserted(_))
    }
}

/// Writes error messages onto Submissions
#[derive(Clone)]
pub struct ErrorLogger {
    store: Arc<dyn RecordStore>,
    /// Collection name, for diagnostics
    collection: String,
}

impl ErrorLogger {
    /// Create logger over a store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    /// With collection name
    #[inline]
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Record `message` against the Submission for `key`
    ///
    /// Never fails: a store error is logged and reported as
    /// [`ErrorLogStatus::Failed`].
    pub async fn record(&self, key: &BusinessKey, message: &str) -> ErrorLogStatus {
        match self.write(key, message).await {
            Ok(status) => {
                tracing::info!(business_key = %key, collection = %self.collection, ?status, "error logged");
                status
            }
            Err(e) => {
                tracing::error!(
                    business_key = %key,
                    collection = %self.collection,
                    error = %e,
                    "failed to log error in store"
                );
                ErrorLogStatus::Failed(e)
            }
        }
    }

    async fn write(&self, key: &BusinessKey, message: &str) -> Result<ErrorLogStatus, StoreError> {
        match self.store.find(key).await? {
            Some(existing) => {
                let id = existing.id.ok_or(StoreError::MissingIdentity)?;
                self.store.update(existing.with_error_log(message)).await?;
                Ok(ErrorLogStatus::Updated(id))
            }
            None => {
                let record = Record::new(key.clone()).with_error_log(message);
                let id = self.store.insert(record).await?;
                Ok(ErrorLogStatus::Inserted(id))
            }
        }
    }
}

impl std::fmt::Debug for ErrorLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLogger")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}
