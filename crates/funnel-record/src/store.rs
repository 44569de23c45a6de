//! Keyed record store contract

use crate::error::StoreError;
use crate::record::{BusinessKey, Record, RecordId};
use std::sync::Arc;

/// Remote record store addressed by business key
///
/// Records are schemaless maps plus the reserved identity and business-key
/// attributes. Implementations must keep at most one record per key.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the record for a business key
    async fn find(&self, key: &BusinessKey) -> Result<Option<Record>, StoreError>;

    /// Insert a new record, returning its assigned identity
    ///
    /// Any identity already present on `record` is ignored.
    async fn insert(&self, record: Record) -> Result<RecordId, StoreError>;

    /// Replace the record with the same identity
    async fn update(&self, record: Record) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn find(&self, key: &BusinessKey) -> Result<Option<Record>, StoreError> {
        (**self).find(key).await
    }

    async fn insert(&self, record: Record) -> Result<RecordId, StoreError> {
        (**self).insert(record).await
    }

    async fn update(&self, record: Record) -> Result<(), StoreError> {
        (**self).update(record).await
    }
}
