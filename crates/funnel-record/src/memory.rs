//! In-memory record store
//!
//! Reference [`RecordStore`] used by the simulator and the test suites.
//! Enforces the one-record-per-key invariant.

use crate::error::StoreError;
use crate::record::{BusinessKey, Record, RecordId};
use crate::store::RecordStore;
use dashmap::DashMap;
use parking_lot::Mutex;

/// Record store backed by concurrent maps
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    /// Records by identity
    records: DashMap<RecordId, Record>,
    /// Identity by business key
    by_key: DashMap<BusinessKey, RecordId>,
    /// Serializes writers so both maps change together
    writer: Mutex<()>,
}

impl InMemoryRecordStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the store holds no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fetch a record by identity
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    /// Snapshot of every record, ordered by business key
    #[must_use]
    pub fn snapshot(&self) -> Vec<Record> {
        let mut records: Vec<Record> = self.records.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| a.business_key.cmp(&b.business_key));
        records
    }

    fn find_sync(&self, key: &BusinessKey) -> Option<Record> {
        let id = *self.by_key.get(key)?.value();
        self.get(id)
    }

    fn insert_sync(&self, mut record: Record) -> Result<RecordId, StoreError> {
        let _writer = self.writer.lock();

        if self.by_key.contains_key(&record.business_key) {
            return Err(StoreError::DuplicateKey(record.business_key));
        }

        let id = RecordId::new();
        record.id = Some(id);
        self.by_key.insert(record.business_key.clone(), id);
        self.records.insert(id, record);

        tracing::debug!(%id, "record inserted");
        Ok(id)
    }

    fn update_sync(&self, record: Record) -> Result<(), StoreError> {
        let id = record.id.ok_or(StoreError::MissingIdentity)?;
        let _writer = self.writer.lock();

        let previous_key = self
            .records
            .get(&id)
            .map(|entry| entry.value().business_key.clone())
            .ok_or(StoreError::NotFound(id))?;

        if previous_key != record.business_key {
            let taken = self
                .by_key
                .get(&record.business_key)
                .is_some_and(|owner| *owner.value() != id);
            if taken {
                return Err(StoreError::DuplicateKey(record.business_key));
            }
            self.by_key.remove(&previous_key);
            self.by_key.insert(record.business_key.clone(), id);
        }

        self.records.insert(id, record);
        tracing::debug!(%id, "record updated");
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find(&self, key: &BusinessKey) -> Result<Option<Record>, StoreError> {
        Ok(self.find_sync(key))
    }

    async fn insert(&self, record: Record) -> Result<RecordId, StoreError> {
        self.insert_sync(record)
    }

    async fn update(&self, record: Record) -> Result<(), StoreError> {
        self.update_sync(record)
    }
}
