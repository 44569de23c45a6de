//! Funnel Record System
//!
//! Submission records collected by the funnel wizard and the keyed store
//! they live in.
//!
//! # Core Concepts
//!
//! - [`Field`]: Tagged field value (plain scalar or structured address)
//! - [`Record`]: A Submission: business key, owned fields, error log
//! - [`BusinessKey`]: Unique caller-chosen key ("trust name")
//! - [`RecordStore`]: Async keyed-record contract (find / insert / update)
//! - [`InMemoryRecordStore`]: Reference store enforcing key uniqueness
//!
//! # Example
//!
//! ```rust,ignore
//! use funnel_record::{BusinessKey, Field, InMemoryRecordStore, Record, RecordStore};
//!
//! let store = InMemoryRecordStore::new();
//! let key = BusinessKey::parse("Smith Family Trust")?;
//! let id = store.insert(Record::new(key.clone())).await?;
//!
//! let existing = store.find(&key).await?.unwrap();
//! let mut owned = funnel_record::FieldSet::new();
//! owned.insert("firstName".into(), Field::scalar("Ada"));
//! store.update(existing.merged(&owned)).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod field;
mod memory;
mod record;
mod store;

pub use error::{RecordError, StoreError};
pub use field::{Field, FieldKind, StructuredValue};
pub use memory::InMemoryRecordStore;
pub use record::{
    is_reserved, BusinessKey, FieldSet, Record, RecordId, BUSINESS_KEY_FIELD, ERROR_LOG_FIELD,
    ID_FIELD,
};
pub use store::RecordStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn page_sequence_accumulates_fields() {
        let store = InMemoryRecordStore::new();
        let key = BusinessKey::parse("Harbour Trust").unwrap();

        store.insert(Record::new(key.clone())).await.unwrap();

        let mut names = FieldSet::new();
        names.insert("firstName".into(), Field::scalar("Ada"));
        names.insert("lastName".into(), Field::scalar("Lovelace"));
        let existing = store.find(&key).await.unwrap().unwrap();
        store.update(existing.merged(&names)).await.unwrap();

        let mut contact = FieldSet::new();
        contact.insert("email".into(), Field::scalar("ada@example.com"));
        let existing = store.find(&key).await.unwrap().unwrap();
        store.update(existing.merged(&contact)).await.unwrap();

        let stored = store.find(&key).await.unwrap().unwrap();
        assert_eq!(stored.fields.len(), 3);
        assert_eq!(stored.business_key, key);
        assert_eq!(store.len(), 1);
    }
}
