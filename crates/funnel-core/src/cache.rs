//! Session-scoped local cache
//!
//! Bridges pages within one wizard session. Values are plain strings;
//! structured fields are stored as JSON. No TTL, no eviction, nothing
//! survives the session.

use dashmap::DashMap;
use funnel_record::{BusinessKey, Field, FieldKind, BUSINESS_KEY_FIELD};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Local cache capability
pub trait LocalCache: Send + Sync + Debug {
    /// Read a cached string
    fn get(&self, name: &str) -> Option<String>;

    /// Write a cached string
    fn set(&self, name: &str, value: String);

    /// Cached field of the given kind, `None` when absent or blank
    fn get_field(&self, name: &str, kind: FieldKind) -> Option<Field> {
        self.get(name)
            .map(|raw| Field::from_cache_string(kind, &raw))
            .filter(|field| !field.is_blank())
    }

    /// Write a field in its cache representation
    fn set_field(&self, name: &str, field: &Field) {
        self.set(name, field.to_cache_string());
    }

    /// Business key recorded by the first page, if any
    fn business_key(&self) -> Option<BusinessKey> {
        self.get(BUSINESS_KEY_FIELD)
            .and_then(|raw| BusinessKey::parse(raw).ok())
    }
}

/// In-process session cache
///
/// Cheap to clone; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    entries: Arc<DashMap<String, String>>,
}

impl SessionCache {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    #[inline]
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Ordered copy of every entry
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl LocalCache for SessionCache {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    fn set(&self, name: &str, value: String) {
        self.entries.insert(name.to_string(), value);
    }
}
