//! Testing utilities for the funnel workspace
//!
//! Shared fixtures for driving page controllers headlessly.

#![allow(missing_docs)]

use funnel_core::harness::{FaultyStore, HeadlessView, RecordingNavigator};
use funnel_core::{FunnelConfig, FunnelPlan, LocalCache, PageController, SessionCache, WizardSession};
use funnel_record::{BusinessKey, Field, InMemoryRecordStore, Record, RecordId, RecordStore, BUSINESS_KEY_FIELD};
use std::sync::Arc;
use std::time::Duration;

pub use funnel_core::harness::StoreCall;

/// Configuration with no settle delay
pub fn test_config() -> FunnelConfig {
    FunnelConfig::new().with_settle_delay(Duration::ZERO)
}

pub fn key(raw: &str) -> BusinessKey {
    BusinessKey::parse(raw).unwrap()
}

/// Store that can be told to fail
pub fn faulty_store() -> Arc<FaultyStore> {
    Arc::new(FaultyStore::new(InMemoryRecordStore::new()))
}

/// Insert a Submission with the given fields, returning its identity
pub async fn seed_record<S: RecordStore + ?Sized>(
    store: &S,
    trust_name: &str,
    fields: &[(&str, Field)],
) -> RecordId {
    let mut record = Record::new(key(trust_name));
    for (name, value) in fields {
        record = record.with_field(*name, value.clone()).unwrap();
    }
    store.insert(record).await.unwrap()
}

/// One wizard session wired to headless doubles
pub struct Harness {
    pub session: Arc<WizardSession>,
    pub cache: SessionCache,
    pub store: Arc<FaultyStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub plan: FunnelPlan,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(faulty_store())
    }

    pub fn with_store(store: Arc<FaultyStore>) -> Self {
        let config = test_config();
        let cache = SessionCache::new();
        let session = WizardSession::new(Arc::new(cache.clone()), store.clone(), config.clone());
        Self {
            session,
            cache,
            store,
            navigator: Arc::new(RecordingNavigator::new()),
            plan: FunnelPlan::standard(&config),
        }
    }

    /// Session where page 1 already cached `trust_name`
    pub fn after_first_page(trust_name: &str) -> Self {
        let harness = Self::new();
        harness.cache.set(BUSINESS_KEY_FIELD, trust_name.to_string());
        harness
    }

    /// Controller and view for a page, by 1-based number
    pub fn page(&self, number: u8) -> (PageController, Arc<HeadlessView>) {
        let spec = self.plan.page(number).unwrap().clone();
        let view = Arc::new(HeadlessView::new());
        let controller = self.session.controller(spec, view.clone(), self.navigator.clone());
        (controller, view)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
