//! Funnel Core
//!
//! Page controllers for a multi-step signup funnel. Each page keeps a
//! session-scoped cache and a remote Submission record in step:
//! 1. **Load**: cache first, store for the gaps, view populated
//! 2. **Edit**: write-through to the cache, re-validate, gate navigation
//! 3. **Submit**: upsert-merge the owned fields, log failures on the record
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use funnel_core::prelude::*;
//!
//! let session = WizardSession::new(
//!     Arc::new(SessionCache::new()),
//!     Arc::new(InMemoryRecordStore::new()),
//!     FunnelConfig::default(),
//! );
//! let plan = FunnelPlan::standard(session.config());
//! let controller = session.controller(plan.pages()[0].clone(), view, navigator);
//!
//! controller.load().await?;
//! controller.on_field_change(FieldChange::new("trustName", "Smith Family Trust"));
//! let outcome = controller.next().await;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Page lifecycle
pub mod cache;
pub mod controller;
pub mod error_logger;
pub mod session;
pub mod validator;

// Page definitions and capabilities
pub mod config;
pub mod error;
pub mod navigation;
pub mod page;
pub mod pages;
pub mod view;

// Test harness
pub mod harness;

// Re-exports
pub use cache::{LocalCache, SessionCache};
pub use config::{FunnelConfig, RouteTable};
pub use controller::{LoadReport, PageController, Persisted, RemoteLookup, SubmitOutcome};
pub use error::{ConfigError, NavigationError, PageError, CONSISTENCY_MESSAGE};
pub use error_logger::{ErrorLogStatus, ErrorLogger};
pub use navigation::{Destination, Navigator};
pub use page::{FieldSpec, PageRole, PageSpec, Step};
pub use pages::FunnelPlan;
pub use session::{KeyGuard, SessionId, WizardSession};
pub use validator::{FieldValidator, Validation, ValidationPolicy};
pub use view::{Control, FieldChange, PageView};

/// Common imports for embedding the funnel
pub mod prelude {
    pub use crate::cache::{LocalCache, SessionCache};
    pub use crate::config::FunnelConfig;
    pub use crate::controller::{PageController, SubmitOutcome};
    pub use crate::error::PageError;
    pub use crate::navigation::{Destination, Navigator};
    pub use crate::pages::FunnelPlan;
    pub use crate::session::WizardSession;
    pub use crate::view::{Control, FieldChange, PageView};
    pub use funnel_record::{
        BusinessKey, Field, InMemoryRecordStore, Record, RecordStore, StructuredValue,
    };
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::harness::{HeadlessView, RecordingNavigator};
    use super::prelude::*;
    use std::time::Duration;

    #[tokio::test]
    async fn back_navigation_also_saves() {
        let store = Arc::new(InMemoryRecordStore::new());
        let session = WizardSession::new(
            Arc::new(SessionCache::new()),
            store.clone(),
            FunnelConfig::new().with_settle_delay(Duration::ZERO),
        );
        let plan = FunnelPlan::standard(session.config());
        let navigator = Arc::new(RecordingNavigator::new());

        let view = Arc::new(HeadlessView::new());
        let first = session.controller(plan.pages()[0].clone(), view.clone(), navigator.clone());
        first.load().await.unwrap();
        first.on_field_change(view.type_value("trustName", "Harbour Trust"));
        assert!(first.next().await.is_navigated());

        let view = Arc::new(HeadlessView::new());
        let second = session.controller(plan.pages()[1].clone(), view.clone(), navigator.clone());
        second.load().await.unwrap();
        second.on_field_change(view.type_value("firstName", "Ada"));
        second.on_field_change(view.type_value("lastName", "Lovelace"));
        assert!(second.back().await.is_navigated());

        assert_eq!(navigator.last(), Some(Destination::route("/signup-Zba")));
        let key = BusinessKey::parse("Harbour Trust").unwrap();
        let stored = store.find(&key).await.unwrap().unwrap();
        assert_eq!(stored.field("lastName"), Some(&Field::scalar("Lovelace")));
        assert_eq!(store.len(), 1);
    }
}
