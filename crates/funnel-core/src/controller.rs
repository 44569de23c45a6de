//! Page controller
//!
//! Drives one funnel page through its lifecycle:
//! 1. **Load**: resolve owned fields from the session cache, fill gaps from
//!    the Submission in the store, write fills back to the cache, populate
//!    the view and set the initial navigation state
//! 2. **Edit**: write each change through to the cache and re-validate
//! 3. **Submit**: validate, cache, upsert-merge into the Submission under
//!    the per-key lock, then navigate; failures are shown to the user and
//!    recorded on the Submission through the [`ErrorLogger`]
//!
//! # Ordering
//!
//! The cache write of a submit completes before any store call, and the
//! store write (with any error handling) completes before navigation. The
//! per-key lock covers the store write and the error-log write, not the
//! settle delay.

use crate::error::{database_message, NavigationError, PageError, CONSISTENCY_MESSAGE};
use crate::error_logger::{ErrorLogStatus, ErrorLogger};
use crate::navigation::{Destination, Navigator};
use crate::page::{PageRole, PageSpec, Step};
use crate::session::WizardSession;
use crate::validator::{FieldValidator, Validation};
use crate::view::{Control, FieldChange, PageView};
use funnel_record::{
    is_reserved, BusinessKey, Field, FieldSet, Record, RecordId, StoreError, BUSINESS_KEY_FIELD,
};
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Outcome of the remote lookup during load
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemoteLookup {
    /// Every owned field came from the cache (or the page never reads the store)
    #[default]
    Skipped,
    /// Submission found
    Found(RecordId),
    /// No Submission exists for the business key
    NoRecord,
    /// The lookup failed; the page continued from the cache
    Failed(StoreError),
}

/// Result of loading a page
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Business key in effect, if any
    pub business_key: Option<BusinessKey>,
    /// Fields resolved from the session cache
    pub from_cache: Vec<String>,
    /// Fields filled from the Submission (and written back to the cache)
    pub from_remote: Vec<String>,
    /// What the remote lookup found
    pub remote: RemoteLookup,
    /// Initial validation state
    pub validation: Validation,
}

/// How a successful submit persisted the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    /// Existing Submission updated
    Updated(RecordId),
    /// New Submission inserted (first page only)
    Inserted(RecordId),
}

impl Persisted {
    /// Identity of the written Submission
    #[inline]
    #[must_use]
    pub fn record_id(self) -> RecordId {
        match self {
            Self::Updated(id) | Self::Inserted(id) => id,
        }
    }
}

/// Result of a submit
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Fields persisted and navigation invoked
    Navigated {
        /// Where the user was sent
        destination: Destination,
        /// How the Submission was written
        persisted: Persisted,
    },
    /// Navigation withheld
    Aborted {
        /// Why the submit stopped
        error: PageError,
        /// What happened to the error-log write
        error_log: ErrorLogStatus,
    },
}

impl SubmitOutcome {
    /// True if navigation was invoked
    #[inline]
    #[must_use]
    pub fn is_navigated(&self) -> bool {
        matches!(self, Self::Navigated { .. })
    }

    /// Error that aborted the submit, if any
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&PageError> {
        match self {
            Self::Navigated { .. } => None,
            Self::Aborted { error, .. } => Some(error),
        }
    }

    fn aborted(error: PageError) -> Self {
        Self::Aborted {
            error,
            error_log: ErrorLogStatus::NotAttempted,
        }
    }
}

/// Intermediate result of the store write
enum Written {
    Done(Persisted),
    /// Continuation page found no Submission; diagnostic record inserted
    MissingRecord(RecordId),
}

/// Controller for one page of a wizard session
pub struct PageController {
    session: Arc<WizardSession>,
    page: PageSpec,
    view: Arc<dyn PageView>,
    navigator: Arc<dyn Navigator>,
    validator: FieldValidator,
    logger: ErrorLogger,
}

impl PageController {
    /// Create controller
    #[must_use]
    pub fn new(
        session: Arc<WizardSession>,
        page: PageSpec,
        view: Arc<dyn PageView>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let validator = page.validator();
        let logger = ErrorLogger::new(Arc::clone(session.store()))
            .with_collection(&session.config().collection);
        Self {
            session,
            page,
            view,
            navigator,
            validator,
            logger,
        }
    }

    /// Page being controlled
    #[inline]
    #[must_use]
    pub fn page(&self) -> &PageSpec {
        &self.page
    }

    /// Initialize the page
    ///
    /// # Errors
    /// Returns [`PageError::PreconditionMissing`] when a continuation page
    /// runs without a cached business key. Nothing else is touched in that
    /// case: no store call, no view update, no navigation.
    pub async fn load(&self) -> Result<LoadReport, PageError> {
        let business_key = match self.page.role {
            PageRole::Origin => self.session.business_key(),
            PageRole::Continuation => Some(self.require_business_key()?),
        };

        tracing::info!(
            page = self.page.number,
            business_key = ?business_key.as_ref().map(BusinessKey::as_str),
            "page loaded"
        );

        self.view.disable(Control::Next);
        self.view.hide_error();

        let mut report = LoadReport {
            business_key: business_key.clone(),
            ..LoadReport::default()
        };

        let cache = self.session.cache();
        let mut resolved = FieldSet::new();
        let mut gaps = Vec::new();
        for spec in &self.page.fields {
            match cache.get_field(&spec.name, spec.kind) {
                Some(field) => {
                    report.from_cache.push(spec.name.clone());
                    resolved.insert(spec.name.clone(), field);
                }
                None => gaps.push(spec),
            }
        }

        if let (PageRole::Continuation, Some(key), false) =
            (self.page.role, business_key.as_ref(), gaps.is_empty())
        {
            match self.session.store().find(key).await {
                Ok(Some(record)) => {
                    for spec in gaps {
                        let Some(field) = record.non_blank_field(&spec.name) else {
                            continue;
                        };
                        let field = field.clone().into_kind(spec.kind).canonicalized();
                        tracing::debug!(field = %spec.name, "filled from existing record");
                        cache.set_field(&spec.name, &field);
                        report.from_remote.push(spec.name.clone());
                        resolved.insert(spec.name.clone(), field);
                    }
                    report.remote = record.id.map_or(RemoteLookup::NoRecord, RemoteLookup::Found);
                }
                Ok(None) => {
                    tracing::warn!(page = self.page.number, business_key = %key, "no existing record");
                    report.remote = RemoteLookup::NoRecord;
                }
                Err(e) => {
                    tracing::error!(
                        page = self.page.number,
                        collection = %self.session.config().collection,
                        error = %e,
                        "record lookup failed"
                    );
                    report.remote = RemoteLookup::Failed(e);
                }
            }
        }

        for spec in &self.page.fields {
            let value = resolved
                .remove(&spec.name)
                .unwrap_or_else(|| Field::empty(spec.kind));
            self.view.set_value(&spec.name, value);
        }

        report.validation = self.refresh_navigation();
        Ok(report)
    }

    /// Handle a user edit
    ///
    /// Writes the canonical value through to the cache and re-validates.
    /// Never calls the store.
    pub fn on_field_change(&self, change: FieldChange) -> Validation {
        let Some(spec) = self.page.field(&change.field) else {
            tracing::debug!(field = %change.field, "ignoring change to unowned field");
            return self.validator.validate(&self.current_values());
        };

        let value = change.value.into_kind(spec.kind).canonicalized();
        self.session.cache().set_field(&spec.name, &value);

        let mut values = self.current_values();
        values.insert(spec.name.clone(), value);
        let validation = self.validator.validate(&values);
        self.apply_validation(&validation);

        if self.page.inline_errors {
            if validation.allowed {
                self.view.hide_error();
            } else {
                self.view.show_error(&self.page.required_message);
            }
        }
        validation
    }

    /// Consume a stream of edits, returning the last validation state
    pub async fn drive<S>(&self, mut changes: S) -> Validation
    where
        S: Stream<Item = FieldChange> + Unpin,
    {
        let mut last = None;
        while let Some(change) = changes.next().await {
            last = Some(self.on_field_change(change));
        }
        last.unwrap_or_else(|| self.validator.validate(&self.current_values()))
    }

    /// Submit via the page's forward step
    pub async fn next(&self) -> SubmitOutcome {
        let step = self.page.next.clone();
        self.follow(&step).await
    }

    /// Submit via the page's backward step
    pub async fn back(&self) -> SubmitOutcome {
        match self.page.back.clone() {
            Some(step) => self.follow(&step).await,
            None => self.missing_step("back"),
        }
    }

    /// Submit via the page's skip step
    pub async fn skip(&self) -> SubmitOutcome {
        match self.page.skip.clone() {
            Some(step) => self.follow(&step).await,
            None => self.missing_step("skip"),
        }
    }

    /// Resolve `step` and submit towards it
    pub async fn follow(&self, step: &Step) -> SubmitOutcome {
        match self.resolve(step) {
            Ok(destination) => self.submit_and_navigate(destination).await,
            Err(e) => {
                tracing::error!(page = self.page.number, error = %e, "cannot resolve destination");
                let error = PageError::from(e);
                self.view.show_error(&error.user_message());
                SubmitOutcome::aborted(error)
            }
        }
    }

    /// Persist the owned fields and navigate to `destination`
    ///
    /// Never returns an error: every failure is shown to the user, recorded
    /// where possible, and reported in the outcome with navigation withheld.
    pub async fn submit_and_navigate(&self, destination: Destination) -> SubmitOutcome {
        let values = self.current_values();
        let validation = self.validator.validate(&values);
        if !validation.allowed {
            tracing::warn!(page = self.page.number, missing = ?validation.missing, "submit blocked");
            self.view.show_error(&self.page.required_message);
            return SubmitOutcome::aborted(PageError::ValidationFailed {
                page: self.page.number,
                missing: validation.missing,
                message: self.page.required_message.clone(),
            });
        }

        let key = match self.submit_key(&values) {
            Ok(key) => key,
            Err(error) => {
                self.view.show_error(&error.user_message());
                return SubmitOutcome::aborted(error);
            }
        };

        let cache = self.session.cache();
        for (name, value) in &values {
            cache.set_field(name, value);
        }
        tracing::info!(page = self.page.number, business_key = %key, "saving page");

        let written = {
            let _guard = self.session.lock_key(&key).await;
            match self.write(&key, &values).await {
                Ok(written) => Ok(written),
                Err(e) => {
                    let message = database_message(&e);
                    tracing::error!(
                        page = self.page.number,
                        business_key = %key,
                        collection = %self.session.config().collection,
                        error = %e,
                        "submit failed"
                    );
                    self.view.show_error(&message);
                    let error_log = self.logger.record(&key, &message).await;
                    Err((e, error_log))
                }
            }
        };

        match written {
            Ok(Written::Done(persisted)) => {
                tracing::info!(page = self.page.number, %destination, ?persisted, "data saved");
                tokio::time::sleep(self.session.config().settle_delay()).await;
                self.view.hide_error();
                self.navigator.go_to(&destination);
                SubmitOutcome::Navigated {
                    destination,
                    persisted,
                }
            }
            Ok(Written::MissingRecord(id)) => SubmitOutcome::Aborted {
                error: PageError::ConsistencyFault {
                    page: self.page.number,
                    key,
                },
                error_log: ErrorLogStatus::Inserted(id),
            },
            Err((e, error_log)) => SubmitOutcome::Aborted {
                error: PageError::Store(e),
                error_log,
            },
        }
    }

    /// Read-merge-write against the store; caller holds the key lock
    async fn write(&self, key: &BusinessKey, values: &FieldSet) -> Result<Written, StoreError> {
        let store = self.session.store();
        let owned: FieldSet = values
            .iter()
            .filter(|(name, _)| !is_reserved(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        match (store.find(key).await?, self.page.role) {
            (Some(existing), _) => {
                let id = existing.id.ok_or(StoreError::MissingIdentity)?;
                tracing::debug!(%id, "updating existing record");
                store.update(existing.merged(&owned)).await?;
                Ok(Written::Done(Persisted::Updated(id)))
            }
            (None, PageRole::Origin) => {
                tracing::debug!(business_key = %key, "creating new record");
                let mut record = Record::new(key.clone());
                record.fields = owned;
                let id = store.insert(record).await?;
                Ok(Written::Done(Persisted::Inserted(id)))
            }
            (None, PageRole::Continuation) => {
                tracing::error!(
                    page = self.page.number,
                    business_key = %key,
                    collection = %self.session.config().collection,
                    "no existing record found"
                );
                self.view.show_error(CONSISTENCY_MESSAGE);
                let record = Record::new(key.clone()).with_error_log(self.page.missing_record_log());
                let id = store.insert(record).await?;
                Ok(Written::MissingRecord(id))
            }
        }
    }

    /// Business key a submit writes under
    fn submit_key(&self, values: &FieldSet) -> Result<BusinessKey, PageError> {
        match self.page.role {
            PageRole::Origin => {
                let raw = values.get(BUSINESS_KEY_FIELD).map_or("", Field::canonical);
                BusinessKey::parse(raw).map_err(|_| PageError::ValidationFailed {
                    page: self.page.number,
                    missing: vec![BUSINESS_KEY_FIELD.to_string()],
                    message: self.page.required_message.clone(),
                })
            }
            PageRole::Continuation => self.require_business_key(),
        }
    }

    fn require_business_key(&self) -> Result<BusinessKey, PageError> {
        self.session.business_key().ok_or_else(|| {
            tracing::error!(page = self.page.number, "trust name missing from session cache");
            PageError::PreconditionMissing(BUSINESS_KEY_FIELD.to_string())
        })
    }

    /// Canonical values of the owned fields as the view currently shows them
    fn current_values(&self) -> FieldSet {
        self.page
            .fields
            .iter()
            .map(|spec| {
                let value = self
                    .view
                    .value(&spec.name)
                    .map_or_else(|| Field::empty(spec.kind), |v| v.into_kind(spec.kind))
                    .canonicalized();
                (spec.name.clone(), value)
            })
            .collect()
    }

    fn refresh_navigation(&self) -> Validation {
        let validation = self.validator.validate(&self.current_values());
        self.apply_validation(&validation);
        validation
    }

    fn apply_validation(&self, validation: &Validation) {
        self.view.set_enabled(Control::Next, validation.allowed);
    }

    fn resolve(&self, step: &Step) -> Result<Destination, NavigationError> {
        match step {
            Step::Route(path) => Ok(Destination::route(path.clone())),
            Step::PaymentHandoff => {
                let email = self.session.cache().get("email").filter(|e| !e.trim().is_empty());
                if email.is_none() {
                    tracing::warn!(page = self.page.number, "no email cached; checkout will not be prefilled");
                }
                Destination::payment_handoff(&self.session.config().payment_url, email.as_deref())
            }
        }
    }

    fn missing_step(&self, step: &'static str) -> SubmitOutcome {
        SubmitOutcome::aborted(PageError::Navigation(NavigationError::NoSuchStep {
            page: self.page.number,
            step,
        }))
    }
}

impl std::fmt::Debug for PageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("session", &self.session.id())
            .field("page", &self.page.number)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{LocalCache, SessionCache};
    use crate::config::FunnelConfig;
    use crate::harness::{FaultyStore, HeadlessView, RecordingNavigator};
    use crate::pages::{contact_details_page, primary_contact_page, trust_name_page};
    use funnel_record::{InMemoryRecordStore, RecordStore, StructuredValue};

    struct Fixture {
        session: Arc<WizardSession>,
        store: Arc<FaultyStore>,
        view: Arc<HeadlessView>,
        navigator: Arc<RecordingNavigator>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(FaultyStore::new(InMemoryRecordStore::new()));
            let session = WizardSession::new(
                Arc::new(SessionCache::new()),
                store.clone(),
                FunnelConfig::new().with_settle_delay(std::time::Duration::ZERO),
            );
            Self {
                session,
                store,
                view: Arc::new(HeadlessView::new()),
                navigator: Arc::new(RecordingNavigator::new()),
            }
        }

        fn controller(&self, page: PageSpec) -> PageController {
            self.session
                .controller(page, self.view.clone(), self.navigator.clone())
        }

        async fn seed(&self, key: &str) -> RecordId {
            self.session.cache().set(BUSINESS_KEY_FIELD, key.into());
            self.store
                .insert(Record::new(BusinessKey::parse(key).unwrap()))
                .await
                .unwrap()
        }
    }

    fn routes() -> crate::config::RouteTable {
        crate::config::RouteTable::default()
    }

    #[tokio::test]
    async fn continuation_load_without_key_touches_nothing() {
        let fx = Fixture::new();
        let controller = fx.controller(primary_contact_page(&routes()));

        let err = controller.load().await.unwrap_err();
        assert!(matches!(err, PageError::PreconditionMissing(_)));
        assert_eq!(fx.store.call_count(), 0);
        assert!(fx.view.snapshot().values.is_empty());
        assert!(fx.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn origin_load_reads_cache_only() {
        let fx = Fixture::new();
        fx.session.cache().set(BUSINESS_KEY_FIELD, "Acme Trust".into());
        let controller = fx.controller(trust_name_page(&routes()));

        let report = controller.load().await.unwrap();
        assert_eq!(report.remote, RemoteLookup::Skipped);
        assert_eq!(report.from_cache, vec![BUSINESS_KEY_FIELD]);
        assert!(report.validation.allowed);
        assert_eq!(fx.view.is_enabled(Control::Next), Some(true));
        assert_eq!(fx.store.call_count(), 0);
    }

    #[tokio::test]
    async fn load_fills_structured_gap_from_record() {
        let fx = Fixture::new();
        let id = fx.seed("Acme Trust").await;
        let address = StructuredValue::new("1 Queen St").with_component("city", "Auckland");
        let record = fx
            .store
            .inner()
            .get(id)
            .unwrap()
            .with_field("address", address.clone().into())
            .unwrap();
        fx.store.update(record).await.unwrap();
        fx.session.cache().set("email", "ada@example.com".into());

        let controller = fx.controller(contact_details_page(&routes()));
        let report = controller.load().await.unwrap();

        assert_eq!(report.remote, RemoteLookup::Found(id));
        assert_eq!(report.from_remote, vec!["address"]);
        assert_eq!(fx.view.value("address"), Some(Field::from(address.clone())));
        assert_eq!(
            fx.session.cache().get_field("address", funnel_record::FieldKind::Structured),
            Some(Field::from(address))
        );
        assert!(report.validation.allowed);
    }

    #[tokio::test]
    async fn load_survives_lookup_failure() {
        let fx = Fixture::new();
        fx.seed("Acme Trust").await;
        fx.session.cache().set("firstName", "Ada".into());
        fx.store.fail_next_finds(1);

        let controller = fx.controller(primary_contact_page(&routes()));
        let report = controller.load().await.unwrap();

        assert!(matches!(report.remote, RemoteLookup::Failed(_)));
        assert_eq!(fx.view.value("firstName"), Some(Field::scalar("Ada")));
        assert_eq!(fx.view.is_enabled(Control::Next), Some(false));
    }

    #[tokio::test]
    async fn origin_inline_errors_follow_edits() {
        let fx = Fixture::new();
        let controller = fx.controller(trust_name_page(&routes()));
        controller.load().await.unwrap();

        let validation = controller.on_field_change(fx.view.type_value(BUSINESS_KEY_FIELD, "   "));
        assert!(!validation.allowed);
        assert_eq!(
            fx.view.error_message().as_deref(),
            Some("Error: Trust Name is required.")
        );

        let validation = controller.on_field_change(fx.view.type_value(BUSINESS_KEY_FIELD, " Acme "));
        assert!(validation.allowed);
        assert_eq!(fx.view.error_message(), None);
        assert_eq!(fx.session.cache().get(BUSINESS_KEY_FIELD).as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn unowned_change_is_ignored() {
        let fx = Fixture::new();
        fx.seed("Acme Trust").await;
        let controller = fx.controller(primary_contact_page(&routes()));
        controller.load().await.unwrap();

        controller.on_field_change(FieldChange::new("email", "x@y.z"));
        assert_eq!(fx.session.cache().get("email"), None);
    }

    #[tokio::test]
    async fn origin_updates_existing_record_preserving_fields() {
        let fx = Fixture::new();
        let id = fx.seed("Acme Trust").await;
        let record = fx
            .store
            .inner()
            .get(id)
            .unwrap()
            .with_field("firstName", Field::scalar("Ada"))
            .unwrap();
        fx.store.update(record).await.unwrap();

        let controller = fx.controller(trust_name_page(&routes()));
        controller.load().await.unwrap();
        let outcome = controller.next().await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Navigated { persisted: Persisted::Updated(found), .. } if found == id
        ));
        let stored = fx.store.inner().get(id).unwrap();
        assert_eq!(stored.field("firstName"), Some(&Field::scalar("Ada")));
    }

    #[tokio::test]
    async fn missing_back_step_is_reported() {
        let fx = Fixture::new();
        let controller = fx.controller(trust_name_page(&routes()));
        let outcome = controller.back().await;
        assert!(matches!(
            outcome.error(),
            Some(PageError::Navigation(NavigationError::NoSuchStep { step: "back", .. }))
        ));
        assert_eq!(fx.store.call_count(), 0);
    }

    #[tokio::test]
    async fn drive_consumes_event_stream() {
        let fx = Fixture::new();
        fx.seed("Acme Trust").await;
        let controller = fx.controller(primary_contact_page(&routes()));
        controller.load().await.unwrap();

        let changes = futures::stream::iter(vec![
            fx.view.type_value("firstName", "Ada"),
            fx.view.type_value("lastName", "Lovelace "),
        ]);
        let validation = controller.drive(changes).await;

        assert!(validation.allowed);
        assert_eq!(fx.view.is_enabled(Control::Next), Some(true));
        assert_eq!(fx.session.cache().get("lastName").as_deref(), Some("Lovelace"));
    }
}
