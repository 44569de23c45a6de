use crate::navigation::{Destination, Navigator};
use crate::view::{Control, FieldChange, PageView};
use async_trait::async_trait;
use funnel_record::{BusinessKey, Field, InMemoryRecordStore, Record, RecordId, RecordStore, StoreError};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store call observed by [`FaultyStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Find(BusinessKey),
    Insert(BusinessKey),
    Update(BusinessKey),
}

/// Store wrapper that fails on demand and records every call
#[derive(Debug, Default)]
pub struct FaultyStore<S = InMemoryRecordStore> {
    inner: S,
    fail_finds: AtomicUsize,
    fail_inserts: AtomicUsize,
    fail_updates: AtomicUsize,
    /// Scheduler yields after each lookup
    find_yields: AtomicUsize,
    calls: Mutex<Vec<StoreCall>>,
}

impl<S: RecordStore> FaultyStore<S> {
    /// Wrap a store
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_finds: AtomicUsize::new(0),
            fail_inserts: AtomicUsize::new(0),
            fail_updates: AtomicUsize::new(0),
            find_yields: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Wrapped store
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail the next `n` lookups
    pub fn fail_next_finds(&self, n: usize) {
        self.fail_finds.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` inserts
    pub fn fail_next_inserts(&self, n: usize) {
        self.fail_inserts.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` updates
    pub fn fail_next_updates(&self, n: usize) {
        self.fail_updates.store(n, Ordering::SeqCst);
    }

    /// Suspend every lookup for `n` scheduler turns after reading
    ///
    /// Lets concurrent callers interleave between a read and the write
    /// that follows it.
    pub fn yield_after_finds(&self, n: usize) {
        self.find_yields.store(n, Ordering::SeqCst);
    }

    /// Every call so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Number of calls so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn inject(counter: &AtomicUsize, op: &str) -> Result<(), StoreError> {
        let armed = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            Err(StoreError::unavailable(format!("injected {op} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for FaultyStore<S> {
    async fn find(&self, key: &BusinessKey) -> Result<Option<Record>, StoreError> {
        self.calls.lock().push(StoreCall::Find(key.clone()));
        Self::inject(&self.fail_finds, "find")?;
        let found = self.inner.find(key).await;
        for _ in 0..self.find_yields.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        found
    }

    async fn insert(&self, record: Record) -> Result<RecordId, StoreError> {
        self.calls.lock().push(StoreCall::Insert(record.business_key.clone()));
        Self::inject(&self.fail_inserts, "insert")?;
        self.inner.insert(record).await
    }

    async fn update(&self, record: Record) -> Result<(), StoreError> {
        self.calls.lock().push(StoreCall::Update(record.business_key.clone()));
        Self::inject(&self.fail_updates, "update")?;
        self.inner.update(record).await
    }
}

/// Everything a [`HeadlessView`] currently shows
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub values: BTreeMap<String, Field>,
    pub enabled: BTreeMap<Control, bool>,
    pub hidden: BTreeSet<Control>,
    pub texts: BTreeMap<Control, String>,
    /// Every error message shown, oldest first
    pub errors_shown: Vec<String>,
}

/// Page view without a UI toolkit
///
/// Controls start visible, except the error banner which starts hidden.
#[derive(Debug)]
pub struct HeadlessView {
    state: Mutex<ViewState>,
}

impl HeadlessView {
    #[must_use]
    pub fn new() -> Self {
        let mut state = ViewState::default();
        state.hidden.insert(Control::ErrorMessage);
        Self {
            state: Mutex::new(state),
        }
    }

    /// Simulate typing into a field, returning the change event
    pub fn type_value(&self, field: &str, value: impl Into<Field>) -> FieldChange {
        let value = value.into();
        self.state.lock().values.insert(field.to_string(), value.clone());
        FieldChange::new(field, value)
    }

    /// Whether a control is enabled; `None` if it was never toggled
    #[must_use]
    pub fn is_enabled(&self, control: Control) -> Option<bool> {
        self.state.lock().enabled.get(&control).copied()
    }

    /// Whether a control is visible
    #[must_use]
    pub fn is_visible(&self, control: Control) -> bool {
        !self.state.lock().hidden.contains(&control)
    }

    /// Text of a control
    #[must_use]
    pub fn text(&self, control: Control) -> Option<String> {
        self.state.lock().texts.get(&control).cloned()
    }

    /// Error banner text while it is visible
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if self.is_visible(Control::ErrorMessage) {
            self.text(Control::ErrorMessage)
        } else {
            None
        }
    }

    /// Copy of the full view state
    #[must_use]
    pub fn snapshot(&self) -> ViewState {
        self.state.lock().clone()
    }
}

impl Default for HeadlessView {
    fn default() -> Self {
        Self::new()
    }
}

impl PageView for HeadlessView {
    fn value(&self, field: &str) -> Option<Field> {
        self.state.lock().values.get(field).cloned()
    }

    fn set_value(&self, field: &str, value: Field) {
        self.state.lock().values.insert(field.to_string(), value);
    }

    fn enable(&self, control: Control) {
        self.state.lock().enabled.insert(control, true);
    }

    fn disable(&self, control: Control) {
        self.state.lock().enabled.insert(control, false);
    }

    fn show(&self, control: Control) {
        let mut state = self.state.lock();
        state.hidden.remove(&control);
        if control == Control::ErrorMessage {
            if let Some(text) = state.texts.get(&control).cloned() {
                state.errors_shown.push(text);
            }
        }
    }

    fn hide(&self, control: Control) {
        self.state.lock().hidden.insert(control);
    }

    fn set_text(&self, control: Control, text: &str) {
        self.state.lock().texts.insert(control, text.to_string());
    }
}

/// Navigator that records destinations instead of leaving the page
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Destination>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every destination so far, in order
    #[must_use]
    pub fn visits(&self) -> Vec<Destination> {
        self.visits.lock().clone()
    }

    /// Most recent destination
    #[must_use]
    pub fn last(&self) -> Option<Destination> {
        self.visits.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, destination: &Destination) {
        tracing::debug!(%destination, "navigate");
        self.visits.lock().push(destination.clone());
    }
}
