//! Funnel simulator
//!
//! Walks one visitor through the standard funnel against an in-memory
//! store with optional injected write failures:
//! 1. Load each page
//! 2. Type the scripted answers for the fields it owns
//! 3. Submit forward, retrying transient store failures up to a limit
//!
//! Key properties checked by the report:
//! - Exactly one Submission exists for the trust name
//! - Every page navigated, ending at the payment handoff

use crate::cache::SessionCache;
use crate::config::FunnelConfig;
use crate::controller::SubmitOutcome;
use crate::error::PageError;
use crate::pages::FunnelPlan;
use crate::session::WizardSession;
use funnel_record::{
    BusinessKey, Field, InMemoryRecordStore, Record, RecordStore, StructuredValue,
    BUSINESS_KEY_FIELD,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{FaultyStore, HeadlessView, RecordingNavigator};

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Business key typed on the first page
    pub trust_name: String,
    /// Funnel configuration
    pub funnel: FunnelConfig,
    /// Store updates to fail before letting writes through
    pub fail_updates: usize,
    /// Submit attempts per page before giving up
    pub max_attempts: u32,
    /// Value typed into each field, by field name
    pub answers: BTreeMap<String, Field>,
}

impl SimulatorConfig {
    /// Default answers for the given trust name
    pub fn new(trust_name: impl Into<String>) -> Self {
        let trust_name = trust_name.into();
        let mut answers = BTreeMap::new();
        answers.insert(BUSINESS_KEY_FIELD.to_string(), Field::scalar(trust_name.clone()));
        answers.insert("firstName".to_string(), Field::scalar("Ada"));
        answers.insert("lastName".to_string(), Field::scalar("Lovelace"));
        answers.insert("email".to_string(), Field::scalar("ada@example.com"));
        answers.insert(
            "address".to_string(),
            Field::from(
                StructuredValue::new("1 Queen Street, Auckland 1010")
                    .with_component("street", "1 Queen Street")
                    .with_component("city", "Auckland")
                    .with_component("postalCode", "1010"),
            ),
        );
        Self {
            trust_name,
            funnel: FunnelConfig::default(),
            fail_updates: 0,
            max_attempts: 3,
            answers,
        }
    }

    /// With funnel configuration
    #[inline]
    #[must_use]
    pub fn with_funnel(mut self, funnel: FunnelConfig) -> Self {
        self.funnel = funnel;
        self
    }

    /// With injected update failures
    #[inline]
    #[must_use]
    pub fn with_failed_updates(mut self, n: usize) -> Self {
        self.fail_updates = n;
        self
    }

    /// With an answer for one field
    #[inline]
    #[must_use]
    pub fn with_answer(mut self, field: impl Into<String>, value: impl Into<Field>) -> Self {
        self.answers.insert(field.into(), value.into());
        self
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new("Harbour Family Trust")
    }
}

/// What happened on one page
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub page: u8,
    pub name: String,
    pub attempts: u32,
    pub navigated: bool,
    pub destination: Option<String>,
    /// User-visible errors, in order
    pub errors: Vec<String>,
    /// True if any failure reached the Submission's error log
    pub error_logged: bool,
}

/// Final report from the simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub trust_name: String,
    pub steps: Vec<StepReport>,
    pub submissions: usize,
    pub record: Option<Record>,
    pub cache: BTreeMap<String, String>,
}

impl SimulatorReport {
    /// Every page navigated and exactly one Submission exists
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.steps.is_empty()
            && self.steps.iter().all(|step| step.navigated)
            && self.submissions == 1
            && self.record.is_some()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Funnel Simulator Report ===\n\n");
        report.push_str(&format!("Trust Name: {}\n", self.trust_name));
        report.push_str(&format!("Submissions: {}\n", self.submissions));

        report.push_str("\n=== Pages ===\n");
        for step in &self.steps {
            report.push_str(&format!(
                "{}. {} - attempts: {}, {}\n",
                step.page,
                step.name,
                step.attempts,
                step.destination
                    .as_deref()
                    .map_or_else(|| "stopped".to_string(), |d| format!("-> {d}")),
            ));
            for error in &step.errors {
                report.push_str(&format!("   ! {error}\n"));
            }
        }

        if let Some(record) = &self.record {
            report.push_str("\n=== Submission ===\n");
            for (name, value) in &record.fields {
                report.push_str(&format!("{name}: {value}\n"));
            }
            if let Some(log) = &record.error_log {
                report.push_str(&format!("errorLog: {log}\n"));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Run the funnel simulator
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let store = Arc::new(FaultyStore::new(InMemoryRecordStore::new()));
    store.fail_next_updates(config.fail_updates);
    let cache = SessionCache::new();
    let session = WizardSession::new(
        Arc::new(cache.clone()),
        store.clone(),
        config.funnel.clone(),
    );
    let navigator = Arc::new(RecordingNavigator::new());
    let plan = FunnelPlan::standard(&config.funnel);

    let mut steps = Vec::with_capacity(plan.len());
    for page in plan.pages() {
        let view = Arc::new(HeadlessView::new());
        let controller = session.controller(page.clone(), view.clone(), navigator.clone());
        let mut step = StepReport {
            page: page.number,
            name: page.name.clone(),
            attempts: 0,
            navigated: false,
            destination: None,
            errors: Vec::new(),
            error_logged: false,
        };

        if let Err(e) = controller.load().await {
            step.errors.push(e.user_message());
            steps.push(step);
            break;
        }

        for field in &page.fields {
            if let Some(answer) = config.answers.get(&field.name) {
                controller.on_field_change(view.type_value(&field.name, answer.clone()));
            }
        }

        loop {
            step.attempts += 1;
            match controller.next().await {
                SubmitOutcome::Navigated { destination, .. } => {
                    step.navigated = true;
                    step.destination = Some(destination.to_string());
                    break;
                }
                SubmitOutcome::Aborted { error, error_log } => {
                    tracing::warn!(page = page.number, attempt = step.attempts, error = %error, "submit aborted");
                    step.errors.push(error.user_message());
                    step.error_logged |= error_log.is_durable();
                    let transient = matches!(error, PageError::Store(ref e) if e.is_retryable());
                    if !transient || step.attempts >= config.max_attempts {
                        break;
                    }
                }
            }
        }

        let navigated = step.navigated;
        steps.push(step);
        if !navigated {
            break;
        }
    }

    let record = match BusinessKey::parse(&config.trust_name) {
        Ok(key) => store.inner().find(&key).await.ok().flatten(),
        Err(_) => None,
    };

    SimulatorReport {
        trust_name: config.trust_name,
        steps,
        submissions: store.inner().len(),
        record,
        cache: cache.snapshot(),
    }
}
