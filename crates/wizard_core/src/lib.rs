use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use shared::domain::{FieldKey, StepId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub mod error;
pub mod fields;
pub mod flows;
pub mod gateway;
pub mod http;
pub mod messages;
pub mod mock;
pub mod navigator;
pub mod rules;
pub mod sequencer;

pub use error::WizardError;
pub use fields::{FieldEdit, FieldStore, Submission};
pub use flows::{Completion, FlowDefinition, FlowKind, RetreatPolicy, StepDefinition};
pub use gateway::{GatewayError, SubmissionGateway, SubmitError, SubmitReceipt, SubmitService};
pub use http::HttpAuthService;
pub use messages::{Locale, MessageCatalog};
pub use mock::MockAuthService;
pub use navigator::{Navigator, RecordingNavigator};
pub use sequencer::StepSequencer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the given step.
    Advanced(StepId),
    /// The active step's rule rejected the current values.
    Invalid(StepId),
    /// The terminal step was submitted successfully.
    Submitted(Completion),
    /// The submit collaborator or persistence failed; still on the terminal step.
    SubmissionFailed,
    /// A submission is outstanding; the press was dropped.
    Busy,
    /// The flow already navigated away.
    AlreadyCompleted,
}

/// Read-only view of a wizard for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSnapshot {
    pub flow: FlowKind,
    pub step: StepId,
    pub step_index: usize,
    pub step_count: usize,
    pub error: Option<String>,
    pub field_errors: BTreeMap<FieldKey, String>,
    pub is_submitting: bool,
    pub notice: Option<String>,
    pub completed: bool,
}

impl WizardSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.step_index + 1 == self.step_count
    }
}

struct WizardState {
    sequencer: StepSequencer<StepId>,
    fields: FieldStore,
    error: Option<String>,
    field_errors: BTreeMap<FieldKey, String>,
    notice: Option<String>,
    completed: bool,
}

impl WizardState {
    fn clear_feedback(&mut self) {
        self.error = None;
        self.field_errors.clear();
        self.notice = None;
    }
}

/// Clears the in-flight flag however the submit future ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Linear step wizard: one instance per mounted flow.
///
/// The handle is meant to be shared (`Arc<Wizard>`) between the input loop
/// and whatever drives submission. State sits behind an async mutex that is
/// never held across the submit call; `submitting` gates re-entry so at most
/// one submission is ever outstanding.
pub struct Wizard {
    flow: FlowDefinition,
    messages: MessageCatalog,
    gateway: SubmissionGateway,
    navigator: Arc<dyn Navigator>,
    submitting: AtomicBool,
    state: Mutex<WizardState>,
}

impl Wizard {
    pub fn new(
        flow: FlowDefinition,
        messages: MessageCatalog,
        gateway: SubmissionGateway,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, WizardError> {
        flow.validate()?;
        let state = WizardState {
            sequencer: StepSequencer::new(flow.step_ids())?,
            fields: FieldStore::new(&flow.fields),
            error: None,
            field_errors: BTreeMap::new(),
            notice: None,
            completed: false,
        };
        debug!(flow = %flow.kind, steps = flow.steps.len(), "wizard created");
        Ok(Self {
            flow,
            messages,
            gateway,
            navigator,
            submitting: AtomicBool::new(false),
            state: Mutex::new(state),
        })
    }

    pub fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub async fn current_step(&self) -> StepId {
        self.state.lock().await.sequencer.current()
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        let state = self.state.lock().await;
        WizardSnapshot {
            flow: self.flow.kind,
            step: state.sequencer.current(),
            step_index: state.sequencer.index(),
            step_count: state.sequencer.len(),
            error: state.error.clone(),
            field_errors: state.field_errors.clone(),
            is_submitting: self.is_submitting(),
            notice: state.notice.clone(),
            completed: state.completed,
        }
    }

    pub async fn fields(&self) -> FieldStore {
        self.state.lock().await.fields.clone()
    }

    pub async fn set_field(&self, edit: FieldEdit) -> Result<(), WizardError> {
        self.state.lock().await.fields.set(self.flow.kind, edit)
    }

    /// The "next" action: validate the active step, then either move on or
    /// submit from the terminal step.
    pub async fn advance(&self) -> AdvanceOutcome {
        let (submission, in_flight) = {
            let mut state = self.state.lock().await;
            if self.is_submitting() {
                debug!(flow = %self.flow.kind, "advance ignored while submitting");
                return AdvanceOutcome::Busy;
            }
            if state.completed {
                return AdvanceOutcome::AlreadyCompleted;
            }
            state.clear_feedback();

            let step_id = state.sequencer.current();
            let Some(step) = self.flow.step_at(state.sequencer.index()) else {
                return AdvanceOutcome::Invalid(step_id);
            };
            if !step.rule.accepts(&state.fields) {
                let failing = step.rule.failing_fields(&state.fields);
                state.error = Some(self.messages.step(step_id).to_string());
                for field in failing {
                    state
                        .field_errors
                        .insert(field, self.messages.required(field).to_string());
                }
                info!(flow = %self.flow.kind, step = %step_id, "step rejected");
                return AdvanceOutcome::Invalid(step_id);
            }

            if !state.sequencer.is_terminal() {
                let next = state.sequencer.advance();
                info!(flow = %self.flow.kind, from = %step_id, to = %next, "step advanced");
                return AdvanceOutcome::Advanced(next);
            }

            self.submitting.store(true, Ordering::Release);
            (state.fields.snapshot(), InFlight(&self.submitting))
        };

        info!(flow = %self.flow.kind, "submission started");
        let result = self.gateway.submit(self.flow.kind, submission).await;

        let mut state = self.state.lock().await;
        drop(in_flight);
        match result {
            Ok(_) => {
                state.error = None;
                match self.flow.completion {
                    Completion::Navigate(destination) => {
                        state.completed = true;
                        drop(state);
                        info!(flow = %self.flow.kind, %destination, "submission succeeded");
                        self.navigator.navigate(destination);
                    }
                    Completion::Notice => {
                        state.notice = Some(self.messages.recovery_sent().to_string());
                        info!(flow = %self.flow.kind, "submission succeeded");
                    }
                }
                AdvanceOutcome::Submitted(self.flow.completion)
            }
            Err(err) => {
                state.error = Some(err.user_message(&self.messages).to_string());
                warn!(flow = %self.flow.kind, "submission failed; staying on terminal step");
                AdvanceOutcome::SubmissionFailed
            }
        }
    }

    pub async fn retreat(&self) -> Result<StepId, WizardError> {
        if self.flow.retreat == RetreatPolicy::Disabled {
            return Err(WizardError::RetreatNotSupported(self.flow.kind));
        }
        let mut state = self.state.lock().await;
        if self.is_submitting() {
            return Err(WizardError::SubmissionInFlight);
        }
        state.clear_feedback();
        let step = state.sequencer.retreat();
        debug!(flow = %self.flow.kind, %step, "step retreated");
        Ok(step)
    }

    /// Discards everything collected so far and returns to the first step.
    pub async fn cancel(&self) -> Result<(), WizardError> {
        let mut state = self.state.lock().await;
        if self.is_submitting() {
            return Err(WizardError::SubmissionInFlight);
        }
        state.sequencer.reset();
        state.fields.clear();
        state.clear_feedback();
        state.completed = false;
        info!(flow = %self.flow.kind, "wizard cancelled");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
