use shared::domain::{FieldKey, StepId};
use thiserror::Error;

use crate::flows::FlowKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("field '{field}' is not part of the {flow} flow")]
    UnknownField { field: FieldKey, flow: FlowKind },
    #[error("a flow needs at least one step")]
    EmptyFlow,
    #[error("step '{0}' appears more than once in the flow")]
    DuplicateStep(StepId),
    #[error("step '{step}' validates field '{field}' which the flow does not collect")]
    RuleFieldMissing { step: StepId, field: FieldKey },
    #[error("the {0} flow does not support going back")]
    RetreatNotSupported(FlowKind),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("unknown step '{0}' in message overrides")]
    UnknownStepOverride(String),
    #[error("unknown locale '{0}'")]
    UnknownLocale(String),
    #[error("unknown flow '{0}'")]
    UnknownFlow(String),
}
