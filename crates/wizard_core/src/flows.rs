//! Step/rule tables for the portal's wizards.

use std::{fmt, str::FromStr};

use shared::domain::{Destination, FieldKey, StepId};

use crate::{
    error::WizardError,
    rules::{StepRule, MIN_NAME_CHARS, MIN_PASSWORD_CHARS},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Signup,
    Login,
    ForgotPassword,
    ResetPassword,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Signup => "signup",
            FlowKind::Login => "login",
            FlowKind::ForgotPassword => "forgot_password",
            FlowKind::ResetPassword => "reset_password",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = WizardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "signup" => Ok(FlowKind::Signup),
            "login" => Ok(FlowKind::Login),
            "forgot_password" | "forget_password" => Ok(FlowKind::ForgotPassword),
            "reset_password" => Ok(FlowKind::ResetPassword),
            other => Err(WizardError::UnknownFlow(other.to_string())),
        }
    }
}

/// What happens once the terminal submission succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Hand control to the navigator and close the wizard.
    Navigate(Destination),
    /// Stay put and show a success notice; the wizard may be submitted again.
    Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetreatPolicy {
    #[default]
    Disabled,
    PreviousStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: StepId,
    pub rule: StepRule,
}

impl StepDefinition {
    pub fn new(id: StepId, rule: StepRule) -> Self {
        Self { id, rule }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDefinition {
    pub kind: FlowKind,
    pub steps: Vec<StepDefinition>,
    pub fields: Vec<FieldKey>,
    pub completion: Completion,
    pub retreat: RetreatPolicy,
}

impl FlowDefinition {
    pub fn new(
        kind: FlowKind,
        steps: Vec<StepDefinition>,
        fields: Vec<FieldKey>,
        completion: Completion,
    ) -> Self {
        Self {
            kind,
            steps,
            fields,
            completion,
            retreat: RetreatPolicy::Disabled,
        }
    }

    pub fn for_kind(kind: FlowKind) -> Self {
        match kind {
            FlowKind::Signup => Self::signup(),
            FlowKind::Login => Self::login(),
            FlowKind::ForgotPassword => Self::forgot_password(),
            FlowKind::ResetPassword => Self::reset_password(),
        }
    }

    pub fn signup() -> Self {
        Self::new(
            FlowKind::Signup,
            vec![
                StepDefinition::new(
                    StepId::Name,
                    StepRule::MinTrimmedChars {
                        field: FieldKey::FullName,
                        min: MIN_NAME_CHARS,
                    },
                ),
                StepDefinition::new(
                    StepId::Email,
                    StepRule::EmailLike {
                        field: FieldKey::Email,
                    },
                ),
                StepDefinition::new(
                    StepId::Goal,
                    StepRule::ChoiceMade {
                        field: FieldKey::WantsNotifications,
                    },
                ),
                StepDefinition::new(
                    StepId::Password,
                    StepRule::PasswordPair {
                        min: MIN_PASSWORD_CHARS,
                    },
                ),
            ],
            FieldKey::ALL.to_vec(),
            Completion::Navigate(Destination::Home),
        )
    }

    pub fn login() -> Self {
        Self::new(
            FlowKind::Login,
            vec![StepDefinition::new(
                StepId::Credentials,
                StepRule::Required {
                    fields: vec![FieldKey::Email, FieldKey::Password],
                },
            )],
            vec![FieldKey::Email, FieldKey::Password],
            Completion::Navigate(Destination::Home),
        )
    }

    pub fn forgot_password() -> Self {
        Self::new(
            FlowKind::ForgotPassword,
            vec![StepDefinition::new(
                StepId::RecoveryEmail,
                StepRule::EmailLike {
                    field: FieldKey::Email,
                },
            )],
            vec![FieldKey::Email],
            Completion::Notice,
        )
    }

    pub fn reset_password() -> Self {
        Self::new(
            FlowKind::ResetPassword,
            vec![StepDefinition::new(
                StepId::NewPassword,
                StepRule::PasswordPair {
                    min: MIN_PASSWORD_CHARS,
                },
            )],
            vec![FieldKey::Password, FieldKey::ConfirmPassword],
            Completion::Navigate(Destination::Login),
        )
    }

    pub fn with_retreat(mut self, retreat: RetreatPolicy) -> Self {
        self.retreat = retreat;
        self
    }

    pub fn step_ids(&self) -> Vec<StepId> {
        self.steps.iter().map(|step| step.id).collect()
    }

    pub fn step_at(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    /// Checks the table is usable: at least one step, no step listed twice,
    /// and every rule only reads fields the flow collects.
    pub fn validate(&self) -> Result<(), WizardError> {
        if self.steps.is_empty() {
            return Err(WizardError::EmptyFlow);
        }
        for (index, step) in self.steps.iter().enumerate() {
            if self.steps[..index].iter().any(|prior| prior.id == step.id) {
                return Err(WizardError::DuplicateStep(step.id));
            }
            if let Some(field) = step
                .rule
                .fields()
                .into_iter()
                .find(|field| !self.fields.contains(field))
            {
                return Err(WizardError::RuleFieldMissing {
                    step: step.id,
                    field,
                });
            }
        }
        Ok(())
    }
}
