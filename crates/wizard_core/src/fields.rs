//! Field Store: the values a wizard accumulates across its steps.

use std::{collections::BTreeMap, fmt};

use shared::domain::{FieldKey, FieldValue, StudentProfile};

use crate::{error::WizardError, flows::FlowKind};

/// One user edit. Each variant carries the value kind its field accepts.
#[derive(Clone, PartialEq, Eq)]
pub enum FieldEdit {
    FullName(String),
    Email(String),
    WantsNotifications(Option<bool>),
    Password(String),
    ConfirmPassword(String),
}

impl FieldEdit {
    pub fn key(&self) -> FieldKey {
        match self {
            FieldEdit::FullName(_) => FieldKey::FullName,
            FieldEdit::Email(_) => FieldKey::Email,
            FieldEdit::WantsNotifications(_) => FieldKey::WantsNotifications,
            FieldEdit::Password(_) => FieldKey::Password,
            FieldEdit::ConfirmPassword(_) => FieldKey::ConfirmPassword,
        }
    }

    /// Builds an edit for a text field. Returns `None` for choice fields.
    pub fn text(key: FieldKey, value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        match key {
            FieldKey::FullName => Some(FieldEdit::FullName(value)),
            FieldKey::Email => Some(FieldEdit::Email(value)),
            FieldKey::Password => Some(FieldEdit::Password(value)),
            FieldKey::ConfirmPassword => Some(FieldEdit::ConfirmPassword(value)),
            FieldKey::WantsNotifications => None,
        }
    }

    fn into_value(self) -> FieldValue {
        match self {
            FieldEdit::FullName(v)
            | FieldEdit::Email(v)
            | FieldEdit::Password(v)
            | FieldEdit::ConfirmPassword(v) => FieldValue::Text(v),
            FieldEdit::WantsNotifications(v) => FieldValue::Choice(v),
        }
    }
}

impl fmt::Debug for FieldEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldEdit::Password(_) | FieldEdit::ConfirmPassword(_) => {
                write!(f, "{}(<redacted>)", self.key())
            }
            FieldEdit::FullName(v) | FieldEdit::Email(v) => write!(f, "{}({v:?})", self.key()),
            FieldEdit::WantsNotifications(v) => write!(f, "{}({v:?})", self.key()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStore {
    values: BTreeMap<FieldKey, FieldValue>,
}

impl FieldStore {
    pub fn new(keys: &[FieldKey]) -> Self {
        let values = keys
            .iter()
            .map(|key| (*key, FieldValue::empty(key.kind())))
            .collect();
        Self { values }
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.values.keys().copied()
    }

    pub fn set(&mut self, flow: FlowKind, edit: FieldEdit) -> Result<(), WizardError> {
        let field = edit.key();
        let slot = self
            .values
            .get_mut(&field)
            .ok_or(WizardError::UnknownField { field, flow })?;
        *slot = edit.into_value();
        Ok(())
    }

    /// Text value of `key`, or `""` when the key is absent or holds a choice.
    pub fn text(&self, key: FieldKey) -> &str {
        match self.values.get(&key) {
            Some(FieldValue::Text(v)) => v,
            _ => "",
        }
    }

    pub fn choice(&self, key: FieldKey) -> Option<bool> {
        match self.values.get(&key) {
            Some(FieldValue::Choice(v)) => *v,
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        for (key, value) in self.values.iter_mut() {
            *value = FieldValue::empty(key.kind());
        }
    }

    pub fn snapshot(&self) -> Submission {
        let text = |key| self.contains(key).then(|| self.text(key).to_string());
        Submission {
            full_name: text(FieldKey::FullName),
            email: text(FieldKey::Email),
            wants_notifications: self.choice(FieldKey::WantsNotifications),
            password: text(FieldKey::Password),
            confirm_password: text(FieldKey::ConfirmPassword),
        }
    }
}

/// Field values handed to the submit collaborator. Fields the flow does not
/// collect are `None`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub wants_notifications: Option<bool>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl Submission {
    pub fn email(&self) -> &str {
        self.email.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }

    pub fn profile(&self) -> Option<StudentProfile> {
        let email = self.email();
        if email.is_empty() {
            return None;
        }
        Some(StudentProfile {
            email: email.to_string(),
            full_name: self
                .full_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            wants_notifications: self.wants_notifications,
        })
    }
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Submission")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("wants_notifications", &self.wants_notifications)
            .field("password", &redact(&self.password))
            .field("confirm_password", &redact(&self.confirm_password))
            .finish()
    }
}
