use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    FullName,
    Email,
    WantsNotifications,
    Password,
    ConfirmPassword,
}

impl FieldKey {
    pub const ALL: [FieldKey; 5] = [
        FieldKey::FullName,
        FieldKey::Email,
        FieldKey::WantsNotifications,
        FieldKey::Password,
        FieldKey::ConfirmPassword,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::FullName => "full_name",
            FieldKey::Email => "email",
            FieldKey::WantsNotifications => "wants_notifications",
            FieldKey::Password => "password",
            FieldKey::ConfirmPassword => "confirm_password",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FieldKey::WantsNotifications => FieldKind::Choice,
            _ => FieldKind::Text,
        }
    }

    /// Fields whose values must never reach logs or terminal echoes.
    pub fn is_secret(self) -> bool {
        matches!(self, FieldKey::Password | FieldKey::ConfirmPassword)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Choice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Choice(Option<bool>),
}

impl FieldValue {
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Choice => FieldValue::Choice(None),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Choice(_) => FieldKind::Choice,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Name,
    Email,
    Goal,
    Password,
    Credentials,
    RecoveryEmail,
    NewPassword,
}

impl StepId {
    pub const ALL: [StepId; 7] = [
        StepId::Name,
        StepId::Email,
        StepId::Goal,
        StepId::Password,
        StepId::Credentials,
        StepId::RecoveryEmail,
        StepId::NewPassword,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Name => "name",
            StepId::Email => "email",
            StepId::Goal => "goal",
            StepId::Password => "password",
            StepId::Credentials => "credentials",
            StepId::RecoveryEmail => "recovery_email",
            StepId::NewPassword => "new_password",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|step| step.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Home,
    Login,
    Signup,
    ForgotPassword,
}

impl Destination {
    pub fn path(self) -> &'static str {
        match self {
            Destination::Home => "/",
            Destination::Login => "/login",
            Destination::Signup => "/signup",
            Destination::ForgotPassword => "/forget-password",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Profile record persisted next to the access token after a successful
/// authentication-like submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wants_notifications: Option<bool>,
}

impl StudentProfile {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            full_name: None,
            wants_notifications: None,
        }
    }
}
