//! Validation Predicate Set. Every rule is a pure function of the field store.

use std::sync::LazyLock;

use regex::Regex;
use shared::domain::FieldKey;

use crate::fields::FieldStore;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").ok());

fn looks_like_email(raw: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(raw.trim()))
}

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MIN_NAME_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRule {
    /// Trimmed text has at least `min` characters.
    MinTrimmedChars { field: FieldKey, min: usize },
    /// Trimmed text looks like `local@domain.tld`.
    EmailLike { field: FieldKey },
    /// The yes/no choice has been answered.
    ChoiceMade { field: FieldKey },
    /// Password is long enough and matches its confirmation.
    PasswordPair { min: usize },
    /// Every listed text field is non-empty. Failures are reported per field.
    Required { fields: Vec<FieldKey> },
}

impl StepRule {
    pub fn accepts(&self, fields: &FieldStore) -> bool {
        match self {
            StepRule::MinTrimmedChars { field, min } => {
                fields.text(*field).trim().chars().count() >= *min
            }
            StepRule::EmailLike { field } => looks_like_email(fields.text(*field)),
            StepRule::ChoiceMade { field } => fields.choice(*field).is_some(),
            StepRule::PasswordPair { min } => {
                let password = fields.text(FieldKey::Password);
                password.chars().count() >= *min
                    && password == fields.text(FieldKey::ConfirmPassword)
            }
            StepRule::Required { .. } => self.failing_fields(fields).is_empty(),
        }
    }

    /// Fields to flag individually. Only `Required` reports per-field failures.
    pub fn failing_fields(&self, fields: &FieldStore) -> Vec<FieldKey> {
        match self {
            StepRule::Required { fields: required } => required
                .iter()
                .copied()
                .filter(|key| fields.text(*key).is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn fields(&self) -> Vec<FieldKey> {
        match self {
            StepRule::MinTrimmedChars { field, .. }
            | StepRule::EmailLike { field }
            | StepRule::ChoiceMade { field } => vec![*field],
            StepRule::PasswordPair { .. } => vec![FieldKey::Password, FieldKey::ConfirmPassword],
            StepRule::Required { fields } => fields.clone(),
        }
    }
}
