//! Static step -> message tables, one per supported locale.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    hash::Hash,
    str::FromStr,
};

use shared::domain::{FieldKey, StepId};

use crate::error::WizardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl FromStr for Locale {
    type Err = WizardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ar" | "arabic" => Ok(Locale::Ar),
            other => Err(WizardError::UnknownLocale(other.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        })
    }
}

#[derive(Debug, Clone)]
pub struct MessageCatalog {
    locale: Locale,
    steps: HashMap<StepId, String>,
    required: HashMap<FieldKey, String>,
    labels: HashMap<FieldKey, String>,
    submission_failed: String,
    recovery_sent: String,
}

impl MessageCatalog {
    pub fn new(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::english(),
            Locale::Ar => Self::arabic(),
        }
    }

    fn english() -> Self {
        let steps = [
            (StepId::Name, "Please enter your full name"),
            (StepId::Email, "Please enter a valid email address"),
            (StepId::Goal, "Please choose yes or no"),
            (
                StepId::Password,
                "Password must be at least 6 characters and match the confirmation",
            ),
            (StepId::Credentials, "Please enter your account details"),
            (StepId::RecoveryEmail, "Please enter a valid email address"),
            (
                StepId::NewPassword,
                "Password must be at least 6 characters and match the confirmation",
            ),
        ];
        let required = [
            (FieldKey::FullName, "Please enter your full name"),
            (FieldKey::Email, "Please enter your email"),
            (FieldKey::WantsNotifications, "Please choose yes or no"),
            (FieldKey::Password, "Please enter your password"),
            (FieldKey::ConfirmPassword, "Please confirm your password"),
        ];
        let labels = [
            (FieldKey::FullName, "Full name"),
            (FieldKey::Email, "Email"),
            (FieldKey::WantsNotifications, "Would you like to receive notifications?"),
            (FieldKey::Password, "Password"),
            (FieldKey::ConfirmPassword, "Confirm password"),
        ];
        Self::from_tables(
            Locale::En,
            &steps,
            &required,
            &labels,
            "Something went wrong, please try again",
            "The email was sent successfully. Please check your inbox.",
        )
    }

    fn arabic() -> Self {
        let password_rule = "كلمة السر يجب أن تكون 6 أحرف على الأقل وأن تتطابق مع التأكيد";
        let steps = [
            (StepId::Name, "الرجاء إدخال الاسم الكامل"),
            (StepId::Email, "الرجاء إدخال بريد إلكتروني صحيح"),
            (StepId::Goal, "الرجاء اختيار نعم أو لا"),
            (StepId::Password, password_rule),
            (StepId::Credentials, "الرجاء إدخال معلومات الحساب"),
            (StepId::RecoveryEmail, "الرجاء إدخال بريد إلكتروني صحيح"),
            (StepId::NewPassword, password_rule),
        ];
        let required = [
            (FieldKey::FullName, "الرجاء إدخال الاسم الكامل"),
            (FieldKey::Email, "الرجاء إدخال بريدك الإلكتروني"),
            (FieldKey::WantsNotifications, "الرجاء اختيار نعم أو لا"),
            (FieldKey::Password, "الرجاء إدخال كلمة السر"),
            (FieldKey::ConfirmPassword, "الرجاء تأكيد كلمة السر"),
        ];
        let labels = [
            (FieldKey::FullName, "الاسم الكامل"),
            (FieldKey::Email, "البريد الإلكتروني"),
            (FieldKey::WantsNotifications, "هل تريد تلقي الإشعارات؟"),
            (FieldKey::Password, "كلمة السر"),
            (FieldKey::ConfirmPassword, "تأكيد كلمة السر"),
        ];
        Self::from_tables(
            Locale::Ar,
            &steps,
            &required,
            &labels,
            "حدث خطأ، الرجاء المحاولة مرة أخرى",
            "تم إرسال البريد الإلكتروني بنجاح. يرجى التحقق من بريدك الإلكتروني.",
        )
    }

    fn from_tables(
        locale: Locale,
        steps: &[(StepId, &str)],
        required: &[(FieldKey, &str)],
        labels: &[(FieldKey, &str)],
        submission_failed: &str,
        recovery_sent: &str,
    ) -> Self {
        Self {
            locale,
            steps: owned_table(steps),
            required: owned_table(required),
            labels: owned_table(labels),
            submission_failed: submission_failed.to_string(),
            recovery_sent: recovery_sent.to_string(),
        }
    }

    /// Replaces step messages from a `{step: message}` table.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, WizardError> {
        for (raw_step, message) in overrides {
            let step = StepId::parse(raw_step)
                .ok_or_else(|| WizardError::UnknownStepOverride(raw_step.clone()))?;
            self.steps.insert(step, message.clone());
        }
        Ok(self)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn step(&self, step: StepId) -> &str {
        self.steps
            .get(&step)
            .map(String::as_str)
            .unwrap_or(&self.submission_failed)
    }

    pub fn required(&self, field: FieldKey) -> &str {
        self.required
            .get(&field)
            .map(String::as_str)
            .unwrap_or(&self.submission_failed)
    }

    pub fn label(&self, field: FieldKey) -> &str {
        self.labels
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.as_str())
    }

    pub fn submission_failed(&self) -> &str {
        &self.submission_failed
    }

    pub fn recovery_sent(&self) -> &str {
        &self.recovery_sent
    }
}

fn owned_table<K: Copy + Eq + Hash>(table: &[(K, &str)]) -> HashMap<K, String> {
    table.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_step_and_field_has_a_message_in_both_locales() {
        for locale in [Locale::En, Locale::Ar] {
            let catalog = MessageCatalog::new(locale);
            for step in StepId::ALL {
                assert_ne!(catalog.step(step), catalog.submission_failed(), "{step}");
            }
            for field in FieldKey::ALL {
                assert_ne!(catalog.required(field), catalog.submission_failed());
                assert_ne!(catalog.label(field), field.as_str());
            }
        }
    }

    #[test]
    fn overrides_replace_step_messages() {
        let overrides = BTreeMap::from([("email".to_string(), "Bad email".to_string())]);
        let catalog = MessageCatalog::default()
            .with_overrides(&overrides)
            .expect("valid overrides");
        assert_eq!(catalog.step(StepId::Email), "Bad email");
        assert_eq!(catalog.step(StepId::Name), "Please enter your full name");
    }

    #[test]
    fn unknown_override_step_is_rejected() {
        let overrides = BTreeMap::from([("captcha".to_string(), "x".to_string())]);
        let err = MessageCatalog::default()
            .with_overrides(&overrides)
            .expect_err("unknown step");
        assert_eq!(err, WizardError::UnknownStepOverride("captcha".into()));
    }

    #[test]
    fn parses_locales() {
        assert_eq!("AR".parse::<Locale>(), Ok(Locale::Ar));
        assert_eq!("english".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }
}
