//! Line-oriented front-end: prompts for each step's fields and feeds the
//! wizard.

use std::sync::Arc;

use anyhow::Result;
use shared::domain::{Destination, FieldKey, FieldKind};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, Lines};
use tracing::info;
use wizard_core::{AdvanceOutcome, Completion, FieldEdit, Navigator, Wizard, WizardError};

pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, destination: Destination) {
        info!(%destination, "navigation requested");
        println!("-> {destination}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Back,
    Cancel,
    Quit,
    Value(String),
}

pub fn parse_command(line: &str) -> Command {
    match line.trim() {
        ":back" => Command::Back,
        ":cancel" => Command::Cancel,
        ":quit" | ":q" => Command::Quit,
        _ => Command::Value(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

pub fn parse_choice(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "y" | "yes" | "نعم" => Some(true),
        "n" | "no" | "لا" => Some(false),
        _ => None,
    }
}

pub fn edit_for(field: FieldKey, raw: &str) -> Option<FieldEdit> {
    match field.kind() {
        FieldKind::Choice => Some(FieldEdit::WantsNotifications(parse_choice(raw))),
        FieldKind::Text => FieldEdit::text(field, raw),
    }
}

/// Reads fields that must not be echoed back to the terminal.
pub trait SecretPrompt {
    fn read_secret(&mut self, label: &str) -> Result<String>;
}

/// Hidden input on the controlling terminal.
pub struct HiddenPrompt;

impl SecretPrompt for HiddenPrompt {
    fn read_secret(&mut self, label: &str) -> Result<String> {
        let value = tokio::task::block_in_place(|| {
            dialoguer::Password::new()
                .with_prompt(label)
                .allow_empty_password(true)
                .interact()
        })?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    Completed,
    Quit,
}

/// Drives `wizard` until it completes, the user quits, or input ends.
/// Secret fields go through `secrets` when one is given.
pub async fn run<R, W>(
    wizard: Arc<Wizard>,
    lines: &mut Lines<R>,
    out: &mut W,
    mut secrets: Option<&mut dyn SecretPrompt>,
) -> Result<RunResult>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let messages = wizard.messages().clone();

    'steps: loop {
        let snap = wizard.snapshot().await;
        if snap.completed {
            return Ok(RunResult::Completed);
        }

        out.write_all(
            format!(
                "\n[{}/{}] {}\n",
                snap.step_index + 1,
                snap.step_count,
                snap.step
            )
            .as_bytes(),
        )
        .await?;

        let fields = wizard
            .flow()
            .step_at(snap.step_index)
            .map(|step| step.rule.fields())
            .unwrap_or_default();

        for field in fields {
            let hint = match field.kind() {
                FieldKind::Choice => " (y/n)",
                FieldKind::Text => "",
            };
            let line = match secrets.as_mut() {
                Some(prompt) if field.is_secret() => {
                    out.flush().await?;
                    prompt.read_secret(messages.label(field))?
                }
                _ => {
                    out.write_all(format!("{}{hint}: ", messages.label(field)).as_bytes())
                        .await?;
                    out.flush().await?;
                    let Some(line) = lines.next_line().await? else {
                        return Ok(RunResult::Quit);
                    };
                    line
                }
            };
            match parse_command(&line) {
                Command::Quit => return Ok(RunResult::Quit),
                Command::Cancel => {
                    wizard.cancel().await?;
                    out.write_all(b"cancelled\n").await?;
                    continue 'steps;
                }
                Command::Back => {
                    match wizard.retreat().await {
                        Ok(_) => {}
                        Err(err @ WizardError::RetreatNotSupported(_)) => {
                            out.write_all(format!("{err}\n").as_bytes()).await?;
                        }
                        Err(err) => return Err(err.into()),
                    }
                    continue 'steps;
                }
                Command::Value(raw) => {
                    if let Some(edit) = edit_for(field, &raw) {
                        wizard.set_field(edit).await?;
                    }
                }
            }
        }

        if snap.is_terminal() {
            out.write_all(b"submitting...\n").await?;
            out.flush().await?;
        }

        match wizard.advance().await {
            AdvanceOutcome::Advanced(_) | AdvanceOutcome::Busy => {}
            AdvanceOutcome::Invalid(_) | AdvanceOutcome::SubmissionFailed => {
                let snap = wizard.snapshot().await;
                if let Some(error) = snap.error {
                    out.write_all(format!("! {error}\n").as_bytes()).await?;
                }
                for (field, message) in snap.field_errors {
                    out.write_all(format!("  - {}: {message}\n", messages.label(field)).as_bytes())
                        .await?;
                }
            }
            AdvanceOutcome::Submitted(Completion::Navigate(_)) | AdvanceOutcome::AlreadyCompleted => {
                return Ok(RunResult::Completed);
            }
            AdvanceOutcome::Submitted(Completion::Notice) => {
                if let Some(notice) = wizard.snapshot().await.notice {
                    out.write_all(format!("{notice}\n").as_bytes()).await?;
                }
                return Ok(RunResult::Completed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use storage::{load_session, MemoryStore};
    use tokio::io::{AsyncBufReadExt, BufReader};
    use wizard_core::{
        FlowDefinition, MessageCatalog, MockAuthService, RecordingNavigator, RetreatPolicy,
        SubmissionGateway,
    };

    use super::*;

    fn wizard_for(
        flow: FlowDefinition,
        store: Arc<MemoryStore>,
    ) -> (Arc<Wizard>, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new());
        let gateway = SubmissionGateway::new(
            Arc::new(MockAuthService::new(Duration::ZERO)),
            store,
        );
        let wizard = Wizard::new(flow, MessageCatalog::default(), gateway, navigator.clone())
            .expect("wizard");
        (Arc::new(wizard), navigator)
    }

    async fn drive(wizard: Arc<Wizard>, input: &str) -> (RunResult, String) {
        let mut lines = BufReader::new(input.as_bytes()).lines();
        let mut out = Vec::new();
        let result = run(wizard, &mut lines, &mut out, None).await.expect("run");
        (result, String::from_utf8(out).expect("utf8"))
    }

    /// Hands out canned secrets and remembers which labels asked for one.
    #[derive(Default)]
    struct CannedSecrets {
        answers: Vec<String>,
        asked: Vec<String>,
    }

    impl SecretPrompt for CannedSecrets {
        fn read_secret(&mut self, label: &str) -> Result<String> {
            self.asked.push(label.to_string());
            Ok(self.answers.remove(0))
        }
    }

    #[test]
    fn parses_commands_and_choices() {
        assert_eq!(parse_command(" :back "), Command::Back);
        assert_eq!(parse_command(":q"), Command::Quit);
        assert_eq!(parse_command("sara"), Command::Value("sara".into()));
        assert_eq!(parse_choice("Yes"), Some(true));
        assert_eq!(parse_choice("لا"), Some(false));
        assert_eq!(parse_choice("maybe"), None);
    }

    #[tokio::test]
    async fn signup_session_with_one_typo() {
        let store = Arc::new(MemoryStore::new());
        let (wizard, navigator) = wizard_for(FlowDefinition::signup(), store.clone());
        let input = "Sara Ali\nsara-at-example\nsara@example.com\ny\nabc123\nabc123\n";

        let (result, out) = drive(wizard, input).await;
        assert_eq!(result, RunResult::Completed);
        assert!(out.contains("! Please enter a valid email address"));
        assert_eq!(navigator.visits(), vec![Destination::Home]);
        let session = load_session(store.as_ref()).await.expect("load").expect("session");
        assert_eq!(session.profile.and_then(|p| p.wants_notifications), Some(true));
    }

    #[tokio::test]
    async fn passwords_are_read_without_echo() {
        let store = Arc::new(MemoryStore::new());
        let (wizard, navigator) = wizard_for(FlowDefinition::signup(), store);
        let mut secrets = CannedSecrets {
            answers: vec!["hunter22".into(), "hunter22".into()],
            ..CannedSecrets::default()
        };
        let input = "Sara Ali\nsara@example.com\nn\n";
        let mut lines = BufReader::new(input.as_bytes()).lines();
        let mut out = Vec::new();

        let result = run(wizard, &mut lines, &mut out, Some(&mut secrets))
            .await
            .expect("run");
        let out = String::from_utf8(out).expect("utf8");

        assert_eq!(result, RunResult::Completed);
        assert_eq!(secrets.asked, vec!["Password", "Confirm password"]);
        assert!(!out.contains("hunter22"));
        assert!(!out.contains("Password:"));
        assert_eq!(navigator.visits(), vec![Destination::Home]);
    }

    #[tokio::test]
    async fn login_lists_missing_fields() {
        let store = Arc::new(MemoryStore::new());
        let (wizard, _) = wizard_for(FlowDefinition::login(), store);
        let (result, out) = drive(wizard, "\n\n:quit\n").await;
        assert_eq!(result, RunResult::Quit);
        assert!(out.contains("  - Email: Please enter your email"));
        assert!(out.contains("  - Password: Please enter your password"));
    }

    #[tokio::test]
    async fn back_is_refused_when_flow_disallows_it() {
        let store = Arc::new(MemoryStore::new());
        let (wizard, _) = wizard_for(FlowDefinition::signup(), store);
        let (_, out) = drive(wizard, "Sara\n:back\n").await;
        assert!(out.contains("does not support going back"));
    }

    #[tokio::test]
    async fn back_returns_to_previous_step_when_allowed() {
        let store = Arc::new(MemoryStore::new());
        let flow = FlowDefinition::signup().with_retreat(RetreatPolicy::PreviousStep);
        let (wizard, _) = wizard_for(flow, store);
        let (_, out) = drive(wizard.clone(), "Sara\n:back\n").await;
        assert!(out.contains("[2/4] email"));
        assert_eq!(out.matches("[1/4] name").count(), 2);
    }

    #[tokio::test]
    async fn forgot_password_prints_notice() {
        let store = Arc::new(MemoryStore::new());
        let (wizard, navigator) = wizard_for(FlowDefinition::forgot_password(), store);
        let (result, out) = drive(wizard, "sara@example.com\n").await;
        assert_eq!(result, RunResult::Completed);
        assert!(out.contains("The email was sent successfully"));
        assert!(navigator.visits().is_empty());
    }
}
