use std::{io::IsTerminal, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::Destination;
use storage::{is_logged_in, prepare_database_url, SqliteStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wizard_core::{
    FlowDefinition, FlowKind, HttpAuthService, Locale, MessageCatalog, MockAuthService,
    Navigator, RetreatPolicy, SubmissionGateway, SubmitService, Wizard,
};

mod config;
mod terminal;

use config::{load_settings, Settings, SubmitMode};
use terminal::{HiddenPrompt, RunResult, SecretPrompt, TerminalNavigator};

#[derive(Parser, Debug)]
#[command(about = "Run a student portal wizard in the terminal")]
struct Args {
    /// signup, login, forgot-password or reset-password
    flow: FlowKind,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    store_url: Option<String>,
    #[arg(long)]
    mode: Option<SubmitMode>,
    #[arg(long)]
    locale: Option<Locale>,
    #[arg(long)]
    reset_token: Option<String>,
    /// Allow `:back` to return to the previous step.
    #[arg(long)]
    allow_back: bool,
    /// Run signup/login even when a session is already stored.
    #[arg(long)]
    force: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.api_base {
            settings.api_base = v.clone();
        }
        if let Some(v) = &self.store_url {
            settings.store_url = v.clone();
        }
        if let Some(v) = self.mode {
            settings.submit_mode = v;
        }
        if let Some(v) = self.locale {
            settings.locale = v;
        }
        if let Some(v) = &self.reset_token {
            settings.reset_token = Some(v.clone());
        }
    }
}

fn submit_service(settings: &Settings) -> Result<Arc<dyn SubmitService>> {
    Ok(match settings.submit_mode {
        SubmitMode::Mock => Arc::new(MockAuthService::new(Duration::from_millis(
            settings.mock_delay_ms,
        ))),
        SubmitMode::Http => {
            let mut service = HttpAuthService::new(&settings.api_base)
                .with_context(|| format!("invalid api base '{}'", settings.api_base))?;
            if let Some(token) = &settings.reset_token {
                service = service.with_reset_token(token.clone());
            }
            Arc::new(service)
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    args.apply(&mut settings);

    let store_url = prepare_database_url(&settings.store_url)?;
    let store = Arc::new(SqliteStore::new(&store_url).await?);
    info!(store = %store_url, mode = %settings.submit_mode, flow = %args.flow, "starting wizard");

    let navigator: Arc<dyn Navigator> = Arc::new(TerminalNavigator);
    if matches!(args.flow, FlowKind::Signup | FlowKind::Login)
        && !args.force
        && is_logged_in(store.as_ref()).await?
    {
        println!("Already signed in.");
        navigator.navigate(Destination::Home);
        return Ok(());
    }

    let messages = MessageCatalog::new(settings.locale).with_overrides(&settings.messages)?;
    let mut flow = FlowDefinition::for_kind(args.flow);
    if args.allow_back {
        flow = flow.with_retreat(RetreatPolicy::PreviousStep);
    }

    let gateway = SubmissionGateway::new(submit_service(&settings)?, store);
    let wizard = Arc::new(Wizard::new(flow, messages, gateway, navigator)?);

    println!("Type :back, :cancel or :quit at any prompt.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut hidden = HiddenPrompt;
    let secrets: Option<&mut dyn SecretPrompt> = if std::io::stdin().is_terminal() {
        Some(&mut hidden)
    } else {
        None
    };
    match terminal::run(wizard, &mut lines, &mut stdout, secrets).await? {
        RunResult::Completed => info!("wizard completed"),
        RunResult::Quit => info!("wizard abandoned"),
    }
    Ok(())
}
