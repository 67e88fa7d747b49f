use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::domain::StudentProfile;
use storage::{
    clear_session, load_session, prepare_database_url, save_session,
    session::ACCESS_TOKEN_KEY, SqliteStore, DEFAULT_DATABASE_URL,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = DEFAULT_DATABASE_URL)]
    store_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored session with the token masked.
    Show,
    /// Remove the stored token and profile.
    Clear,
    /// Ping the store and fail if nobody is signed in.
    Check,
    /// List every key in the store.
    Keys,
    /// Store a session directly, bypassing the wizards.
    Seed {
        token: String,
        email: String,
        #[arg(long)]
        full_name: Option<String>,
    },
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();
    let store = SqliteStore::new(&prepare_database_url(&cli.store_url)?).await?;

    match cli.command {
        Command::Show => match load_session(&store).await? {
            Some(session) => {
                println!("access_token={}", mask_token(&session.access_token));
                if let Some(saved_at) = store.updated_at(ACCESS_TOKEN_KEY).await? {
                    println!("saved_at={}", saved_at.to_rfc3339());
                }
                match session.profile {
                    Some(profile) => println!("profile={}", serde_json::to_string(&profile)?),
                    None => println!("profile=<none>"),
                }
            }
            None => println!("no session stored"),
        },
        Command::Clear => {
            clear_session(&store).await?;
            println!("session cleared");
        }
        Command::Check => {
            store.health_check().await?;
            if load_session(&store).await?.is_none() {
                bail!("store is healthy but no session is stored");
            }
            println!("ok");
        }
        Command::Keys => {
            for key in store.keys().await? {
                println!("{key}");
            }
        }
        Command::Seed {
            token,
            email,
            full_name,
        } => {
            let profile = StudentProfile {
                email,
                full_name,
                wants_notifications: None,
            };
            save_session(&store, &token, Some(&profile)).await?;
            println!("session stored");
        }
    }

    Ok(())
}
