use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{AccountFormOptions, FileTokenStore, HttpAccountApi};
use shared::domain::SocialLink;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{ProfileEdits, Session};
use config::Settings;

#[derive(Parser, Debug)]
#[command(name = "account", about = "Manage your account profile from the terminal")]
struct Cli {
    /// Config file (defaults to ./account.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a session token for later commands.
    Login {
        #[arg(long)]
        token: String,
    },
    /// Forget the stored session token.
    Logout,
    /// Print the current account.
    Show,
    /// Update profile fields and social links.
    Save(SaveArgs),
    /// Upload a new profile photo.
    UploadAvatar { path: PathBuf },
    /// Paid rename of an existing username.
    ChangeUsername { name: String },
    /// Pick a username for an account that has none yet.
    SetUsername { name: String },
}

#[derive(clap::Args, Debug, Default)]
struct SaveArgs {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    pronouns: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    telegram: Option<String>,
    /// Append a social link, as LABEL=URL. Repeatable.
    #[arg(long = "social", value_name = "LABEL=URL", value_parser = commands::parse_social)]
    socials: Vec<SocialLink>,
    /// Drop existing social links before appending.
    #[arg(long)]
    clear_socials: bool,
}

impl From<SaveArgs> for ProfileEdits {
    fn from(args: SaveArgs) -> Self {
        Self {
            full_name: args.full_name,
            bio: args.bio,
            pronouns: args.pronouns,
            company: args.company,
            telegram: args.telegram,
            socials: args.socials,
            clear_socials: args.clear_socials,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(commands::exit_code_for(&err))
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let settings = config::load_settings(cli.config.as_deref())?;
    let tokens = Arc::new(FileTokenStore::in_data_dir(&settings.data_dir));

    match cli.command {
        Command::Login { token } => commands::login(&tokens, &token),
        Command::Logout => commands::logout(&tokens),
        Command::Show => commands::show(&session(&settings, tokens)?).await,
        Command::Save(args) => commands::save(&session(&settings, tokens)?, args.into()).await,
        Command::UploadAvatar { path } => {
            commands::upload_avatar(&session(&settings, tokens)?, &path).await
        }
        Command::ChangeUsername { name } => {
            commands::change_username(&session(&settings, tokens)?, &name).await
        }
        Command::SetUsername { name } => {
            commands::set_username(&session(&settings, tokens)?, &name).await
        }
    }
}

fn session(settings: &Settings, tokens: Arc<FileTokenStore>) -> Result<Session> {
    let api = HttpAccountApi::with_timeout(settings.api_base_url.clone(), settings.request_timeout())
        .context("failed to build http client")?;
    debug!(base_url = api.base_url(), "account api client ready");
    Ok(Session {
        api: Arc::new(api),
        tokens,
        options: AccountFormOptions {
            max_avatar_bytes: settings.max_avatar_limit(),
        },
    })
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
