//! Postern account console
//!
//! Line-oriented driver for the identity backend: register and verify
//! accounts, hold a session, and exercise the authenticated request
//! pipeline. The process holds one session store and one refresher, so
//! every command sees the same credential and concurrent refreshes
//! coalesce.

mod commands;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use postern_client::{
    ApiClient, AuthedClient, Refresher, VerifyFlow, VerifyState, logout, validate,
};
use postern_session::SessionStore;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Command;
use crate::config::Config;

type InputLines = Lines<BufReader<Stdin>>;

struct Console {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    refresher: Arc<Refresher>,
    authed: AuthedClient,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting postern account console");

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = config_arg(&args);

    // An explicitly named config file must exist; the default path may not
    let explicit_path = cli_config_path.is_some() || std::env::var("CONFIG_PATH").is_ok();
    let config_path = Config::resolve_path(cli_config_path);
    let config = if explicit_path || config_path.exists() {
        info!(path = %config_path.display(), "loading configuration");
        Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        info!("no config file found, using defaults");
        Config::from_defaults()?
    };

    info!(
        base_url = %config.backend.base_url,
        timeout_secs = config.backend.timeout_secs,
        "configuration loaded"
    );

    let api = Arc::new(ApiClient::new(
        config.backend.base_url.clone(),
        config.timeout(),
    )?);
    let session = Arc::new(SessionStore::new());
    let refresher = Arc::new(Refresher::new(Arc::clone(&api), Arc::clone(&session)));
    let authed = AuthedClient::new(
        Arc::clone(&api),
        Arc::clone(&session),
        Arc::clone(&refresher),
    );

    // Surface credential transitions in the log, whichever command caused them
    let mut watcher = session.subscribe();
    tokio::spawn(async move {
        while watcher.changed().await.is_ok() {
            if watcher.borrow_and_update().is_some() {
                info!("session credential replaced");
            } else {
                info!("session credential cleared");
            }
        }
    });

    let console = Console {
        api,
        session,
        refresher,
        authed,
    };
    console.run().await
}

impl Console {
    async fn run(&self) -> Result<()> {
        println!("postern account console, type 'help' for commands");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            prompt("> ")?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match commands::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.dispatch(command, &mut lines).await?,
                Err(e) => println!("{e}"),
            }
        }
        println!("bye");
        Ok(())
    }

    async fn dispatch(&self, command: Command, lines: &mut InputLines) -> Result<()> {
        match command {
            Command::Register { email, password } => {
                match self.api.register(&email, &password).await {
                    Ok(()) => println!(
                        "registered; a verification code is on its way, then: verify <subject-id>"
                    ),
                    Err(e) => println!("registration failed: {e}"),
                }
            }
            Command::Login { email, password } => match self.api.login(&email, &password).await {
                Ok(auth) => {
                    self.session.write(auth.access_token);
                    match (auth.user_email, auth.role) {
                        (Some(user_email), Some(role)) => {
                            println!("logged in as {user_email} ({role})");
                        }
                        _ => println!("logged in"),
                    }
                }
                Err(e) => println!("login failed: {e}"),
            },
            Command::Verify { subject_id } => self.verify_loop(subject_id, lines).await?,
            Command::Status { subject_id } => match self.api.check_verification(&subject_id).await
            {
                Ok(true) => println!("account is enabled"),
                Ok(false) => println!("account is not enabled yet"),
                Err(e) => println!("status check failed: {e}"),
            },
            Command::Refresh => match self.refresher.refresh().await {
                Ok(_) => println!("access token refreshed"),
                Err(e) => println!("refresh failed: {e}"),
            },
            Command::Logout => {
                logout(&self.api, &self.session).await;
                println!("logged out");
            }
            Command::Whoami => {
                if self.session.is_authenticated() {
                    println!("session active against {}", self.api.base_url());
                } else {
                    println!("no session; log in or verify an account");
                }
            }
            Command::Demo => match self.authed.get_text("/v1/demo").await {
                Ok(body) => println!("{body}"),
                Err(e) => println!("demo call failed: {e}"),
            },
            Command::Help => println!("{}", commands::help_text()),
            // Quit never reaches dispatch, the read loop breaks on it
            Command::Quit => {}
        }
        Ok(())
    }

    /// Interactive verification: drives the account flow until the subject
    /// is activated, turns out to be enabled already, or the user backs out.
    async fn verify_loop(&self, subject_id: String, lines: &mut InputLines) -> Result<()> {
        let mut flow = VerifyFlow::new(
            Arc::clone(&self.api),
            Arc::clone(&self.session),
            subject_id,
        );
        flow.load().await;

        loop {
            match flow.state() {
                VerifyState::AlreadyEnabled => {
                    println!("account is already enabled; just log in");
                    return Ok(());
                }
                VerifyState::Activated => {
                    println!("account activated and session started");
                    return Ok(());
                }
                VerifyState::PendingInput { error, code_resent } => {
                    if let Some(message) = error {
                        println!("problem: {message}");
                    }
                    if *code_resent {
                        println!("a fresh code was sent; enter it, or 'back'");
                    } else {
                        println!("enter the six-digit code, 'resend', or 'back'");
                    }
                }
                // Transient states settle before control returns here
                VerifyState::Loading | VerifyState::Submitting { .. } => {}
            }

            prompt("verify> ")?;
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            match line.trim() {
                "" => {}
                "back" => return Ok(()),
                "resend" => flow.resend().await,
                raw => match validate::parse_verification_code(raw) {
                    Ok(code) => flow.submit(code).await,
                    Err(e) => println!("{e}"),
                },
            }
        }
    }
}

fn prompt(text: &str) -> Result<()> {
    use std::io::Write;
    print!("{text}");
    std::io::stdout().flush().context("flushing prompt")?;
    Ok(())
}

/// Extract the value following `--config`, if any.
fn config_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
