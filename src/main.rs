use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use ledgerguard::config::{load_config, print_schema, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use ledgerguard::guard::GuardDecision;
use ledgerguard::models::{Credentials, Registration};
use ledgerguard::state::App;
use ledgerguard::transport::Navigator;
use ledgerguard::utils::logger::init_logging;
use ledgerguard::{errors::TransportError, startup};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to load config: {0}")]
    Config(#[from] Box<figment::Error>),
    #[error("{0}")]
    Logging(String),
    #[error("failed to build client: {0}")]
    Startup(#[from] TransportError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Parser, Debug)]
#[command(name = "ledgerguard", about = "Session and login client for the finance API")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

/// Every invocation is a fresh tab: empty session tier, shared durable tier.
#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configuration JSON schema.
    Schema,
    /// Restore the session from storage and print it.
    Status,
    Login {
        username: String,
        password: String,
        #[arg(long)]
        remember: bool,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
    Logout,
    /// Run a route transition through the guard.
    Navigate { path: String },
}

fn print_session(app: &App) -> Result<(), CliError> {
    let personality = app
        .session
        .preferences()
        .and_then(|p| p.current_personality_id());
    let out = json!({
        "session": app.session.snapshot(),
        "username": app.session.username(),
        "remembered": app.tokens.is_remembered(),
        "personality_id": personality,
        "location": app.location.current(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Schema = cli.command {
        return Ok(print_schema()?);
    }

    let config = load_config(&cli.config).map_err(Box::new)?;
    init_logging(&config.logging).map_err(CliError::Logging)?;
    let app = startup::build(config)?;

    match cli.command {
        Command::Schema => {}
        Command::Status => {
            app.session.check_auth().await;
            print_session(&app)?;
        }
        Command::Login {
            username,
            password,
            remember,
        } => {
            let ok = app
                .session
                .login(&Credentials::new(username, password), remember)
                .await;
            print_session(&app)?;
            if !ok {
                return Err(CliError::Rejected(app.session.error().unwrap_or_default()));
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let ok = app
                .session
                .register(&Registration::new(username, email, password))
                .await;
            print_session(&app)?;
            if !ok {
                return Err(CliError::Rejected(app.session.error().unwrap_or_default()));
            }
        }
        Command::Logout => {
            app.session.logout();
            print_session(&app)?;
        }
        Command::Navigate { path } => {
            let decision = app.navigate(&path).await;
            let (allowed, location) = match decision {
                GuardDecision::Allow => (true, app.location.current()),
                GuardDecision::Redirect(target) => (false, target),
            };
            let out = json!({
                "allowed": allowed,
                "location": location,
                "history": app.location.history(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
