use std::panic;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use taskdeck::{
    api::{ApiClient, HttpTransport},
    auth::{AuthManager, ClientGuard, SessionHandle, SessionState, SessionStore},
    cli::{self, CliContext, RootCommand},
    logging::{init_logging, print_log_location},
    settings::Settings,
    tui,
};

#[derive(Parser, Debug)]
#[command(
    name = "taskdeck",
    about = "Terminal client and kanban board for a personal task API",
    long_about = concat!(
        "Manage tasks from the command line or open the interactive kanban board ",
        "(the default when no command is given).",
    ),
    version,
    author
)]
struct Cli {
    /// Base URL of the task API, overriding TASKDECK_API_URL and settings
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<RootCommand>,
}

enum RunOutcome {
    Continue,
    Exit(i32),
}

#[tokio::main]
async fn main() -> Result<()> {
    let logging = match init_logging() {
        Ok(logging) => Some(logging),
        Err(err) => {
            eprintln!("warning: failed to initialize logging: {err}");
            None
        }
    };
    let log_path = logging.as_ref().map(|(path, _)| path.clone());
    install_panic_hook(log_path.clone());

    let outcome = run_app().await;
    if let Some(path) = log_path.as_ref()
        && !matches!(outcome, Ok(RunOutcome::Exit(_)))
    {
        print_log_location(path);
    }

    match outcome {
        Ok(RunOutcome::Continue) => Ok(()),
        Ok(RunOutcome::Exit(code)) => {
            drop(logging);
            std::process::exit(code);
        }
        Err(err) => Err(err),
    }
}

async fn run_app() -> Result<RunOutcome> {
    let cli = Cli::parse();

    let settings = Settings::load();
    let api_url = settings.resolve_api_url(cli.api_url.as_deref());
    let transport = HttpTransport::new(api_url, settings.request_timeout())?;
    let store = SessionStore::at_default_location()?;
    let client = ApiClient::with_default_chain(transport, SessionHandle::persistent(store));
    let now_unix = Utc::now().timestamp();

    let interactive = match &cli.command {
        None => true,
        Some(RootCommand::Board { command: None }) => !cli.json,
        Some(_) => false,
    };

    if !interactive {
        let Some(command) = cli.command else {
            return Ok(RunOutcome::Continue);
        };
        let context = CliContext {
            client: &client,
            settings: &settings,
            now_unix,
        };
        let code = cli::run(&context, command, cli.json, cli.quiet).await;
        return Ok(RunOutcome::Exit(code));
    }

    let user_label = match AuthManager::new(&client).bootstrap(now_unix).await {
        SessionState::Authenticated(user) => format!("{} <{}>", user.name, user.email),
        SessionState::Anonymous => {
            if let Err(err) = cli::ensure_signed_in(&ClientGuard::new(client.session())) {
                cli::print_error(&err, cli.json);
                return Ok(RunOutcome::Exit(err.exit_code));
            }
            String::new()
        }
    };

    tui::run_board(&client, settings.fetch_limit, user_label)
        .await
        .context("interactive board failed")?;
    Ok(RunOutcome::Continue)
}

fn install_panic_hook(log_path: Option<PathBuf>) {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore_terminal();
        if let Some(path) = log_path.as_ref() {
            eprintln!();
            eprintln!("  Log file: {}", path.display());
            eprintln!();
        }
        previous_hook(panic_info);
    }));
}
