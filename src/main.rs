mod checkpoint;
mod cli;
mod config;
mod error;
mod export;
mod input;
mod lookup;
mod session;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use checkpoint::{CheckpointStore, FileCheckpointStore};
use cli::{Cli, Command};
use config::CheckerConfig;
use error::CheckerError;
use lookup::{HttpProfileClient, LookupError};
use session::{RunOutcome, SessionController};
use ui::RunProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = CheckerConfig::load_from(&cli.config)?;
    if let Some(session) = cli.session {
        config.session = session;
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }
    let store = FileCheckpointStore::new(&config.state_dir);

    match cli.command {
        Command::Run {
            input,
            min_delay,
            max_delay,
            no_resume,
            max_attempts,
            output,
        } => {
            if let Some(secs) = min_delay {
                config.min_delay_secs = secs;
            }
            if let Some(secs) = max_delay {
                config.max_delay_secs = secs;
            }
            if let Some(attempts) = max_attempts {
                config.max_attempts = attempts;
            }
            if no_resume {
                config.resume = false;
            }
            run(&config, &store, &input, output).await?;
        }
        Command::Status => show_status(&config, &store)?,
        Command::Export { output } => export_saved(&config, &store, output)?,
        Command::Clear => {
            store.clear(&config.session).map_err(CheckerError::from)?;
            println!("Cleared session `{}`.", config.session);
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "lastpost=debug" } else { "lastpost=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn export_path(output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| export::default_export_path(Local::now().date_naive()))
}

async fn run(
    config: &CheckerConfig,
    store: &FileCheckpointStore,
    input_path: &Path,
    output: Option<PathBuf>,
) -> Result<(), CheckerError> {
    let identifiers = input::read_identifiers(input_path)?;
    if config.endpoint.is_empty() {
        return Err(CheckerError::Config(
            "no lookup endpoint configured; set `endpoint` in lastpost.toml or LASTPOST_ENDPOINT"
                .into(),
        ));
    }
    let client = HttpProfileClient::new(
        config.endpoint.clone(),
        config.api_key(),
        config.request_timeout(),
    )
    .map_err(|e| match e {
        LookupError::InvalidEndpoint { .. } => CheckerError::Config(e.to_string()),
        other => CheckerError::Lookup(other),
    })?;
    let controller = SessionController::new(&client, store, config.session.clone())
        .with_policy(config.retry_policy())
        .with_checkpoint_interval(config.checkpoint_interval);
    let run_config = config.run_config();

    let cancel = CancellationToken::new();
    let progress = RunProgress::start(identifiers.len());
    let (tx, rx) = mpsc::unbounded_channel();

    let interrupt = {
        let cancel = cancel.clone();
        let progress = progress.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                progress.stopping();
                cancel.cancel();
            }
        })
    };

    let driver = async {
        let tx = tx;
        controller.run(&identifiers, &run_config, &tx, &cancel).await
    };
    let (summary, ()) = tokio::join!(driver, progress.drive(rx));
    interrupt.abort();
    let summary = summary?;

    let path = export_path(output);
    export::export_to_path(&path, &summary.session.results)?;
    match summary.outcome {
        RunOutcome::Completed => println!("Results written to {}.", path.display()),
        RunOutcome::Stopped => println!(
            "Partial results written to {}. Session `{}` saved; run the same command again to resume.",
            path.display(),
            config.session
        ),
    }
    Ok(())
}

fn show_status(config: &CheckerConfig, store: &FileCheckpointStore) -> Result<(), CheckerError> {
    let session = store
        .load(&config.session)?
        .map(checkpoint::Checkpoint::into_session);
    ui::print_session_status(&config.session, session.as_ref());
    Ok(())
}

fn export_saved(
    config: &CheckerConfig,
    store: &FileCheckpointStore,
    output: Option<PathBuf>,
) -> Result<(), CheckerError> {
    let checkpoint = store
        .load(&config.session)?
        .ok_or_else(|| CheckerError::NoSession(config.session.clone()))?;
    let path = export_path(output);
    export::export_to_path(&path, &checkpoint.results)?;
    println!(
        "Exported {} results to {}.",
        checkpoint.results.len(),
        path.display()
    );
    Ok(())
}
