//! `inotes` - notes kept in the Notes folder of an IMAP account.
//!
//! Built on `inotes-core`; one connection per invocation.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod logging;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{Dispatch, debug, error, info, warn};

use cli::{Action, Cli};
use inotes_core::{Config, ConfigError, NoteRepository};

const DEFAULT_CONFIG_FILE: &str = "inotes.conf";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let action = cli.action().unwrap_or_else(|e| e.exit());
    let dispatch = logging::install(cli.debug);
    debug!("debug mode");

    let outcome = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")
        .and_then(|runtime| runtime.block_on(run(cli.config.as_deref(), action, dispatch)));

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Option<&Path>, action: Action, dispatch: Dispatch) -> Result<()> {
    let path = config_path(config)?;
    debug!(path = %path.display(), "configuration file");

    let config = Config::load(&path).map_err(|e| match e {
        ConfigError::NotFound { .. } => {
            anyhow!("{e}. Use the -c switch to provide a valid configuration.")
        }
        other => anyhow!(other),
    })?;

    let notes = NoteRepository::new(&config).with_dispatch(dispatch);

    match action {
        Action::Count => {
            let count = notes.count_notes().await?;
            debug!(count, "found notes");
            println!("{count}");
        }
        Action::List => {
            let mut cursor = notes.list_notes().await?;
            let mut listed = Ok(());
            while let Some(next) = cursor.next_subject().await {
                match next {
                    Ok(subject) => println!("{subject}"),
                    Err(e) => {
                        listed = Err(e);
                        break;
                    }
                }
            }
            let closed = cursor.close().await;
            listed.and(closed)?;
        }
        Action::Search { query, strip_html } => {
            let found = notes.search_notes(&query, strip_html).await?;
            debug!(matches = found.len(), "notes matching query");
            for note in found {
                println!("Subject: {}\n---\n{}", note.subject, note.body);
            }
        }
        Action::Create { subject, format } => {
            let body = read_body().await?;
            notes.create_note(&subject, &body, format).await?;
        }
        Action::Delete(ids) => {
            let report = notes.delete_notes(&ids).await?;
            for (id, e) in &report.failed {
                warn!(id = id.get(), error = %e, "note not deleted");
            }
            info!(deleted = report.expunged.len(), "delete complete");
            if !report.is_complete() {
                bail!(
                    "{} of {} notes could not be deleted",
                    report.failed.len(),
                    ids.len()
                );
            }
        }
    }

    Ok(())
}

fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => dirs::home_dir()
            .map(|home| home.join(DEFAULT_CONFIG_FILE))
            .context("cannot find the home directory; use -c to name a configuration file"),
    }
}

async fn read_body() -> Result<String> {
    if std::io::stdin().is_terminal() {
        info!("Type your note and exit with CTRL-D");
    }

    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .context("cannot read the note body from stdin")?;
    Ok(body)
}
