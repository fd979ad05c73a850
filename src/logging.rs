//! Tracing setup: a non-blocking file log under the XDG state directory,
//! plus stderr output when `--verbose` is given.
//!
//! `RUST_LOG` controls the filter; the default is `info`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const APP_DIR: &str = "artifactor";
const LOG_FILE: &str = "artifactor.log";

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) -> Result<PathBuf> {
    let log_path = determine_log_path(std::env::var("XDG_STATE_HOME").ok(), dirs::home_dir())?;
    if GUARD.get().is_some() {
        return Ok(log_path);
    }

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory at {}", parent.display()))?;
    }

    let (directory, file_name) = split_path(&log_path)?;
    let file_appender = rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    let _ = GUARD.set(guard);
    Ok(log_path)
}

fn determine_log_path(state_home: Option<String>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(state_home) = state_home
        && !state_home.is_empty()
    {
        return Ok(PathBuf::from(state_home).join(APP_DIR).join(LOG_FILE));
    }

    if let Some(home_dir) = home {
        return Ok(home_dir
            .join(".local")
            .join("state")
            .join(APP_DIR)
            .join(LOG_FILE));
    }

    Ok(std::env::current_dir()?.join(LOG_FILE))
}

fn split_path(path: &Path) -> Result<(PathBuf, &str)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid log file name"))?;

    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok((dir, file_name))
}
