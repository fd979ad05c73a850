//! CLI command implementations.
//!
//! | Module      | Commands handled       |
//! |-------------|------------------------|
//! | `generate`  | `Generate`             |
//! | `chat`      | `Chat`                 |
//! | `container` | `Stop`, `Download`     |
//! | `catalog`   | `Kinds`                |
//! | `config`    | `Config`               |
//!
//! Shared wiring (config loading, runtime and model construction, turn
//! reporting) lives here.

pub mod catalog;
pub mod chat;
pub mod config;
pub mod container;
pub mod generate;

pub use catalog::cmd_kinds;
pub use chat::cmd_chat;
pub use config::cmd_config;
pub use container::{cmd_download, cmd_stop};
pub use generate::{GenerateOptions, cmd_generate};

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;

use artifactor::config::ArtifactorConfig;
use artifactor::lifecycle::LifecycleManager;
use artifactor::llm::{ModelRouter, OpenAiClient};
use artifactor::materialize::Materializer;
use artifactor::preview::{self, Readiness};
use artifactor::runtime::DockerRuntime;
use artifactor::turn::{TurnOutcome, TurnRunner};
use artifactor::ui::{self, StepSpinner, icons};

use super::Cli;

pub(crate) fn load_config(project_dir: &Path, cli: &Cli) -> Result<ArtifactorConfig> {
    let config = ArtifactorConfig::with_cli_args(project_dir.to_path_buf(), cli.verbose)?;
    for warning in config.validate() {
        ui::warning(format!("Config: {}", warning));
    }
    Ok(config)
}

pub(crate) fn connect_lifecycle(config: &ArtifactorConfig) -> Result<LifecycleManager> {
    let runtime = DockerRuntime::connect(config.runtime_timeout())
        .context("Failed to set up the Docker client")?;
    Ok(
        LifecycleManager::new(Arc::new(runtime), config.container_workdir())
            .reclaiming(Materializer::new(config.temp_root())),
    )
}

pub(crate) fn build_runner(config: &ArtifactorConfig) -> Result<TurnRunner> {
    let local = OpenAiClient::new(config.model_profile(true))
        .context("Failed to create the local model client")?;
    let remote = OpenAiClient::new(config.model_profile(false))
        .context("Failed to create the remote model client")?;
    let models = ModelRouter::new(Arc::new(local), Arc::new(remote));

    Ok(TurnRunner::new(
        models,
        connect_lifecycle(config)?,
        Materializer::new(config.temp_root()),
    ))
}

/// Print where the artifact went and, if it was launched, wait for it and
/// optionally open it.
pub(crate) async fn present_outcome(
    config: &ArtifactorConfig,
    outcome: &TurnOutcome,
    wait: bool,
    open: bool,
) {
    if let Some(warning) = &outcome.stop_warning {
        ui::warning(format!("Previous container was not stopped cleanly: {}", warning));
    }

    let Some(container) = &outcome.container else {
        if let Some(path) = &outcome.artifact_path {
            eprintln!("{}Artifact written to {}", icons::FOLDER, path.display());
        }
        return;
    };

    ui::success(format!(
        "{}Container {} started ({})",
        icons::CONTAINER,
        style(&container.name).cyan(),
        container.short_id()
    ));

    let url = container.address();
    if wait {
        let spinner = StepSpinner::start(format!("Waiting for {} to answer", url));
        let client = reqwest::Client::new();
        match preview::wait_until_ready(
            &client,
            &url,
            config.ready_timeout(),
            config.poll_interval(),
        )
        .await
        {
            Readiness::Ready(elapsed) => {
                spinner.succeed(format!("Serving after {:.1}s", elapsed.as_secs_f64()))
            }
            Readiness::TimedOut => spinner.fail(format!(
                "No answer within {}s; the server may still be starting",
                config.ready_timeout().as_secs()
            )),
        }
    }

    println!("{}{}", icons::GLOBE, style(&url).underlined());

    if (open || config.toml.preview.open_browser)
        && let Err(e) = preview::open_in_browser(&url)
    {
        ui::warning(format!("Could not open a browser: {}", e));
    }
}
