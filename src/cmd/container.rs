//! Container commands: `artifactor stop` and `artifactor download`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use artifactor::catalog::ArtifactKind;
use artifactor::runtime::StopOutcome;
use artifactor::ui::{self, StepSpinner, icons};

use super::super::Cli;

pub async fn cmd_stop(project_dir: &Path, cli: &Cli, kind: ArtifactKind) -> Result<()> {
    let config = super::load_config(project_dir, cli)?;
    let lifecycle = super::connect_lifecycle(&config)?;
    let name = config.catalog().spec(kind).container_name();

    let spinner = StepSpinner::start(format!("Stopping {}", name));
    let outcome = lifecycle.stop(&name).await;
    spinner.clear();

    match outcome.with_context(|| format!("Failed to stop {}", name))? {
        StopOutcome::Removed => ui::success(format!(
            "{}{} stopped and removed",
            icons::STOP,
            style(&name).cyan()
        )),
        StopOutcome::NotFound => ui::info(format!("No container named {} is running", name)),
    }
    Ok(())
}

pub async fn cmd_download(
    project_dir: &Path,
    cli: &Cli,
    kind: ArtifactKind,
    output: &Path,
) -> Result<()> {
    let config = super::load_config(project_dir, cli)?;
    let lifecycle = super::connect_lifecycle(&config)?;
    let name = config.catalog().spec(kind).container_name();

    let bytes = lifecycle
        .archive(&name)
        .await
        .with_context(|| format!("Cannot download files from {}", name))?;
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    ui::success(format!(
        "{}Saved {} bytes from {} to {}",
        icons::DOWNLOAD,
        bytes.len(),
        name,
        output.display()
    ));
    Ok(())
}
