//! One-shot generation: `artifactor generate`.

use anyhow::{Context, Result, bail};
use std::path::Path;

use artifactor::catalog::ArtifactKind;
use artifactor::session::Session;
use artifactor::ui::{self, StdoutSink, icons};

use super::super::Cli;

#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub kind: ArtifactKind,
    pub local: bool,
    pub open: bool,
    pub wait: bool,
}

pub async fn cmd_generate(
    project_dir: &Path,
    cli: &Cli,
    options: GenerateOptions,
    prompt: &str,
) -> Result<()> {
    if prompt.trim().is_empty() {
        bail!("Prompt must not be empty");
    }

    let config = super::load_config(project_dir, cli)?;
    let runner = super::build_runner(&config)?;
    let mut session = Session::new(config.catalog().spec(options.kind), options.local);

    ui::info(format!(
        "Generating a {} artifact with {}",
        options.kind.label(),
        runner.models().select(options.local).describe()
    ));

    let mut sink = StdoutSink::new();
    let result = runner.run_turn(&mut session, prompt, &mut sink).await;
    sink.finish();
    let outcome = result.context("Generation failed")?;

    super::present_outcome(&config, &outcome, options.wait, options.open).await;

    // Removed by the next stop or relaunch of this container.
    if let Some(artifact) = session.take_artifact() {
        let path = artifact.persist();
        eprintln!("{}Files kept at {}", icons::FOLDER, path.display());
    }
    if let Some(container) = &outcome.container {
        eprintln!(
            "Stop it with: {}",
            console::style(format!("artifactor stop --kind {}", options.kind)).bold()
        );
        tracing::info!(container = %container.name, "generate finished");
    }

    Ok(())
}
