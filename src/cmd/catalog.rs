//! Artifact type listing: `artifactor kinds`.

use anyhow::Result;
use console::style;
use std::path::Path;

use artifactor::catalog::ArtifactKind;

use super::super::Cli;

pub fn cmd_kinds(project_dir: &Path, cli: &Cli) -> Result<()> {
    let catalog = super::load_config(project_dir, cli)?.catalog();

    println!();
    println!(
        "{:<10} {:<18} {:<7} {:<11} {:<34} Address",
        "Type", "Container", "Fence", "File", "Image"
    );
    println!(
        "{:<10} {:<18} {:<7} {:<11} {:<34} -------",
        "----------", "------------------", "-----", "-----------", "----------------------------------"
    );

    for kind in ArtifactKind::ALL {
        let spec = catalog.spec(kind);
        let image = spec
            .launch
            .as_ref()
            .map(|l| l.image.as_str())
            .unwrap_or("-");
        println!(
            "{} {:<18} {:<7} {:<11} {:<34} {}",
            style(format!("{:<10}", kind)).cyan(),
            spec.container_name(),
            spec.fence_tag,
            spec.output_file_name.unwrap_or("-"),
            image,
            spec.address().unwrap_or_else(|| "-".to_string())
        );
    }
    println!();
    Ok(())
}
