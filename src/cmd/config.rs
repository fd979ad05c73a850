//! Configuration view and validation commands: `artifactor config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use artifactor::config::{ArtifactorConfig, ArtifactorToml, CONFIG_DIR, CONFIG_FILE};

    let config_dir = project_dir.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Artifactor Configuration");
            println!("========================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                ArtifactorToml::load(&config_path)?
            } else {
                println!("No artifactor.toml found at {}", config_path.display());
                println!("Using default configuration.");
                ArtifactorToml::default()
            };
            println!();

            println!("[runtime]");
            println!("  timeout_secs = {}", toml.runtime.timeout_secs);
            println!(
                "  container_workdir = \"{}\"",
                toml.runtime.container_workdir
            );
            println!();

            println!("[preview]");
            println!("  ready_timeout_secs = {}", toml.preview.ready_timeout_secs);
            println!("  poll_interval_ms = {}", toml.preview.poll_interval_ms);
            println!("  open_browser = {}", toml.preview.open_browser);
            println!();

            if let Some(root) = &toml.workspace.temp_root {
                println!("[workspace]");
                println!("  temp_root = \"{}\"", root.display());
                println!();
            }

            let mut names: Vec<_> = toml.artifacts.keys().collect();
            names.sort();
            for name in names {
                let override_cfg = &toml.artifacts[name];
                println!("[artifacts.{}]", name);
                if let Some(image) = &override_cfg.image {
                    println!("  image = \"{}\"", image);
                }
                if let Some(port) = override_cfg.host_port {
                    println!("  host_port = {}", port);
                }
                println!();
            }

            // Effective values include environment overrides and resolved keys.
            println!("Effective model profiles (with env overrides):");
            let config = ArtifactorConfig::new(project_dir.to_path_buf())?;
            for (label, local) in [("local", true), ("remote", false)] {
                let profile = config.model_profile(local);
                println!(
                    "  {:<6} {} @ {} (api key: {})",
                    label,
                    profile.model,
                    profile.base_url,
                    if profile.api_key.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
            }
            println!();

            if !config_path.exists() {
                println!("Run 'artifactor config init' to create an artifactor.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No artifactor.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = ArtifactorToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("artifactor.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)?;
            }

            let toml = ArtifactorToml::default();
            toml.save(&config_path)?;

            println!("Created artifactor.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [model.local] / [model.remote] base_url, model, api_key_env");
            println!("  - [runtime] timeout_secs, container_workdir");
            println!("  - [preview] ready_timeout_secs, poll_interval_ms, open_browser");
            println!("  - [artifacts.<name>] image, host_port");
            println!();
        }
    }

    Ok(())
}
