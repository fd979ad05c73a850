use anyhow::{Context, Result};
use artifactor::catalog::ArtifactKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "artifactor")]
#[command(
    version,
    about = "Generate runnable web artifacts with an LLM and preview them in containers"
)]
pub struct Cli {
    /// Also log to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding .artifactor/artifactor.toml (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one artifact from a prompt and launch it
    Generate {
        /// Artifact type
        #[arg(short, long, value_enum, default_value = "static")]
        kind: ArtifactKind,

        /// Use the local model profile
        #[arg(long)]
        local: bool,

        /// Open the artifact in a browser once it is serving
        #[arg(long)]
        open: bool,

        /// Do not wait for the artifact's server to answer
        #[arg(long)]
        no_wait: bool,

        /// What to build
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Interactive session: refine an artifact over several prompts
    Chat {
        /// Artifact type to start with
        #[arg(short, long, value_enum, default_value = "streamlit")]
        kind: ArtifactKind,

        /// Start with the local model profile
        #[arg(long)]
        local: bool,
    },
    /// Stop and remove the container serving an artifact type
    Stop {
        #[arg(short, long, value_enum)]
        kind: ArtifactKind,
    },
    /// Save the working directory of a running artifact as a tar archive
    Download {
        #[arg(short, long, value_enum)]
        kind: ArtifactKind,

        #[arg(short, long, default_value = "project.tar")]
        output: PathBuf,
    },
    /// List artifact types and how they are launched
    Kinds,
    /// View, validate or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default artifactor.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    if let Err(e) = artifactor::logging::init(cli.verbose) {
        artifactor::ui::warning(format!("Logging disabled: {:#}", e));
    }

    match &cli.command {
        Commands::Generate {
            kind,
            local,
            open,
            no_wait,
            prompt,
        } => {
            let options = cmd::GenerateOptions {
                kind: *kind,
                local: *local,
                open: *open,
                wait: !*no_wait,
            };
            cmd::cmd_generate(&project_dir, &cli, options, &prompt.join(" ")).await?;
        }
        Commands::Chat { kind, local } => {
            cmd::cmd_chat(&project_dir, &cli, *kind, *local).await?;
        }
        Commands::Stop { kind } => cmd::cmd_stop(&project_dir, &cli, *kind).await?,
        Commands::Download { kind, output } => {
            cmd::cmd_download(&project_dir, &cli, *kind, output).await?
        }
        Commands::Kinds => cmd::cmd_kinds(&project_dir, &cli)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
