//! Interactive session: `artifactor chat`.

use anyhow::{Result, bail};
use console::style;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use std::path::{Path, PathBuf};

use artifactor::catalog::{ArtifactKind, Catalog};
use artifactor::runtime::StopOutcome;
use artifactor::session::{ResetReport, Session};
use artifactor::turn::TurnRunner;
use artifactor::ui::{self, StdoutSink, icons};

use super::super::Cli;

const DEFAULT_ARCHIVE: &str = "project.tar";

/// One line of chat input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Prompt(String),
    Kind(ArtifactKind),
    Local(bool),
    Reset,
    Download(PathBuf),
    Status,
    Help,
    Quit,
    Empty,
}

pub fn parse_input(line: &str) -> Result<ChatInput> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ChatInput::Empty);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(ChatInput::Prompt(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name.to_lowercase().as_str() {
        "kind" => {
            if arg.is_empty() {
                bail!("Usage: /kind <streamlit|vue|static|svg>");
            }
            Ok(ChatInput::Kind(arg.parse()?))
        }
        "local" => match arg.to_lowercase().as_str() {
            "on" | "true" | "yes" => Ok(ChatInput::Local(true)),
            "off" | "false" | "no" => Ok(ChatInput::Local(false)),
            _ => bail!("Usage: /local on|off"),
        },
        "reset" => Ok(ChatInput::Reset),
        "download" => Ok(ChatInput::Download(PathBuf::from(if arg.is_empty() {
            DEFAULT_ARCHIVE
        } else {
            arg
        }))),
        "status" => Ok(ChatInput::Status),
        "help" | "?" => Ok(ChatInput::Help),
        "quit" | "exit" | "q" => Ok(ChatInput::Quit),
        other => bail!("Unknown command '/{}'. Type /help for the list.", other),
    }
}

fn print_help() {
    println!();
    println!("Type a prompt to generate or refine the artifact. Commands:");
    println!("  /kind <type>       switch artifact type (before the first prompt or after /reset)");
    println!("  /local on|off      use the local or remote model");
    println!("  /reset             stop the container and start a new conversation");
    println!("  /download [path]   save the running artifact's files (default {})", DEFAULT_ARCHIVE);
    println!("  /status            show the session state");
    println!("  /quit              stop the container and exit");
    println!();
}

fn print_status(session: &Session) {
    println!();
    println!("  type:      {}", session.kind());
    println!(
        "  model:     {}",
        if session.local_mode() { "local" } else { "remote" }
    );
    println!(
        "  selector:  {}",
        if session.selector_locked() {
            "locked"
        } else {
            "unlocked"
        }
    );
    println!("  turns:     {}", session.conversation().len() / 2);
    match session.artifact_path() {
        Some(path) => println!("  artifact:  {}", path.display()),
        None => println!("  artifact:  none"),
    }
    match session.container() {
        Some(c) => println!("  container: {} ({}) at {}", c.name, c.short_id(), c.address()),
        None => println!("  container: none"),
    }
    println!();
}

fn print_reset(report: &ResetReport) {
    match report.stopped {
        Some(StopOutcome::Removed) => ui::success(format!("{}Container stopped", icons::STOP)),
        Some(StopOutcome::NotFound) => ui::info("Container was already gone"),
        None => {}
    }
    for warning in &report.warnings {
        ui::warning(warning);
    }
}

async fn handle_prompt(
    runner: &TurnRunner,
    session: &mut Session,
    config: &artifactor::config::ArtifactorConfig,
    prompt: &str,
) {
    let mut sink = StdoutSink::new();
    let result = runner.run_turn(session, prompt, &mut sink).await;
    sink.finish();
    match result {
        Ok(outcome) => super::present_outcome(config, &outcome, true, false).await,
        Err(e) => ui::error(e.to_string()),
    }
}

pub async fn cmd_chat(project_dir: &Path, cli: &Cli, kind: ArtifactKind, local: bool) -> Result<()> {
    let config = super::load_config(project_dir, cli)?;
    let catalog: Catalog = config.catalog();
    let runner = super::build_runner(&config)?;
    let mut session = Session::new(catalog.spec(kind), local);
    let theme = ColorfulTheme::default();

    println!();
    println!(
        "{}{} Type /help for commands.",
        icons::SPARKLE,
        style("artifactor chat").bold()
    );
    println!();

    loop {
        let label = format!(
            "{}{}",
            session.kind(),
            if session.local_mode() { " (local)" } else { "" }
        );
        let line = match Input::<String>::with_theme(&theme)
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            // Ctrl-D or a closed stdin ends the session.
            Err(_) => break,
        };

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(e) => {
                ui::error(e.to_string());
                continue;
            }
        };

        match input {
            ChatInput::Empty => {}
            ChatInput::Prompt(prompt) => {
                handle_prompt(&runner, &mut session, &config, &prompt).await
            }
            ChatInput::Kind(kind) => match session.select_kind(catalog.spec(kind)) {
                Ok(()) => ui::success(format!("Artifact type set to {}", kind.label())),
                Err(e) => ui::error(e.to_string()),
            },
            ChatInput::Local(local) => {
                session.set_local_mode(local);
                ui::info(format!(
                    "Using {}",
                    runner.models().select(local).describe()
                ));
            }
            ChatInput::Reset => {
                let report = session.reset(runner.lifecycle()).await;
                print_reset(&report);
                ui::success(format!("{}Session reset", icons::RESET));
            }
            ChatInput::Download(path) => match session.download(runner.lifecycle()).await {
                Ok(bytes) => match std::fs::write(&path, &bytes) {
                    Ok(()) => ui::success(format!(
                        "{}Saved {} bytes to {}",
                        icons::DOWNLOAD,
                        bytes.len(),
                        path.display()
                    )),
                    Err(e) => ui::error(format!("Failed to write {}: {}", path.display(), e)),
                },
                Err(e) => ui::error(e.to_string()),
            },
            ChatInput::Status => print_status(&session),
            ChatInput::Help => print_help(),
            ChatInput::Quit => break,
        }
    }

    let report = session.reset(runner.lifecycle()).await;
    print_reset(&report);
    Ok(())
}
