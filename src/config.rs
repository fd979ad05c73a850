//! Configuration loaded from `.artifactor/artifactor.toml`.
//!
//! Layered file → environment → CLI. A missing file means defaults.
//!
//! ```toml
//! [model.local]
//! base_url = "http://localhost:11434/v1"
//! model = "llama3.2:3b"
//!
//! [model.remote]
//! base_url = "https://generativelanguage.googleapis.com/v1beta/openai/"
//! model = "gemini-2.0-flash"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [runtime]
//! timeout_secs = 120
//! container_workdir = "/home/runner/app"
//!
//! [preview]
//! ready_timeout_secs = 30
//! poll_interval_ms = 500
//! open_browser = false
//!
//! [workspace]
//! temp_root = "/tmp"
//!
//! [artifacts.streamlit]
//! image = "my-streamlit:dev"
//! host_port = 8501
//! ```
//!
//! Environment overrides: `ARTIFACTOR_LOCAL_BASE_URL`, `ARTIFACTOR_LOCAL_MODEL`,
//! `ARTIFACTOR_REMOTE_BASE_URL`, `ARTIFACTOR_REMOTE_MODEL`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{ArtifactOverride, Catalog, DEFAULT_CONTAINER_WORKDIR};
use crate::llm::ModelProfile;

pub const CONFIG_DIR: &str = ".artifactor";
pub const CONFIG_FILE: &str = "artifactor.toml";

pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_LOCAL_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_REMOTE_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const DEFAULT_REMOTE_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Logical names that `[artifacts.<name>]` can override.
const ARTIFACT_NAMES: [&str; 3] = ["streamlit", "vue", "static"];

/// One model endpoint. Unset fields fall back to the profile's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsSection {
    #[serde(default = "default_local_section")]
    pub local: ModelSection,
    #[serde(default = "default_remote_section")]
    pub remote: ModelSection,
}

fn default_local_section() -> ModelSection {
    ModelSection {
        base_url: Some(DEFAULT_LOCAL_BASE_URL.to_string()),
        model: Some(DEFAULT_LOCAL_MODEL.to_string()),
        api_key_env: None,
    }
}

fn default_remote_section() -> ModelSection {
    ModelSection {
        base_url: Some(DEFAULT_REMOTE_BASE_URL.to_string()),
        model: Some(DEFAULT_REMOTE_MODEL.to_string()),
        api_key_env: Some(DEFAULT_API_KEY_ENV.to_string()),
    }
}

impl Default for ModelsSection {
    fn default() -> Self {
        Self {
            local: default_local_section(),
            remote: default_remote_section(),
        }
    }
}

/// Container runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSection {
    /// Docker client request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Working directory inside the artifact images
    #[serde(default = "default_container_workdir")]
    pub container_workdir: String,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_container_workdir() -> String {
    DEFAULT_CONTAINER_WORKDIR.to_string()
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            container_workdir: default_container_workdir(),
        }
    }
}

/// Readiness polling after launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSection {
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Open the artifact in a browser once it answers
    #[serde(default)]
    pub open_browser: bool,
}

fn default_ready_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            ready_timeout_secs: default_ready_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            open_browser: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSection {
    /// Where artifact directories are created; the system temp dir if unset
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
}

/// The complete artifactor.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactorToml {
    #[serde(default)]
    pub model: ModelsSection,
    #[serde(default)]
    pub runtime: RuntimeSection,
    #[serde(default)]
    pub preview: PreviewSection,
    #[serde(default)]
    pub workspace: WorkspaceSection,
    /// Per logical name launch overrides
    #[serde(default)]
    pub artifacts: HashMap<String, ArtifactOverride>,
}

impl ArtifactorToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse artifactor.toml")
    }

    /// Load `<config_dir>/artifactor.toml`, or defaults if it does not exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize artifactor.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `ARTIFACTOR_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overrides: [(&str, &mut Option<String>); 4] = [
            ("ARTIFACTOR_LOCAL_BASE_URL", &mut self.model.local.base_url),
            ("ARTIFACTOR_LOCAL_MODEL", &mut self.model.local.model),
            ("ARTIFACTOR_REMOTE_BASE_URL", &mut self.model.remote.base_url),
            ("ARTIFACTOR_REMOTE_MODEL", &mut self.model.remote.model),
        ];
        for (var, slot) in overrides {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }
    }

    /// Resolve a model profile; the API key is read through `lookup`.
    pub fn model_profile_with(
        &self,
        local: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ModelProfile {
        let (section, default_url, default_model) = if local {
            (&self.model.local, DEFAULT_LOCAL_BASE_URL, DEFAULT_LOCAL_MODEL)
        } else {
            (&self.model.remote, DEFAULT_REMOTE_BASE_URL, DEFAULT_REMOTE_MODEL)
        };

        let api_key_env = match (&section.api_key_env, local) {
            (Some(name), _) => Some(name.as_str()),
            (None, false) => Some(DEFAULT_API_KEY_ENV),
            (None, true) => None,
        };

        ModelProfile {
            base_url: section
                .base_url
                .clone()
                .unwrap_or_else(|| default_url.to_string()),
            model: section
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            api_key: api_key_env
                .and_then(&lookup)
                .filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(
            self.runtime.container_workdir.clone(),
            self.artifacts.clone(),
        )
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (label, section) in [("local", &self.model.local), ("remote", &self.model.remote)] {
            if section.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
                warnings.push(format!("[model.{}] model is empty", label));
            }
            if let Some(url) = section.base_url.as_deref()
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                warnings.push(format!(
                    "[model.{}] base_url '{}' should start with http:// or https://",
                    label, url
                ));
            }
        }

        if !self.runtime.container_workdir.starts_with('/') {
            warnings.push(format!(
                "[runtime] container_workdir '{}' should be an absolute path",
                self.runtime.container_workdir
            ));
        }

        if self.preview.poll_interval_ms == 0 {
            warnings.push("[preview] poll_interval_ms is 0; polling will spin".to_string());
        }

        let mut names: Vec<_> = self.artifacts.keys().collect();
        names.sort();
        for name in names {
            if !ARTIFACT_NAMES.contains(&name.as_str()) {
                warnings.push(format!(
                    "[artifacts.{}] is not a known artifact name (expected one of: {})",
                    name,
                    ARTIFACT_NAMES.join(", ")
                ));
            }
            if self.artifacts[name].host_port == Some(0) {
                warnings.push(format!("[artifacts.{}] host_port must not be 0", name));
            }
        }

        warnings
    }
}

/// Configuration with CLI overrides applied.
#[derive(Debug, Clone)]
pub struct ArtifactorConfig {
    pub project_dir: PathBuf,
    pub config_dir: PathBuf,
    pub toml: ArtifactorToml,
    /// CLI override: log to stderr as well
    pub verbose: bool,
}

impl ArtifactorConfig {
    /// Load from `<project_dir>/.artifactor/` with environment overrides applied.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let mut toml = ArtifactorToml::load_or_default(&config_dir)?;
        toml.apply_env(|var| std::env::var(var).ok());

        Ok(Self {
            project_dir,
            config_dir,
            toml,
            verbose: false,
        })
    }

    pub fn with_cli_args(project_dir: PathBuf, verbose: bool) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn model_profile(&self, local: bool) -> ModelProfile {
        self.toml
            .model_profile_with(local, |var| std::env::var(var).ok())
    }

    pub fn catalog(&self) -> Catalog {
        self.toml.catalog()
    }

    pub fn runtime_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.runtime.timeout_secs)
    }

    pub fn container_workdir(&self) -> &str {
        &self.toml.runtime.container_workdir
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.preview.ready_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.toml.preview.poll_interval_ms.max(1))
    }

    pub fn temp_root(&self) -> Option<PathBuf> {
        self.toml.workspace.temp_root.clone()
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
