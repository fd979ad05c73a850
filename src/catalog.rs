//! Artifact catalog: the finite set of artifact kinds and how each one is
//! generated, written to disk and launched.
//!
//! | Kind        | Logical name | Fence    | File         | Ports       | Mount                          |
//! |-------------|--------------|----------|--------------|-------------|--------------------------------|
//! | `streamlit` | `streamlit`  | `python` | `run.py`     | 8500 → 8500 | directory → workdir            |
//! | `vue`       | `vue`        | `vue`    | `App.vue`    | 3000 → 3000 | file → `<workdir>/src/App.vue` |
//! | `static`    | `static`     | `html`   | `index.html` | 8080 → 8080 | directory → workdir            |
//! | `svg`       | `static`     | `html`   | `index.html` | 8080 → 8080 | directory → workdir            |
//!
//! `static` and `svg` share a logical name because they serve on the same
//! host port: switching between them replaces the running container.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::prompts;

/// Working directory of the artifact images.
pub const DEFAULT_CONTAINER_WORKDIR: &str = "/home/runner/app";

/// The artifact kinds a user can pick from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Streamlit,
    Vue,
    Static,
    Svg,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Streamlit,
        ArtifactKind::Vue,
        ArtifactKind::Static,
        ArtifactKind::Svg,
    ];

    /// Lowercase identifier used on the command line and in config.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Streamlit => "streamlit",
            ArtifactKind::Vue => "vue",
            ArtifactKind::Static => "static",
            ArtifactKind::Svg => "svg",
        }
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Streamlit => "Streamlit",
            ArtifactKind::Vue => "Vue",
            ArtifactKind::Static => "Static",
            ArtifactKind::Svg => "SVG",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "streamlit" => Ok(ArtifactKind::Streamlit),
            "vue" => Ok(ArtifactKind::Vue),
            "static" => Ok(ArtifactKind::Static),
            "svg" => Ok(ArtifactKind::Svg),
            _ => anyhow::bail!(
                "Invalid artifact type '{}'. Valid values: streamlit, vue, static, svg",
                s
            ),
        }
    }
}

/// How the materialized artifact is bind-mounted into its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountStrategy {
    /// Mount the artifact's whole temporary directory at `target`.
    Directory { target: String },
    /// Mount only the artifact file at `target`.
    File { target: String },
}

impl MountStrategy {
    /// Host path to mount for an artifact written at `artifact_path`.
    pub fn source_for(&self, artifact_path: &Path) -> PathBuf {
        match self {
            MountStrategy::Directory { .. } => artifact_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| artifact_path.to_path_buf()),
            MountStrategy::File { .. } => artifact_path.to_path_buf(),
        }
    }

    /// Path inside the container.
    pub fn target(&self) -> &str {
        match self {
            MountStrategy::Directory { target } | MountStrategy::File { target } => target,
        }
    }
}

/// Container launch parameters for a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub image: String,
    pub host_port: u16,
    pub container_port: u16,
    /// `None` runs the image's default command.
    pub command: Option<Vec<String>>,
    pub mount: MountStrategy,
}

/// Everything needed to turn a prompt into a running artifact of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub kind: ArtifactKind,
    /// Logical name; the container is called `artifact-<name>`.
    pub name: &'static str,
    pub system_prompt: String,
    pub fence_tag: &'static str,
    /// `None` means the kind produces nothing to write to disk.
    pub output_file_name: Option<&'static str>,
    /// `None` means no container is launched for the kind.
    pub launch: Option<LaunchSpec>,
}

impl ArtifactSpec {
    /// Name of the container that runs this kind.
    pub fn container_name(&self) -> String {
        format!("artifact-{}", self.name)
    }

    /// Local address of the running artifact, if the kind is launched.
    pub fn address(&self) -> Option<String> {
        self.launch
            .as_ref()
            .map(|launch| crate::preview::address(launch.host_port))
    }
}

/// Per-name overrides of the built-in launch parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactOverride {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub host_port: Option<u16>,
}

/// Builds `ArtifactSpec`s from the built-in table plus configured overrides.
#[derive(Debug, Clone)]
pub struct Catalog {
    workdir: String,
    overrides: HashMap<String, ArtifactOverride>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER_WORKDIR, HashMap::new())
    }
}

impl Catalog {
    pub fn new(workdir: impl Into<String>, overrides: HashMap<String, ArtifactOverride>) -> Self {
        Self {
            workdir: workdir.into(),
            overrides,
        }
    }

    pub fn spec(&self, kind: ArtifactKind) -> ArtifactSpec {
        let workdir = self.workdir.trim_end_matches('/');
        let directory_mount = || MountStrategy::Directory {
            target: workdir.to_string(),
        };

        let mut spec = match kind {
            ArtifactKind::Streamlit => ArtifactSpec {
                kind,
                name: "streamlit",
                system_prompt: prompts::with_follow_up_rules(prompts::STREAMLIT_PROMPT),
                fence_tag: "python",
                output_file_name: Some("run.py"),
                launch: Some(LaunchSpec {
                    image: "streamlit-image-artifact:latest".to_string(),
                    host_port: 8500,
                    container_port: 8500,
                    command: Some(
                        [
                            "streamlit",
                            "run",
                            "run.py",
                            "--server.port=8500",
                            "--server.address=0.0.0.0",
                        ]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    ),
                    mount: directory_mount(),
                }),
            },
            ArtifactKind::Vue => ArtifactSpec {
                kind,
                name: "vue",
                system_prompt: prompts::with_follow_up_rules(prompts::VUE_PROMPT),
                fence_tag: "vue",
                output_file_name: Some("App.vue"),
                launch: Some(LaunchSpec {
                    image: "vue-image-artifact".to_string(),
                    host_port: 3000,
                    container_port: 3000,
                    command: None,
                    mount: MountStrategy::File {
                        target: format!("{}/src/App.vue", workdir),
                    },
                }),
            },
            ArtifactKind::Static | ArtifactKind::Svg => ArtifactSpec {
                kind,
                name: "static",
                system_prompt: prompts::with_follow_up_rules(if kind == ArtifactKind::Svg {
                    prompts::SVG_PROMPT
                } else {
                    prompts::STATIC_PAGE_PROMPT
                }),
                fence_tag: "html",
                output_file_name: Some("index.html"),
                launch: Some(LaunchSpec {
                    image: "static-image-artifact".to_string(),
                    host_port: 8080,
                    container_port: 8080,
                    command: None,
                    mount: directory_mount(),
                }),
            },
        };

        if let Some(override_cfg) = self.overrides.get(spec.name)
            && let Some(launch) = spec.launch.as_mut()
        {
            if let Some(image) = &override_cfg.image {
                launch.image = image.clone();
            }
            if let Some(port) = override_cfg.host_port {
                launch.host_port = port;
            }
        }

        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_is_case_insensitive() {
        assert_eq!("SVG".parse::<ArtifactKind>().unwrap(), ArtifactKind::Svg);
        assert_eq!(
            " Streamlit ".parse::<ArtifactKind>().unwrap(),
            ArtifactKind::Streamlit
        );
        assert!("react".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_kind_display_round_trips() {
        for kind in ArtifactKind::ALL {
            assert_eq!(kind.to_string().parse::<ArtifactKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_static_and_svg_share_a_container() {
        let catalog = Catalog::default();
        let static_spec = catalog.spec(ArtifactKind::Static);
        let svg_spec = catalog.spec(ArtifactKind::Svg);
        assert_eq!(static_spec.container_name(), "artifact-static");
        assert_eq!(svg_spec.container_name(), "artifact-static");
        assert_ne!(static_spec.system_prompt, svg_spec.system_prompt);
        assert_eq!(
            static_spec.launch.as_ref().unwrap().host_port,
            svg_spec.launch.as_ref().unwrap().host_port
        );
    }

    #[test]
    fn test_streamlit_runs_the_generated_script() {
        let spec = Catalog::default().spec(ArtifactKind::Streamlit);
        assert_eq!(spec.fence_tag, "python");
        assert_eq!(spec.output_file_name, Some("run.py"));
        let launch = spec.launch.unwrap();
        assert_eq!(launch.container_port, 8500);
        let command = launch.command.unwrap();
        assert_eq!(command[0], "streamlit");
        assert!(command.contains(&"run.py".to_string()));
    }

    #[test]
    fn test_vue_mounts_single_file() {
        let spec = Catalog::default().spec(ArtifactKind::Vue);
        let launch = spec.launch.unwrap();
        assert_eq!(
            launch.mount,
            MountStrategy::File {
                target: "/home/runner/app/src/App.vue".to_string()
            }
        );
        let source = launch
            .mount
            .source_for(Path::new("/tmp/artifact-abc/App.vue"));
        assert_eq!(source, PathBuf::from("/tmp/artifact-abc/App.vue"));
    }

    #[test]
    fn test_directory_mount_uses_parent() {
        let mount = MountStrategy::Directory {
            target: DEFAULT_CONTAINER_WORKDIR.to_string(),
        };
        assert_eq!(
            mount.source_for(Path::new("/tmp/artifact-abc/index.html")),
            PathBuf::from("/tmp/artifact-abc")
        );
        assert_eq!(mount.target(), "/home/runner/app");
    }

    #[test]
    fn test_custom_workdir_is_trimmed() {
        let catalog = Catalog::new("/srv/app/", HashMap::new());
        let launch = catalog.spec(ArtifactKind::Vue).launch.unwrap();
        assert_eq!(launch.mount.target(), "/srv/app/src/App.vue");
    }

    #[test]
    fn test_overrides_apply_by_logical_name() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "static".to_string(),
            ArtifactOverride {
                image: Some("nginx:alpine".to_string()),
                host_port: Some(9090),
            },
        );
        let catalog = Catalog::new(DEFAULT_CONTAINER_WORKDIR, overrides);

        for kind in [ArtifactKind::Static, ArtifactKind::Svg] {
            let launch = catalog.spec(kind).launch.unwrap();
            assert_eq!(launch.image, "nginx:alpine");
            assert_eq!(launch.host_port, 9090);
            assert_eq!(launch.container_port, 8080);
        }

        let vue = catalog.spec(ArtifactKind::Vue).launch.unwrap();
        assert_eq!(vue.image, "vue-image-artifact");
    }

    #[test]
    fn test_address_uses_host_port() {
        let spec = Catalog::default().spec(ArtifactKind::Static);
        assert_eq!(spec.address().as_deref(), Some("http://localhost:8080"));
    }
}
