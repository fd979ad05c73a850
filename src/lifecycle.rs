//! Container lifecycle for generated artifacts.
//!
//! Each logical name owns at most one container, called `artifact-<name>`.
//! Transitions per name:
//!
//! ```text
//!   absent ──launch──▶ running ──stop──▶ absent
//!                        │
//!                        └──relaunch (stop, then launch)──▶ running
//! ```
//!
//! `launch` never replaces a running container: a second `launch` under a
//! taken name fails with a conflict. `relaunch` is the replacing variant.
//!
//! With [`LifecycleManager::reclaiming`], a successful stop also deletes the
//! artifact directory the container had mounted, so directories kept past
//! their session are not left behind.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::ArtifactSpec;
use crate::errors::{LifecycleError, RuntimeError};
use crate::materialize::Materializer;
use crate::runtime::{
    BindMount, ContainerRuntime, LOOPBACK, LaunchRequest, PortMapping, StopOutcome,
};

/// Handle to the container started for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainer {
    pub id: String,
    pub name: String,
    pub host_port: u16,
}

impl RunningContainer {
    pub fn address(&self) -> String {
        crate::preview::address(self.host_port)
    }

    /// Shortened id, the way `docker ps` shows it.
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(12)]
    }
}

/// Result of `relaunch`.
#[derive(Debug)]
pub struct Relaunched {
    pub container: RunningContainer,
    /// What happened to the previous container under the same name.
    pub previous: Result<StopOutcome, LifecycleError>,
}

pub struct LifecycleManager {
    runtime: Arc<dyn ContainerRuntime>,
    workdir: String,
    reclaim: Option<Materializer>,
}

impl LifecycleManager {
    /// `workdir` is the in-container directory `archive` packs.
    pub fn new(runtime: Arc<dyn ContainerRuntime>, workdir: impl Into<String>) -> Self {
        Self {
            runtime,
            workdir: workdir.into(),
            reclaim: None,
        }
    }

    /// Delete the mounted artifact directory of every container this manager
    /// stops, when `materializer` created it.
    pub fn reclaiming(mut self, materializer: Materializer) -> Self {
        self.reclaim = Some(materializer);
        self
    }

    /// Build the runtime request for an artifact written at `artifact_path`.
    pub fn launch_request(
        spec: &ArtifactSpec,
        artifact_path: &Path,
    ) -> Result<LaunchRequest, LifecycleError> {
        let launch = spec
            .launch
            .as_ref()
            .ok_or(LifecycleError::NoLaunchSpec { kind: spec.kind })?;

        Ok(LaunchRequest {
            name: spec.container_name(),
            image: launch.image.clone(),
            mount: BindMount {
                source: launch.mount.source_for(artifact_path),
                target: launch.mount.target().to_string(),
                read_only: false,
            },
            port: PortMapping {
                container_port: launch.container_port,
                host_port: launch.host_port,
                host_ip: LOOPBACK.to_string(),
            },
            command: launch.command.clone(),
        })
    }

    /// Start a detached container for the artifact. Fails if the name is taken.
    pub async fn launch(
        &self,
        spec: &ArtifactSpec,
        artifact_path: &Path,
    ) -> Result<RunningContainer, LifecycleError> {
        let request = Self::launch_request(spec, artifact_path)?;
        let id = self
            .runtime
            .run(&request)
            .await
            .map_err(|source| LifecycleError::Launch {
                name: request.name.clone(),
                source,
            })?;

        Ok(RunningContainer {
            id,
            name: request.name,
            host_port: request.port.host_port,
        })
    }

    /// Stop and remove the container called `name`. Absent is not an error.
    pub async fn stop(&self, name: &str) -> Result<StopOutcome, LifecycleError> {
        let mounted = match &self.reclaim {
            Some(_) => self.runtime.mount_source(name).await.unwrap_or_else(|e| {
                debug!(container = %name, error = %e, "could not look up mount");
                None
            }),
            None => None,
        };

        let outcome = match self.runtime.stop_and_remove(name).await {
            Ok(outcome) => outcome,
            Err(RuntimeError::NotFound { .. }) => StopOutcome::NotFound,
            Err(source) => {
                return Err(LifecycleError::Stop {
                    name: name.to_string(),
                    source,
                });
            }
        };

        if outcome == StopOutcome::Removed
            && let (Some(materializer), Some(mounted)) = (&self.reclaim, mounted)
        {
            match materializer.reclaim(&mounted) {
                Ok(Some(dir)) => info!(container = %name, dir = %dir.display(), "removed artifact files"),
                Ok(None) => {}
                Err(e) => warn!(container = %name, error = %e, "failed to remove artifact files"),
            }
        }
        Ok(outcome)
    }

    /// Stop any container under the artifact's name, then launch a new one.
    ///
    /// A failed stop is reported in `Relaunched::previous` and the launch is
    /// still attempted.
    pub async fn relaunch(
        &self,
        spec: &ArtifactSpec,
        artifact_path: &Path,
    ) -> Result<Relaunched, LifecycleError> {
        let name = spec.container_name();
        let previous = self.stop(&name).await;
        match &previous {
            Ok(StopOutcome::Removed) => info!(container = %name, "replaced previous container"),
            Ok(StopOutcome::NotFound) => {}
            Err(e) => warn!(container = %name, error = %e, "stop failed, launching anyway"),
        }

        let container = self.launch(spec, artifact_path).await?;
        Ok(Relaunched {
            container,
            previous,
        })
    }

    /// Packed contents of the working directory of `container` (an id or name).
    pub async fn archive(&self, container: &str) -> Result<Vec<u8>, LifecycleError> {
        self.archive_path(container, &self.workdir).await
    }

    pub async fn archive_path(
        &self,
        container: &str,
        path: &str,
    ) -> Result<Vec<u8>, LifecycleError> {
        self.runtime
            .archive(container, path)
            .await
            .map_err(|source| LifecycleError::Archive {
                container: container.to_string(),
                path: path.to_string(),
                source,
            })
    }
}
