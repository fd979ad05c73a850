//! Docker Engine implementation of [`ContainerRuntime`], built on `bollard`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerCreateBody, HostConfig, Mount, MountTypeEnum, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, DownloadFromContainerOptionsBuilder, InspectContainerOptions,
    RemoveContainerOptionsBuilder, StartContainerOptions, StopContainerOptionsBuilder,
};
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::{ContainerRuntime, LaunchRequest, StopOutcome};
use crate::errors::RuntimeError;

/// Seconds the daemon waits for a graceful stop before killing.
const STOP_GRACE_SECS: i32 = 10;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using `DOCKER_HOST` or the platform's default socket.
    ///
    /// The connection is lazy: an unreachable daemon surfaces on the first call.
    pub fn connect(timeout: Duration) -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?
            .with_timeout(timeout);
        Ok(Self { docker })
    }

    fn create_body(request: &LaunchRequest) -> ContainerCreateBody {
        let port_key = format!("{}/tcp", request.port.container_port);
        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            port_key,
            Some(vec![PortBinding {
                host_ip: Some(request.port.host_ip.clone()),
                host_port: Some(request.port.host_port.to_string()),
            }]),
        );

        let mount = Mount {
            target: Some(request.mount.target.clone()),
            source: Some(request.mount.source.to_string_lossy().into_owned()),
            typ: Some(MountTypeEnum::BIND),
            read_only: Some(request.mount.read_only),
            ..Default::default()
        };

        ContainerCreateBody {
            image: Some(request.image.clone()),
            cmd: request.command.clone(),
            host_config: Some(HostConfig {
                mounts: Some(vec![mount]),
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Map a daemon error for an operation on container `name`.
fn classify(err: BollardError, name: &str) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound {
            name: name.to_string(),
        },
        BollardError::DockerResponseServerError {
            status_code: 409, ..
        } => RuntimeError::Conflict {
            name: name.to_string(),
        },
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => RuntimeError::Api(format!("HTTP {}: {}", status_code, message)),
        other => RuntimeError::Unavailable(other.to_string()),
    }
}

fn is_status(err: &BollardError, code: u16) -> bool {
    matches!(
        err,
        BollardError::DockerResponseServerError { status_code, .. } if *status_code == code
    )
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn run(&self, request: &LaunchRequest) -> Result<String, RuntimeError> {
        let options = CreateContainerOptionsBuilder::default()
            .name(&request.name)
            .build();

        let created = self
            .docker
            .create_container(Some(options), Self::create_body(request))
            .await
            .map_err(|e| {
                // Create answers 404 when the image is absent.
                if is_status(&e, 404) {
                    RuntimeError::ImageMissing {
                        image: request.image.clone(),
                    }
                } else {
                    classify(e, &request.name)
                }
            })?;

        for warning in &created.warnings {
            warn!(container = %request.name, "{}", warning);
        }

        if let Err(e) = self
            .docker
            .start_container(&created.id, None::<StartContainerOptions>)
            .await
        {
            // Free the name again; a created-but-never-started container would
            // otherwise block the next launch.
            let remove = RemoveContainerOptionsBuilder::default().force(true).build();
            if let Err(cleanup) = self
                .docker
                .remove_container(&created.id, Some(remove))
                .await
            {
                warn!(container = %request.name, error = %cleanup, "failed to remove unstarted container");
            }
            return Err(classify(e, &request.name));
        }

        info!(container = %request.name, id = %created.id, image = %request.image, "container started");
        Ok(created.id)
    }

    async fn stop_and_remove(&self, name: &str) -> Result<StopOutcome, RuntimeError> {
        let stop = StopContainerOptionsBuilder::default()
            .t(STOP_GRACE_SECS)
            .build();
        match self.docker.stop_container(name, Some(stop)).await {
            Ok(()) => {}
            Err(e) if is_status(&e, 404) => {
                debug!(container = %name, "no container to stop");
                return Ok(StopOutcome::NotFound);
            }
            // 304: already stopped, still needs removing.
            Err(e) if is_status(&e, 304) => {}
            Err(e) => return Err(classify(e, name)),
        }

        let remove = RemoveContainerOptionsBuilder::default().build();
        match self.docker.remove_container(name, Some(remove)).await {
            Ok(()) => {}
            // Removed concurrently, e.g. by --rm or another client.
            Err(e) if is_status(&e, 404) => {}
            Err(e) => return Err(classify(e, name)),
        }

        info!(container = %name, "container stopped and removed");
        Ok(StopOutcome::Removed)
    }

    async fn archive(&self, container: &str, path: &str) -> Result<Vec<u8>, RuntimeError> {
        let options = DownloadFromContainerOptionsBuilder::default()
            .path(path)
            .build();
        let mut stream = Box::pin(self.docker.download_from_container(container, Some(options)));

        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| classify(e, container))?;
            buffer.extend_from_slice(&chunk);
        }

        debug!(container = %container, path = %path, bytes = buffer.len(), "archive downloaded");
        Ok(buffer)
    }

    async fn mount_source(&self, name: &str) -> Result<Option<PathBuf>, RuntimeError> {
        let inspected = match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspected) => inspected,
            Err(e) if is_status(&e, 404) => return Ok(None),
            Err(e) => return Err(classify(e, name)),
        };

        Ok(inspected
            .mounts
            .into_iter()
            .flatten()
            .find_map(|m| m.source)
            .map(PathBuf::from))
    }
}
