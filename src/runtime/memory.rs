//! In-memory [`ContainerRuntime`] for tests and dry runs.
//!
//! Mirrors the daemon rules the lifecycle depends on: names are unique, a
//! host port can be published by one container at a time, and stopping an
//! unknown name reports `NotFound`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ContainerRuntime, LaunchRequest, StopOutcome};
use crate::errors::RuntimeError;

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: String,
    pub request: LaunchRequest,
}

#[derive(Debug, Default)]
struct State {
    containers: BTreeMap<String, FakeContainer>,
    next_id: u64,
    launched: u64,
    missing_images: Vec<String>,
    stop_failure: Option<RuntimeError>,
    unavailable: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryRuntime {
    state: Mutex<State>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the daemon were down.
    pub fn unavailable() -> Self {
        let runtime = Self::default();
        runtime.lock().unavailable = true;
        runtime
    }

    /// Make `run` fail for `image` as if it had never been pulled.
    pub fn with_missing_image(self, image: &str) -> Self {
        self.lock().missing_images.push(image.to_string());
        self
    }

    /// Make every `stop_and_remove` of an existing container fail with `error`.
    pub fn fail_stops_with(&self, error: RuntimeError) {
        self.lock().stop_failure = Some(error);
    }

    /// Containers currently running, by name.
    pub fn running(&self) -> Vec<FakeContainer> {
        self.lock().containers.values().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<FakeContainer> {
        self.lock().containers.get(name).cloned()
    }

    /// Number of successful `run` calls so far.
    pub fn launch_count(&self) -> u64 {
        self.lock().launched
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data; keep using it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ContainerRuntime for InMemoryRuntime {
    async fn run(&self, request: &LaunchRequest) -> Result<String, RuntimeError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(RuntimeError::Unavailable("in-memory runtime offline".into()));
        }
        if state.missing_images.contains(&request.image) {
            return Err(RuntimeError::ImageMissing {
                image: request.image.clone(),
            });
        }
        if state.containers.contains_key(&request.name) {
            return Err(RuntimeError::Conflict {
                name: request.name.clone(),
            });
        }
        if let Some(holder) = state
            .containers
            .values()
            .find(|c| c.request.port.host_port == request.port.host_port)
        {
            return Err(RuntimeError::Api(format!(
                "Bind for {}:{} failed: port is already allocated by {}",
                request.port.host_ip, request.port.host_port, holder.request.name
            )));
        }

        state.next_id += 1;
        state.launched += 1;
        let id = format!("{:012x}", state.next_id);
        state.containers.insert(
            request.name.clone(),
            FakeContainer {
                id: id.clone(),
                request: request.clone(),
            },
        );
        Ok(id)
    }

    async fn stop_and_remove(&self, name: &str) -> Result<StopOutcome, RuntimeError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(RuntimeError::Unavailable("in-memory runtime offline".into()));
        }
        if !state.containers.contains_key(name) {
            return Ok(StopOutcome::NotFound);
        }
        if let Some(err) = state.stop_failure.clone() {
            return Err(err);
        }
        state.containers.remove(name);
        Ok(StopOutcome::Removed)
    }

    /// Packs the mounted host files as `<name>\n<len>\n<bytes>` records, a
    /// stand-in for the tar stream the daemon produces.
    async fn archive(&self, container: &str, path: &str) -> Result<Vec<u8>, RuntimeError> {
        let mount = {
            let state = self.lock();
            if state.unavailable {
                return Err(RuntimeError::Unavailable("in-memory runtime offline".into()));
            }
            state
                .containers
                .values()
                .find(|c| c.id == container || c.request.name == container)
                .map(|c| c.request.mount.clone())
                .ok_or_else(|| RuntimeError::NotFound {
                    name: container.to_string(),
                })?
        };

        if !mount.target.starts_with(path) && !path.starts_with(&mount.target) {
            return Err(RuntimeError::Api(format!(
                "Could not find the file {} in container {}",
                path, container
            )));
        }

        let files = if mount.source.is_dir() {
            let mut entries: Vec<_> = std::fs::read_dir(&mount.source)
                .map_err(|e| RuntimeError::Api(e.to_string()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect();
            entries.sort();
            entries
        } else {
            vec![mount.source.clone()]
        };

        let mut packed = Vec::new();
        for file in files {
            let contents = std::fs::read(&file).map_err(|e| RuntimeError::Api(e.to_string()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            packed.extend_from_slice(format!("{}\n{}\n", name, contents.len()).as_bytes());
            packed.extend_from_slice(&contents);
        }
        Ok(packed)
    }

    async fn mount_source(&self, name: &str) -> Result<Option<PathBuf>, RuntimeError> {
        let state = self.lock();
        if state.unavailable {
            return Err(RuntimeError::Unavailable("in-memory runtime offline".into()));
        }
        Ok(state
            .containers
            .get(name)
            .map(|c| c.request.mount.source.clone()))
    }
}
