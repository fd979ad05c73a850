//! Container runtime boundary.
//!
//! The lifecycle manager talks to containers only through [`ContainerRuntime`]:
//!
//! | Implementation   | Backing                                   |
//! |------------------|-------------------------------------------|
//! | `DockerRuntime`  | Docker Engine API over the local socket   |
//! | `InMemoryRuntime`| process-local table, for tests            |
//!
//! Both refuse a second container under a name that is still taken, the way
//! the Docker daemon does.

pub mod docker;
pub mod memory;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::RuntimeError;

pub use docker::DockerRuntime;
pub use memory::InMemoryRuntime;

/// Host interface published ports are bound to.
pub const LOOPBACK: &str = "127.0.0.1";

/// A host path bind-mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: String,
    pub read_only: bool,
}

/// One published port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
    pub host_ip: String,
}

/// Everything needed to start one detached container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub name: String,
    pub image: String,
    pub mount: BindMount,
    pub port: PortMapping,
    pub command: Option<Vec<String>>,
}

/// Result of stopping a container by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// A container existed and was stopped and removed.
    Removed,
    /// No container had that name.
    NotFound,
}

impl std::fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopOutcome::Removed => write!(f, "stopped and removed"),
            StopOutcome::NotFound => write!(f, "not found"),
        }
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create and start a detached container. Returns the runtime's id for it.
    async fn run(&self, request: &LaunchRequest) -> Result<String, RuntimeError>;

    /// Stop then remove the container called `name`, if there is one.
    async fn stop_and_remove(&self, name: &str) -> Result<StopOutcome, RuntimeError>;

    /// Packed (tar) contents of `path` inside the container, fully buffered.
    async fn archive(&self, container: &str, path: &str) -> Result<Vec<u8>, RuntimeError>;

    /// Host path bind-mounted into the container called `name`, if it exists.
    async fn mount_source(&self, name: &str) -> Result<Option<PathBuf>, RuntimeError>;
}
