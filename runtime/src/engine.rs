use crate::types::{ContainerSpec, ContainerState, ExecOutput, RuntimeKind};
use async_trait::async_trait;
use thiserror::Error;

/// Comprehensive container runtime errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No container runtime is available
    #[error("No container runtime available. Please install Docker or Podman and ensure the daemon is running.")]
    NoRuntimeAvailable,

    /// Container failed to start
    #[error("Failed to start container '{name}': {reason}")]
    StartFailed { name: String, reason: String },

    /// Container stop or removal failed
    #[error("Failed to remove container '{name}': {reason}")]
    RemoveFailed { name: String, reason: String },

    /// Network create or remove failed
    #[error("Network operation failed for '{name}': {reason}")]
    NetworkFailed { name: String, reason: String },

    /// In-container command execution failed
    #[error("Command execution failed in container '{name}': {reason}")]
    ExecFailed { name: String, reason: String },

    /// Runtime query failed
    #[error("Failed to query container runtime: {reason}")]
    QueryFailed { reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Seam between the provisioning stages and the actual container runtime.
///
/// Production uses [`crate::CliEngine`]; tests substitute a scripted fake.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Verify the runtime is installed and the daemon is reachable
    async fn ping(&self) -> RuntimeResult<()>;

    /// Launch a container in detached mode
    async fn run(&self, spec: &ContainerSpec) -> RuntimeResult<()>;

    /// Stop a running container
    async fn stop(&self, name: &str) -> RuntimeResult<()>;

    /// Remove a container
    async fn remove(&self, name: &str) -> RuntimeResult<()>;

    /// Report the state of a named container, `None` if it does not exist
    async fn container_state(&self, name: &str) -> RuntimeResult<Option<ContainerState>>;

    /// Execute a command inside a running container
    async fn exec(&self, name: &str, cmd: &[&str]) -> RuntimeResult<ExecOutput>;

    /// Create a named network
    async fn create_network(&self, name: &str) -> RuntimeResult<()>;

    /// Remove a named network
    async fn remove_network(&self, name: &str) -> RuntimeResult<()>;

    /// Check whether a named network exists
    async fn network_exists(&self, name: &str) -> RuntimeResult<bool>;

    fn kind(&self) -> RuntimeKind;
}
