use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Container runtime types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeKind {
    /// Docker container runtime
    Docker,
    /// Podman container runtime
    Podman,
    /// No container runtime available
    None,
}

impl RuntimeKind {
    /// Get the command name for this runtime
    pub fn command(&self) -> &'static str {
        match self {
            RuntimeKind::Docker => "docker",
            RuntimeKind::Podman => "podman",
            RuntimeKind::None => "",
        }
    }

    /// Check if this runtime is available
    pub fn is_available(&self) -> bool {
        matches!(self, RuntimeKind::Docker | RuntimeKind::Podman)
    }
}

/// Observed state of a named container, as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Exited,
    /// Any other runtime-reported status (created, paused, restarting, ...)
    Other,
}

impl ContainerState {
    pub fn from_status(status: &str) -> Self {
        match status.trim() {
            "running" => ContainerState::Running,
            "exited" => ContainerState::Exited,
            _ => ContainerState::Other,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }
}

/// A host-to-container published port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

/// A host directory bind-mounted into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub host_path: PathBuf,
    pub container_path: String,
}

/// Everything needed to launch one container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub network: Option<String>,
    pub ports: Vec<PortMapping>,
    pub env: Vec<(String, String)>,
    pub volumes: Vec<VolumeMount>,
    /// Entrypoint override, if the image default is not wanted
    pub entrypoint: Option<String>,
    /// Command passed after the image name
    pub command: Vec<String>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            network: None,
            ports: Vec::new(),
            env: Vec::new(),
            volumes: Vec::new(),
            entrypoint: None,
            command: Vec::new(),
        }
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn publish(mut self, host: u16, container: u16) -> Self {
        self.ports.push(PortMapping { host, container });
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_volume(mut self, host_path: impl Into<PathBuf>, container_path: impl Into<String>) -> Self {
        self.volumes.push(VolumeMount {
            host_path: host_path.into(),
            container_path: container_path.into(),
        });
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    /// Build the argument vector for `<runtime> run`, detached mode
    pub fn to_run_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            self.name.clone(),
        ];

        if let Some(network) = &self.network {
            args.push("--network".to_string());
            args.push(network.clone());
        }

        for mapping in &self.ports {
            args.push("-p".to_string());
            args.push(format!("{}:{}", mapping.host, mapping.container));
        }

        for (key, value) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        for mount in &self.volumes {
            args.push("-v".to_string());
            args.push(format!(
                "{}:{}",
                mount.host_path.display(),
                mount.container_path
            ));
        }

        if let Some(entrypoint) = &self.entrypoint {
            args.push("--entrypoint".to_string());
            args.push(entrypoint.clone());
        }

        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());

        args
    }
}

/// Captured output of an in-container command
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_kind_command() {
        assert_eq!(RuntimeKind::Docker.command(), "docker");
        assert_eq!(RuntimeKind::Podman.command(), "podman");
        assert_eq!(RuntimeKind::None.command(), "");
    }

    #[test]
    fn test_runtime_kind_availability() {
        assert!(RuntimeKind::Docker.is_available());
        assert!(RuntimeKind::Podman.is_available());
        assert!(!RuntimeKind::None.is_available());
    }

    #[test]
    fn test_container_state_from_status() {
        assert_eq!(ContainerState::from_status("running"), ContainerState::Running);
        assert_eq!(ContainerState::from_status("running\n"), ContainerState::Running);
        assert_eq!(ContainerState::from_status("exited"), ContainerState::Exited);
        assert_eq!(ContainerState::from_status("paused"), ContainerState::Other);
        assert!(ContainerState::Running.is_running());
        assert!(!ContainerState::Exited.is_running());
    }

    #[test]
    fn test_run_args_minimal() {
        let spec = ContainerSpec::new("cache", "redis:6.2-alpine");
        assert_eq!(
            spec.to_run_args(),
            vec!["run", "-d", "--name", "cache", "redis:6.2-alpine"]
        );
    }

    #[test]
    fn test_run_args_full() {
        let spec = ContainerSpec::new("app", "example/app:1.0")
            .with_network("app-net")
            .publish(8080, 80)
            .with_env("MODE", "local")
            .with_volume("/tmp/data", "/var/data")
            .with_entrypoint("/bin/sh")
            .with_command(["-c", "serve"]);

        let args = spec.to_run_args();
        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "--name",
                "app",
                "--network",
                "app-net",
                "-p",
                "8080:80",
                "-e",
                "MODE=local",
                "-v",
                "/tmp/data:/var/data",
                "--entrypoint",
                "/bin/sh",
                "example/app:1.0",
                "-c",
                "serve",
            ]
        );
    }
}
