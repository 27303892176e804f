use crate::engine::{ContainerEngine, RuntimeError, RuntimeResult};
use crate::types::{ContainerSpec, ContainerState, ExecOutput, RuntimeKind};
use async_trait::async_trait;
use std::process::{Command, Stdio};
use tracing::debug;

/// Detect available container runtime in order of preference
pub fn detect_runtime() -> RuntimeKind {
    if Command::new("docker")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
    {
        return RuntimeKind::Docker;
    }

    // Fall back to Podman, which exposes a compatible CLI
    if Command::new("podman")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
    {
        return RuntimeKind::Podman;
    }

    RuntimeKind::None
}

/// Production engine driving the docker/podman CLI
#[derive(Debug, Clone)]
pub struct CliEngine {
    kind: RuntimeKind,
}

impl CliEngine {
    /// Detect an installed runtime; errors if neither docker nor podman is present
    pub fn detect() -> RuntimeResult<Self> {
        let kind = detect_runtime();
        if !kind.is_available() {
            return Err(RuntimeError::NoRuntimeAvailable);
        }
        Ok(Self { kind })
    }

    pub fn with_kind(kind: RuntimeKind) -> RuntimeResult<Self> {
        if !kind.is_available() {
            return Err(RuntimeError::NoRuntimeAvailable);
        }
        Ok(Self { kind })
    }

    fn invoke(&self, args: &[&str]) -> RuntimeResult<std::process::Output> {
        debug!(runtime = self.kind.command(), ?args, "invoking container runtime");
        let output = Command::new(self.kind.command()).args(args).output()?;
        Ok(output)
    }

    fn stderr_of(output: &std::process::Output) -> String {
        String::from_utf8_lossy(&output.stderr).trim().to_string()
    }
}

#[async_trait]
impl ContainerEngine for CliEngine {
    async fn ping(&self) -> RuntimeResult<()> {
        let output = self
            .invoke(&["info"])
            .map_err(|_| RuntimeError::NoRuntimeAvailable)?;
        if !output.status.success() {
            return Err(RuntimeError::NoRuntimeAvailable);
        }
        Ok(())
    }

    async fn run(&self, spec: &ContainerSpec) -> RuntimeResult<()> {
        let args = spec.to_run_args();
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.invoke(&arg_refs)?;
        if !output.status.success() {
            return Err(RuntimeError::StartFailed {
                name: spec.name.clone(),
                reason: Self::stderr_of(&output),
            });
        }
        Ok(())
    }

    async fn stop(&self, name: &str) -> RuntimeResult<()> {
        let output = self.invoke(&["stop", name])?;
        if !output.status.success() {
            return Err(RuntimeError::RemoveFailed {
                name: name.to_string(),
                reason: Self::stderr_of(&output),
            });
        }
        Ok(())
    }

    async fn remove(&self, name: &str) -> RuntimeResult<()> {
        let output = self.invoke(&["rm", "-f", name])?;
        if !output.status.success() {
            return Err(RuntimeError::RemoveFailed {
                name: name.to_string(),
                reason: Self::stderr_of(&output),
            });
        }
        Ok(())
    }

    async fn container_state(&self, name: &str) -> RuntimeResult<Option<ContainerState>> {
        let output = self.invoke(&["inspect", "-f", "{{.State.Status}}", name])?;
        if !output.status.success() {
            // Inspect fails with non-zero status when the container does not exist
            return Ok(None);
        }
        let status = String::from_utf8_lossy(&output.stdout);
        Ok(Some(ContainerState::from_status(&status)))
    }

    async fn exec(&self, name: &str, cmd: &[&str]) -> RuntimeResult<ExecOutput> {
        let mut args = vec!["exec", name];
        args.extend_from_slice(cmd);
        let output = self.invoke(&args)?;
        Ok(ExecOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn create_network(&self, name: &str) -> RuntimeResult<()> {
        let output = self.invoke(&["network", "create", name])?;
        if !output.status.success() {
            return Err(RuntimeError::NetworkFailed {
                name: name.to_string(),
                reason: Self::stderr_of(&output),
            });
        }
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> RuntimeResult<()> {
        let output = self.invoke(&["network", "rm", name])?;
        if !output.status.success() {
            return Err(RuntimeError::NetworkFailed {
                name: name.to_string(),
                reason: Self::stderr_of(&output),
            });
        }
        Ok(())
    }

    async fn network_exists(&self, name: &str) -> RuntimeResult<bool> {
        let output = self.invoke(&["network", "inspect", name])?;
        Ok(output.status.success())
    }

    fn kind(&self) -> RuntimeKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_runtime_returns_valid_variant() {
        // We can't predict what will be available in the test environment
        match detect_runtime() {
            RuntimeKind::Docker | RuntimeKind::Podman | RuntimeKind::None => {}
        }
    }

    #[test]
    fn test_with_kind_rejects_none() {
        assert!(matches!(
            CliEngine::with_kind(RuntimeKind::None),
            Err(RuntimeError::NoRuntimeAvailable)
        ));
        assert!(CliEngine::with_kind(RuntimeKind::Docker).is_ok());
    }
}
