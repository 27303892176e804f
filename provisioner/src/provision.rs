//! The provisioning sequence.
//!
//! Ten stages, strictly in order: preflight, port check, cleanup, network
//! creation, database, cache, application, credential setup, verification,
//! summary. Only preflight is fatal; every later failure is downgraded to a
//! warning on the report so the run always reaches the summary.

use crate::config::{ConfigError, ProvisionConfig};
use crate::readiness::{self, HttpProber, ReqwestProber};
use crate::report::InstallReport;
use runtime::{ContainerEngine, RuntimeError};
use std::net::TcpListener;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Container runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Timed out waiting for {operation} after {timeout}s")]
    ReadinessTimeout { operation: String, timeout: u64 },
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Drives the container engine through the install/uninstall/status flows
pub struct Provisioner<E> {
    engine: E,
    config: ProvisionConfig,
    prober: Box<dyn HttpProber>,
}

impl<E: ContainerEngine> Provisioner<E> {
    pub fn new(engine: E, config: ProvisionConfig) -> ProvisionResult<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            prober: Box::new(ReqwestProber::new()),
        })
    }

    /// Replace the HTTP prober (used by tests to avoid real sockets)
    pub fn with_prober(mut self, prober: Box<dyn HttpProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Full installation: all ten stages
    pub async fn run_install(&self) -> ProvisionResult<InstallReport> {
        self.preflight().await?;

        let mut report = InstallReport::new();
        self.check_ports(&mut report);
        self.cleanup(&mut report).await;

        info!(network = %self.config.network_name, "Creating network");
        if let Err(e) = self.engine.create_network(&self.config.network_name).await {
            report.warn("create_network", e.to_string());
        }

        self.start_postgres(&mut report).await;
        self.start_redis(&mut report).await;
        self.start_app(&mut report).await;
        self.setup_password(&mut report).await;
        self.verify(&mut report).await;
        report.statuses = self.container_statuses().await;

        Ok(report)
    }

    /// Tear down the three containers, the network, and the config directory
    pub async fn run_uninstall(&self) -> ProvisionResult<InstallReport> {
        self.preflight().await?;

        let mut report = InstallReport::new();
        self.cleanup(&mut report).await;
        report.statuses = self.container_statuses().await;
        Ok(report)
    }

    /// Verification and status only, no mutation
    pub async fn run_status(&self) -> ProvisionResult<InstallReport> {
        self.preflight().await?;

        let mut report = InstallReport::new();
        self.verify(&mut report).await;
        report.statuses = self.container_statuses().await;
        Ok(report)
    }

    /// Stage 1: the only fatal check. No container operation may run without a
    /// reachable runtime.
    async fn preflight(&self) -> ProvisionResult<()> {
        info!("Checking container runtime");
        self.engine.ping().await?;
        Ok(())
    }

    /// Stage 2: a busy port is a warning, never an abort. Bind the wildcard
    /// address: the runtime publishes on all interfaces, so a service bound
    /// to any one of them is a conflict.
    fn check_ports(&self, report: &mut InstallReport) {
        for port in self.config.published_ports() {
            match TcpListener::bind(("0.0.0.0", port)) {
                Ok(listener) => drop(listener),
                Err(_) => report.warn(
                    "check_ports",
                    format!("port {port} is already in use; the matching container may fail to publish it"),
                ),
            }
        }
    }

    /// Stage 3: idempotent teardown. Absence of a resource is success, not a
    /// suppressed error.
    async fn cleanup(&self, report: &mut InstallReport) {
        for name in self.config.container_names() {
            match self.engine.container_state(name).await {
                Ok(Some(state)) => {
                    info!(container = name, "Removing existing container");
                    if state.is_running() {
                        if let Err(e) = self.engine.stop(name).await {
                            report.warn("cleanup", e.to_string());
                        }
                    }
                    if let Err(e) = self.engine.remove(name).await {
                        report.warn("cleanup", e.to_string());
                    }
                }
                Ok(None) => debug!(container = name, "no existing container"),
                Err(e) => report.warn("cleanup", e.to_string()),
            }
        }

        match self.engine.network_exists(&self.config.network_name).await {
            Ok(true) => {
                info!(network = %self.config.network_name, "Removing existing network");
                if let Err(e) = self.engine.remove_network(&self.config.network_name).await {
                    report.warn("cleanup", e.to_string());
                }
            }
            Ok(false) => debug!(network = %self.config.network_name, "no existing network"),
            Err(e) => report.warn("cleanup", e.to_string()),
        }

        if self.config.config_dir.exists() {
            info!(dir = %self.config.config_dir.display(), "Removing config directory");
            if let Err(e) = std::fs::remove_dir_all(&self.config.config_dir) {
                report.warn(
                    "cleanup",
                    format!(
                        "could not remove {}: {e}",
                        self.config.config_dir.display()
                    ),
                );
            }
        }
    }

    /// Stage 5: database container, then poll until it accepts connections
    async fn start_postgres(&self, report: &mut InstallReport) {
        info!(container = %self.config.postgres_name, "Starting PostgreSQL");
        if let Err(e) = self.engine.run(&self.config.postgres_spec()).await {
            report.warn("start_postgres", e.to_string());
            return;
        }
        if let Err(e) = readiness::wait_for_postgres(
            &self.engine,
            &self.config.postgres_name,
            &self.config.postgres_user,
            self.config.postgres_ready_timeout,
            self.config.poll_interval,
        )
        .await
        {
            report.warn("start_postgres", e.to_string());
        }
    }

    /// Stage 6: cache container
    async fn start_redis(&self, report: &mut InstallReport) {
        info!(container = %self.config.redis_name, "Starting Redis");
        if let Err(e) = self.engine.run(&self.config.redis_spec()).await {
            report.warn("start_redis", e.to_string());
            return;
        }
        if let Err(e) = readiness::wait_for_redis(
            &self.engine,
            &self.config.redis_name,
            self.config.redis_ready_timeout,
            self.config.poll_interval,
        )
        .await
        {
            report.warn("start_redis", e.to_string());
        }
    }

    /// Stage 7: application container, then poll its HTTP endpoint. The
    /// config directory must exist before it is bind-mounted: podman refuses
    /// a nonexistent source, and docker would create it root-owned.
    async fn start_app(&self, report: &mut InstallReport) {
        info!(container = %self.config.app_name, "Starting Faraday");
        if let Err(e) = std::fs::create_dir_all(&self.config.config_dir) {
            report.warn(
                "start_app",
                format!("could not create {}: {e}", self.config.config_dir.display()),
            );
        }
        if let Err(e) = self.engine.run(&self.config.app_spec()).await {
            report.warn("start_app", e.to_string());
            return;
        }
        if let Err(e) = readiness::wait_for_http(
            self.prober.as_ref(),
            &self.config.probe_url(),
            self.config.app_ready_timeout,
            self.config.poll_interval,
        )
        .await
        {
            report.warn("start_app", e.to_string());
        }
    }

    /// Stage 8: set the default web login. A failure here usually means the
    /// application is still initializing and the user can rerun the command.
    async fn setup_password(&self, report: &mut InstallReport) {
        info!("Setting default password");
        let result = self
            .engine
            .exec(
                &self.config.app_name,
                &[
                    "faraday-manage",
                    "change-password",
                    "--username",
                    &self.config.default_username,
                    "--password",
                    &self.config.default_password,
                ],
            )
            .await;

        match result {
            Ok(output) if output.success => {}
            Ok(output) => report.warn(
                "setup_password",
                format!(
                    "could not set default password (application may still be initializing): {}",
                    output.stderr.trim()
                ),
            ),
            Err(e) => report.warn("setup_password", e.to_string()),
        }
    }

    /// Stage 9: application container running and answering HTTP 200
    async fn verify(&self, report: &mut InstallReport) {
        info!("Verifying installation");

        let running = match self.engine.container_state(&self.config.app_name).await {
            Ok(Some(state)) => state.is_running(),
            Ok(None) => false,
            Err(e) => {
                report.warn("verify", e.to_string());
                false
            }
        };
        if !running {
            report.warn(
                "verify",
                format!("container '{}' is not running", self.config.app_name),
            );
        }

        let url = self.config.probe_url();
        let http_ok = match self.prober.status(&url).await {
            Some(200) => true,
            Some(status) => {
                report.warn("verify", format!("{url} answered HTTP {status}"));
                false
            }
            None => {
                report.warn("verify", format!("{url} is unreachable"));
                false
            }
        };

        report.verified = running && http_ok;
    }

    async fn container_statuses(&self) -> Vec<(String, String)> {
        let mut statuses = Vec::new();
        for name in self.config.container_names() {
            let status = match self.engine.container_state(name).await {
                Ok(Some(state)) if state.is_running() => "running",
                Ok(Some(runtime::ContainerState::Exited)) => "exited",
                Ok(Some(_)) => "not running",
                Ok(None) => "absent",
                Err(_) => "unknown",
            };
            statuses.push((name.to_string(), status.to_string()));
        }
        statuses
    }
}
