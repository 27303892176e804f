use crate::config::ProvisionConfig;
use tracing::warn;

/// A non-fatal problem recorded during a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub stage: String,
    pub message: String,
}

/// Outcome of a provisioning run
#[derive(Debug, Default)]
pub struct InstallReport {
    pub warnings: Vec<Warning>,
    /// True iff the application container is running and answered HTTP 200
    pub verified: bool,
    /// (container name, status) for the three managed containers
    pub statuses: Vec<(String, String)>,
}

impl InstallReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, stage: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(stage, "{message}");
        self.warnings.push(Warning {
            stage: stage.to_string(),
            message,
        });
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Stage 10: always printed, regardless of intermediate warnings
    pub fn print_summary(&self, config: &ProvisionConfig, runtime_cmd: &str) {
        print!("{}", self.render_summary(config, runtime_cmd));
    }

    pub fn render_summary(&self, config: &ProvisionConfig, runtime_cmd: &str) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out);
        let _ = writeln!(out, "=========================================");
        let _ = writeln!(out, " Faraday installation summary");
        let _ = writeln!(out, "=========================================");

        let _ = writeln!(out, "Containers:");
        for (name, status) in &self.statuses {
            let _ = writeln!(out, "  {name:<20} {status}");
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Access URL:  {}", config.base_url());
        let _ = writeln!(
            out,
            "Credentials: {} / {}",
            config.default_username, config.default_password
        );

        let _ = writeln!(out);
        let _ = writeln!(out, "Useful commands:");
        let _ = writeln!(out, "  {runtime_cmd} logs -f {}", config.app_name);
        let _ = writeln!(
            out,
            "  {runtime_cmd} stop {} {} {}",
            config.app_name, config.redis_name, config.postgres_name
        );
        let _ = writeln!(
            out,
            "  {runtime_cmd} start {} {} {}",
            config.postgres_name, config.redis_name, config.app_name
        );

        if self.has_warnings() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Warnings:");
            for warning in &self.warnings {
                let _ = writeln!(out, "  [{}] {}", warning.stage, warning.message);
            }
        }

        let _ = writeln!(out);
        if self.verified {
            let _ = writeln!(out, "Verification passed.");
        } else {
            let _ = writeln!(
                out,
                "Verification FAILED. Check the warnings above and the container logs."
            );
        }
        out
    }
}
