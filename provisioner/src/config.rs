use runtime::ContainerSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Everything the provisioner needs, passed in explicitly.
///
/// Defaults reproduce the fixed three-container Faraday topology; a TOML file
/// can override individual fields for non-standard hosts.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub network_name: String,

    pub postgres_name: String,
    pub postgres_image: String,
    pub postgres_port: u16,
    pub postgres_user: String,
    pub postgres_password: String,
    pub postgres_db: String,

    pub redis_name: String,
    pub redis_image: String,
    pub redis_port: u16,

    pub app_name: String,
    pub app_image: String,
    pub app_port: u16,

    /// Web login created during install
    pub default_username: String,
    pub default_password: String,

    /// Host directory bind-mounted into the application container
    pub config_dir: PathBuf,

    pub postgres_ready_timeout: Duration,
    pub redis_ready_timeout: Duration,
    pub app_ready_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            network_name: "faraday-net".to_string(),
            postgres_name: "faraday-postgres".to_string(),
            postgres_image: "postgres:12.7-alpine".to_string(),
            postgres_port: 5432,
            postgres_user: "faraday_postgres".to_string(),
            postgres_password: "faraday_password".to_string(),
            postgres_db: "faraday".to_string(),
            redis_name: "faraday-redis".to_string(),
            redis_image: "redis:6.2-alpine".to_string(),
            redis_port: 6379,
            app_name: "faraday".to_string(),
            app_image: "faradaysec/faraday:latest".to_string(),
            app_port: 5985,
            default_username: "faraday".to_string(),
            default_password: "changeme123".to_string(),
            config_dir: default_config_dir(),
            postgres_ready_timeout: Duration::from_secs(60),
            redis_ready_timeout: Duration::from_secs(15),
            app_ready_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

fn default_config_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".faraday")
}

/// On-disk override file; every field optional, applied over the defaults
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    network_name: Option<String>,
    postgres_name: Option<String>,
    postgres_image: Option<String>,
    postgres_port: Option<u16>,
    postgres_user: Option<String>,
    postgres_password: Option<String>,
    postgres_db: Option<String>,
    redis_name: Option<String>,
    redis_image: Option<String>,
    redis_port: Option<u16>,
    app_name: Option<String>,
    app_image: Option<String>,
    app_port: Option<u16>,
    default_username: Option<String>,
    default_password: Option<String>,
    config_dir: Option<PathBuf>,
    postgres_ready_timeout_secs: Option<u64>,
    redis_ready_timeout_secs: Option<u64>,
    app_ready_timeout_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
}

impl ProvisionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::default();
        if let Some(v) = file.network_name {
            config.network_name = v;
        }
        if let Some(v) = file.postgres_name {
            config.postgres_name = v;
        }
        if let Some(v) = file.postgres_image {
            config.postgres_image = v;
        }
        if let Some(v) = file.postgres_port {
            config.postgres_port = v;
        }
        if let Some(v) = file.postgres_user {
            config.postgres_user = v;
        }
        if let Some(v) = file.postgres_password {
            config.postgres_password = v;
        }
        if let Some(v) = file.postgres_db {
            config.postgres_db = v;
        }
        if let Some(v) = file.redis_name {
            config.redis_name = v;
        }
        if let Some(v) = file.redis_image {
            config.redis_image = v;
        }
        if let Some(v) = file.redis_port {
            config.redis_port = v;
        }
        if let Some(v) = file.app_name {
            config.app_name = v;
        }
        if let Some(v) = file.app_image {
            config.app_image = v;
        }
        if let Some(v) = file.app_port {
            config.app_port = v;
        }
        if let Some(v) = file.default_username {
            config.default_username = v;
        }
        if let Some(v) = file.default_password {
            config.default_password = v;
        }
        if let Some(v) = file.config_dir {
            config.config_dir = v;
        }
        if let Some(v) = file.postgres_ready_timeout_secs {
            config.postgres_ready_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.redis_ready_timeout_secs {
            config.redis_ready_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.app_ready_timeout_secs {
            config.app_ready_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.poll_interval_secs {
            config.poll_interval = Duration::from_secs(v);
        }
        Ok(config)
    }

    pub fn with_config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = config_dir.into();
        self
    }

    pub fn with_app_port(mut self, app_port: u16) -> Self {
        self.app_port = app_port;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("network_name", &self.network_name),
            ("postgres_name", &self.postgres_name),
            ("redis_name", &self.redis_name),
            ("app_name", &self.app_name),
            ("default_username", &self.default_username),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        let mut ports = [self.app_port, self.postgres_port, self.redis_port];
        if ports.contains(&0) {
            return Err(ConfigError::Invalid {
                message: "published ports must be non-zero".to_string(),
            });
        }
        ports.sort_unstable();
        if ports.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(ConfigError::Invalid {
                message: "published ports must be distinct".to_string(),
            });
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                message: "poll interval must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.app_port)
    }

    /// Unauthenticated endpoint used for readiness and verification probes
    pub fn probe_url(&self) -> String {
        format!("{}/_api/v3/info", self.base_url())
    }

    pub fn published_ports(&self) -> [u16; 3] {
        [self.app_port, self.postgres_port, self.redis_port]
    }

    pub fn container_names(&self) -> [&str; 3] {
        [&self.postgres_name, &self.redis_name, &self.app_name]
    }

    pub fn postgres_spec(&self) -> ContainerSpec {
        ContainerSpec::new(&self.postgres_name, &self.postgres_image)
            .with_network(&self.network_name)
            .publish(self.postgres_port, 5432)
            .with_env("POSTGRES_USER", &self.postgres_user)
            .with_env("POSTGRES_PASSWORD", &self.postgres_password)
            .with_env("POSTGRES_DB", &self.postgres_db)
    }

    pub fn redis_spec(&self) -> ContainerSpec {
        ContainerSpec::new(&self.redis_name, &self.redis_image)
            .with_network(&self.network_name)
            .publish(self.redis_port, 6379)
    }

    pub fn app_spec(&self) -> ContainerSpec {
        ContainerSpec::new(&self.app_name, &self.app_image)
            .with_network(&self.network_name)
            .publish(self.app_port, 5985)
            .with_env("PGSQL_HOST", &self.postgres_name)
            .with_env("PGSQL_USER", &self.postgres_user)
            .with_env("PGSQL_PASSWD", &self.postgres_password)
            .with_env("PGSQL_DBNAME", &self.postgres_db)
            .with_env("REDIS_SERVER", &self.redis_name)
            .with_volume(self.config_dir.clone(), "/home/faraday/.faraday")
            .with_entrypoint("faraday-server")
            .with_command(["--bind", "0.0.0.0"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProvisionConfig::default();
        assert_eq!(config.network_name, "faraday-net");
        assert_eq!(config.app_port, 5985);
        assert_eq!(config.postgres_port, 5432);
        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.base_url(), "http://localhost:5985");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ProvisionConfig::new()
            .with_app_port(15985)
            .with_config_dir("/tmp/faraday-test")
            .with_poll_interval(Duration::from_millis(10));

        assert_eq!(config.app_port, 15985);
        assert_eq!(config.config_dir, PathBuf::from("/tmp/faraday-test"));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ProvisionConfig::default();

        config.network_name = String::new();
        assert!(config.validate().is_err());

        config.network_name = "faraday-net".to_string();
        config.app_port = 0;
        assert!(config.validate().is_err());

        config.app_port = 5432;
        assert!(config.validate().is_err());

        config.app_port = 5985;
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_spec_wiring() {
        let config = ProvisionConfig::default();
        let spec = config.postgres_spec();
        assert_eq!(spec.name, "faraday-postgres");
        assert_eq!(spec.network.as_deref(), Some("faraday-net"));
        assert!(spec
            .env
            .contains(&("POSTGRES_DB".to_string(), "faraday".to_string())));
        let args = spec.to_run_args();
        assert!(args.contains(&"5432:5432".to_string()));
    }

    #[test]
    fn test_app_spec_service_discovery() {
        let config = ProvisionConfig::default();
        let spec = config.app_spec();
        assert!(spec
            .env
            .contains(&("PGSQL_HOST".to_string(), "faraday-postgres".to_string())));
        assert!(spec
            .env
            .contains(&("REDIS_SERVER".to_string(), "faraday-redis".to_string())));
        assert_eq!(spec.entrypoint.as_deref(), Some("faraday-server"));
        assert_eq!(spec.volumes[0].container_path, "/home/faraday/.faraday");
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faraday-up.toml");
        std::fs::write(
            &path,
            "app_port = 15985\npoll_interval_secs = 1\ndefault_password = \"s3cret\"\n\
             postgres_user = \"pg_admin\"\npostgres_db = \"vulns\"\napp_name = \"faraday-dev\"\n",
        )
        .unwrap();

        let config = ProvisionConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.app_port, 15985);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.default_password, "s3cret");
        assert_eq!(config.postgres_user, "pg_admin");
        assert_eq!(config.postgres_db, "vulns");
        assert_eq!(config.app_name, "faraday-dev");
        // Untouched fields keep their defaults
        assert_eq!(config.postgres_port, 5432);
        assert_eq!(config.postgres_name, "faraday-postgres");
    }

    #[test]
    fn test_from_toml_file_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faraday-up.toml");
        std::fs::write(&path, "app_prot = 15985\n").unwrap();

        assert!(matches!(
            ProvisionConfig::from_toml_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = ProvisionConfig::from_toml_file(Path::new("/nonexistent/faraday-up.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
