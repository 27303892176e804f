//! Bounded readiness polling.
//!
//! Each dependency is polled against its own health signal with an explicit
//! deadline; exhausting the deadline is a reported timeout, never a silent
//! fixed-length sleep.

use crate::provision::ProvisionError;
use async_trait::async_trait;
use runtime::ContainerEngine;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

/// Host-side HTTP probe seam; tests substitute a scripted implementation
#[async_trait]
pub trait HttpProber: Send + Sync {
    /// Status code of a GET to `url`, `None` on connection failure
    async fn status(&self, url: &str) -> Option<u16>;
}

pub struct ReqwestProber {
    client: reqwest::Client,
}

impl ReqwestProber {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpProber for ReqwestProber {
    async fn status(&self, url: &str) -> Option<u16> {
        match self
            .client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => Some(response.status().as_u16()),
            Err(_) => None,
        }
    }
}

fn timeout_error(operation: &str, deadline: Duration) -> ProvisionError {
    ProvisionError::ReadinessTimeout {
        operation: operation.to_string(),
        timeout: deadline.as_secs(),
    }
}

/// Poll `pg_isready` inside the database container until it reports accepting
/// connections
pub async fn wait_for_postgres(
    engine: &dyn ContainerEngine,
    container: &str,
    user: &str,
    deadline: Duration,
    interval: Duration,
) -> Result<(), ProvisionError> {
    let start = Instant::now();
    loop {
        match engine.exec(container, &["pg_isready", "-U", user]).await {
            Ok(output) if output.success => {
                debug!(container, "postgres ready");
                return Ok(());
            }
            // Not ready yet, or exec itself failed because the container is
            // still coming up; keep polling until the deadline
            Ok(_) | Err(_) => {}
        }
        if start.elapsed() >= deadline {
            return Err(timeout_error("postgres readiness", deadline));
        }
        sleep(interval).await;
    }
}

/// Poll `redis-cli ping` inside the cache container until it answers PONG
pub async fn wait_for_redis(
    engine: &dyn ContainerEngine,
    container: &str,
    deadline: Duration,
    interval: Duration,
) -> Result<(), ProvisionError> {
    let start = Instant::now();
    loop {
        match engine.exec(container, &["redis-cli", "ping"]).await {
            Ok(output) if output.success && output.stdout.contains("PONG") => {
                debug!(container, "redis ready");
                return Ok(());
            }
            Ok(_) | Err(_) => {}
        }
        if start.elapsed() >= deadline {
            return Err(timeout_error("redis readiness", deadline));
        }
        sleep(interval).await;
    }
}

/// Poll an HTTP endpoint until it answers 200
pub async fn wait_for_http(
    prober: &dyn HttpProber,
    url: &str,
    deadline: Duration,
    interval: Duration,
) -> Result<(), ProvisionError> {
    let start = Instant::now();
    loop {
        if prober.status(url).await == Some(200) {
            debug!(url, "endpoint ready");
            return Ok(());
        }
        if start.elapsed() >= deadline {
            return Err(timeout_error("application readiness", deadline));
        }
        sleep(interval).await;
    }
}
