//! ngrok agent-backed tunnel provider.
//!
//! Talks to the local ngrok agent API (`/api/tunnels`) to discover tunnels and
//! spawns `ngrok http <port>` when none targets the requested port. The
//! authtoken is read from configuration at spawn time and handed to the agent
//! through its environment; it is never logged.

use super::TunnelProvider;
use crate::error::TunnelError;
use async_trait::async_trait;
use devtunnel_feature_gate::{ConfigSource, NGROK_AUTHTOKEN_VAR, tunnel_authtoken};
use serde::Deserialize;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

#[derive(Debug, Clone)]
pub struct NgrokSettings {
    /// Program used to start the agent.
    pub program: String,
    /// Base URL of the agent's local API.
    pub api_url: Url,
    /// How long to wait for a freshly spawned agent to report a public URL.
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct TunnelList {
    #[serde(default)]
    tunnels: Vec<AgentTunnel>,
}

#[derive(Debug, Deserialize)]
struct AgentTunnel {
    public_url: String,
    #[serde(default)]
    config: AgentTunnelConfig,
}

#[derive(Debug, Default, Deserialize)]
struct AgentTunnelConfig {
    #[serde(default)]
    addr: String,
}

/// Matches agent `addr` values such as `http://localhost:3000`, `localhost:3000` or `3000`.
fn addr_targets_port(addr: &str, port: u16) -> bool {
    addr.trim_end_matches('/')
        .rsplit(':')
        .next()
        .and_then(|p| p.parse::<u16>().ok())
        == Some(port)
}

fn https_url_for_port(list: &TunnelList, port: u16) -> Option<String> {
    list.tunnels
        .iter()
        .filter(|t| addr_targets_port(&t.config.addr, port))
        .find(|t| t.public_url.starts_with("https://"))
        .map(|t| t.public_url.clone())
}

struct SpawnedTunnel {
    port: u16,
    public_url: String,
    child: Child,
}

impl SpawnedTunnel {
    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

pub struct NgrokAgentProvider {
    settings: NgrokSettings,
    config: Arc<dyn ConfigSource>,
    http: reqwest::Client,
    spawned: Mutex<Option<SpawnedTunnel>>,
}

impl NgrokAgentProvider {
    /// # Errors
    ///
    /// Returns [`TunnelError::Load`] if the agent API client cannot be built.
    pub fn new(settings: NgrokSettings, config: Arc<dyn ConfigSource>) -> Result<Self, TunnelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| TunnelError::Load(e.to_string()))?;
        Ok(Self {
            settings,
            config,
            http,
            spawned: Mutex::new(None),
        })
    }

    async fn lookup(&self, port: u16) -> Result<Option<String>, TunnelError> {
        let url = self
            .settings
            .api_url
            .join("api/tunnels")
            .map_err(|e| TunnelError::AgentApi(format!("invalid agent API url: {e}")))?;
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TunnelError::AgentApi(format!(
                "GET /api/tunnels returned {status}"
            )));
        }
        let list: TunnelList = resp.json().await?;
        Ok(https_url_for_port(&list, port))
    }

    fn spawn_agent(&self, port: u16) -> Result<Child, TunnelError> {
        let mut cmd = Command::new(&self.settings.program);
        cmd.arg("http")
            .arg(port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(token) = tunnel_authtoken(self.config.as_ref()) {
            cmd.env(NGROK_AUTHTOKEN_VAR, token);
        }
        cmd.spawn().map_err(|source| TunnelError::Spawn {
            program: self.settings.program.clone(),
            source,
        })
    }

    async fn wait_for_public_url(&self, child: &mut Child, port: u16) -> Option<String> {
        let deadline = Instant::now() + self.settings.startup_timeout;
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                tracing::warn!(port, %status, "ngrok agent exited before the tunnel came up");
                return None;
            }
            match self.lookup(port).await {
                Ok(Some(url)) => return Some(url),
                Ok(None) => {}
                Err(e) => tracing::debug!(port, error = %e, "ngrok agent not ready"),
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    port,
                    timeout_secs = self.settings.startup_timeout.as_secs(),
                    "timed out waiting for ngrok tunnel"
                );
                let _ = child.kill().await;
                return None;
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

#[async_trait]
impl TunnelProvider for NgrokAgentProvider {
    async fn establish(&self, target_port: u16) -> Result<Option<String>, TunnelError> {
        let mut spawned = self.spawned.lock().await;

        if let Some(tunnel) = spawned.as_mut() {
            if tunnel.port == target_port && tunnel.is_alive() {
                return Ok(Some(tunnel.public_url.clone()));
            }
            tracing::info!(port = tunnel.port, "discarding stale ngrok agent");
            *spawned = None;
        }

        // An agent started outside this process may already serve the port.
        match self.lookup(target_port).await {
            Ok(Some(url)) => {
                tracing::info!(port = target_port, url = %url, "reusing running ngrok tunnel");
                return Ok(Some(url));
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "no ngrok agent running"),
        }

        let mut child = self.spawn_agent(target_port)?;
        let Some(public_url) = self.wait_for_public_url(&mut child, target_port).await else {
            return Ok(None);
        };
        tracing::info!(port = target_port, url = %public_url, "ngrok tunnel started");
        *spawned = Some(SpawnedTunnel {
            port: target_port,
            public_url: public_url.clone(),
            child,
        });
        Ok(Some(public_url))
    }
}
