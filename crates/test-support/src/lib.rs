use anyhow::Context as _;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::Child;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll an HTTP URL until it returns a success status (2xx/3xx).
///
/// # Errors
///
/// Returns an error if the timeout elapses before the endpoint returns a success status.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

/// In-process stand-in for the ngrok agent's local API.
///
/// Serves a fixed `GET /api/tunnels` listing; the server stops when dropped.
pub struct FakeNgrokAgent {
    base_url: String,
    task: JoinHandle<()>,
}

impl FakeNgrokAgent {
    /// Start an agent reporting one https tunnel from `public_url` to `localhost:<port>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn with_tunnel(public_url: &str, port: u16) -> anyhow::Result<Self> {
        Self::start(json!({
            "tunnels": [{
                "name": "command_line",
                "public_url": public_url,
                "proto": "https",
                "config": { "addr": format!("http://localhost:{port}"), "inspect": true }
            }],
            "uri": "/api/tunnels"
        }))
        .await
    }

    /// Start an agent that reports no tunnels.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn empty() -> anyhow::Result<Self> {
        Self::start(json!({ "tunnels": [], "uri": "/api/tunnels" })).await
    }

    async fn start(listing: Value) -> anyhow::Result<Self> {
        let app = Router::new().route(
            "/api/tunnels",
            get(move || {
                let listing = listing.clone();
                async move { Json(listing) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind fake ngrok agent")?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self {
            base_url: format!("http://{addr}"),
            task,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for FakeNgrokAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}
