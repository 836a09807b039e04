use anyhow::Context as _;
use std::process::{Command, Stdio};
use std::time::Duration;

pub use devtunnel_test_support::{FakeNgrokAgent, KillOnDrop, pick_unused_port, wait_http_ok};

/// How the spawned server sees its environment.
#[derive(Default)]
pub struct Launch<'a> {
    pub app_env: Option<&'a str>,
    pub authtoken: Option<&'a str>,
    pub ngrok_api: Option<&'a str>,
    pub ngrok_bin: Option<&'a str>,
}

pub async fn start_devtunnel(launch: Launch<'_>) -> anyhow::Result<(String, KillOnDrop)> {
    let port = pick_unused_port()?;
    let bin = env!("CARGO_BIN_EXE_devtunnel");

    let mut cmd = Command::new(bin);
    cmd.arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--log-level")
        .arg("info")
        .arg("--tunnel-startup-timeout-secs")
        .arg("2")
        .env_remove("APP_ENV")
        .env_remove("NGROK_AUTHTOKEN")
        .env_remove("RUST_LOG")
        .stdout(Stdio::null());
    if let Some(v) = launch.app_env {
        cmd.env("APP_ENV", v);
    }
    if let Some(v) = launch.authtoken {
        cmd.env("NGROK_AUTHTOKEN", v);
    }
    // Never let tests reach a real agent on the default port.
    cmd.arg("--ngrok-api")
        .arg(launch.ngrok_api.unwrap_or("http://127.0.0.1:9"));
    cmd.arg("--ngrok-bin")
        .arg(launch.ngrok_bin.unwrap_or("/nonexistent/ngrok"));

    let child = KillOnDrop(cmd.spawn().context("spawn devtunnel")?);
    let base_url = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base_url}/health"), Duration::from_secs(20)).await?;
    Ok((base_url, child))
}

pub async fn get_json(url: &str) -> anyhow::Result<(reqwest::StatusCode, serde_json::Value)> {
    let resp = reqwest::get(url).await.context("GET")?;
    let status = resp.status();
    let body = resp.json().await.context("decode json")?;
    Ok((status, body))
}
