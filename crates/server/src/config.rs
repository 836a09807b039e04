//! Runtime configuration for the `devtunnel` binary.
//!
//! Webhook gating (`APP_ENV`, `NGROK_AUTHTOKEN`) is deliberately not part of
//! this struct: it is read per request through a `ConfigSource`.

use crate::tunnel::NgrokSettings;
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "devtunnel",
    version,
    about = "Report the public webhook URL of a development ngrok tunnel"
)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arg(long, env = "DEVTUNNEL_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Default log filter; `RUST_LOG` takes precedence when set.
    #[arg(long, env = "DEVTUNNEL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "DEVTUNNEL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// ngrok executable used to start the agent.
    #[arg(long, env = "DEVTUNNEL_NGROK_BIN", default_value = "ngrok")]
    pub ngrok_bin: String,

    /// Base URL of the ngrok agent's local API.
    #[arg(long, env = "DEVTUNNEL_NGROK_API", default_value = "http://127.0.0.1:4040")]
    pub ngrok_api: Url,

    /// Seconds to wait for a spawned agent to publish its tunnel.
    #[arg(long, env = "DEVTUNNEL_TUNNEL_STARTUP_TIMEOUT_SECS", default_value_t = 15)]
    pub tunnel_startup_timeout_secs: u64,
}

impl ServerArgs {
    #[must_use]
    pub fn ngrok_settings(&self) -> NgrokSettings {
        NgrokSettings {
            program: self.ngrok_bin.clone(),
            api_url: self.ngrok_api.clone(),
            startup_timeout: Duration::from_secs(self.tunnel_startup_timeout_secs),
            poll_interval: Duration::from_millis(250),
        }
    }
}
