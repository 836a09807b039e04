//! Feature gates for webhook/tunnel functionality.
//!
//! The policy for when the tunnel is considered available lives here so the
//! server and any client-facing surface consult the same rules. Everything in
//! this crate is side-effect free: configuration is read through a
//! [`ConfigSource`], never cached.

pub mod config;
pub mod gate;
pub mod mode;

pub use config::{ConfigSource, ProcessEnv, StaticConfig};
pub use gate::{is_webhooks_enabled, is_webhooks_enabled_client, tunnel_authtoken};
pub use mode::ExecutionMode;

/// Environment variable holding the execution mode (`development`, `production`, ...).
pub const EXECUTION_MODE_VAR: &str = "APP_ENV";

/// Environment variable holding the ngrok authtoken.
pub const NGROK_AUTHTOKEN_VAR: &str = "NGROK_AUTHTOKEN";
