//! Error types for the devtunnel server.

use thiserror::Error;

/// Faults raised while establishing a tunnel.
///
/// The resolver downgrades these to a modeled `error` status; only the
/// [`Display`](std::fmt::Display) text reaches the client.
#[derive(Error, Debug)]
pub enum TunnelError {
    /// No tunnel provider is wired into this server.
    #[error("tunnel provider is not configured")]
    NotConfigured,

    /// The provider could not be loaded.
    #[error("failed to load tunnel provider: {0}")]
    Load(String),

    /// The tunnel agent process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The agent API answered with something unusable.
    #[error("tunnel agent API error: {0}")]
    AgentApi(String),

    /// Provider-defined fault, reported verbatim.
    #[error("{0}")]
    Provider(String),

    /// Transport errors talking to the agent API.
    #[error("tunnel agent unreachable: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for TunnelError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.without_url().to_string())
    }
}

/// Startup errors for the server binary.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid runtime configuration (bad bind address, unknown log level).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The listener could not be bound or served.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
