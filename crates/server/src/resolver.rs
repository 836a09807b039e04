//! `GET /api/webhook-url`: reports whether the development tunnel is up and,
//! if so, the public webhook URL.
//!
//! Modeled states (feature off, missing authtoken, no tunnel, provider fault)
//! are always HTTP 200 with a `status` discriminator. Only a fault outside the
//! provider call yields HTTP 500.

use crate::app::AppState;
use crate::tunnel::LazyTunnelProvider;
use axum::{
    Extension, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use devtunnel_feature_gate::{
    ConfigSource, ExecutionMode, is_webhooks_enabled, tunnel_authtoken,
};
use futures::FutureExt as _;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Local port the tunnel forwards to.
pub const TUNNEL_TARGET_PORT: u16 = 3000;

/// Path appended to the tunnel URL to form the webhook URL.
pub const WEBHOOK_PATH: &str = "/api/webhook";

const DISABLED_MESSAGE: &str =
    "Webhooks are only available in development mode with NGROK_AUTHTOKEN configured";
const NO_AUTHTOKEN_MESSAGE: &str =
    "NGROK_AUTHTOKEN not set. Set it in your environment to enable webhooks.";
const AUTHTOKEN_HELP: &str =
    "Get your free authtoken at: https://dashboard.ngrok.com/get-started/your-authtoken";
const TUNNEL_FAILED_MESSAGE: &str = "Failed to start ngrok tunnel. Check server logs for details.";
const UNKNOWN_TUNNEL_ERROR: &str = "Unknown error starting tunnel";
const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Disabled,
    NoAuthtoken,
    Ready,
    TunnelFailed,
    Error,
}

/// Body of `GET /api/webhook-url`.
///
/// Only [`WebhookUrlResponse::ready`] sets `webhookUrl`; every other
/// constructor leaves it `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookUrlResponse {
    webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<String>,
    status: WebhookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tunnel_url: Option<String>,
}

impl WebhookUrlResponse {
    fn unavailable(environment: Option<&str>, status: WebhookStatus, message: String) -> Self {
        Self {
            webhook_url: None,
            environment: environment.map(str::to_string),
            status,
            message: Some(message),
            help: None,
            tunnel_url: None,
        }
    }

    #[must_use]
    pub fn disabled(mode: &ExecutionMode) -> Self {
        Self::unavailable(
            Some(mode.label()),
            WebhookStatus::Disabled,
            DISABLED_MESSAGE.to_string(),
        )
    }

    #[must_use]
    pub fn no_authtoken() -> Self {
        Self {
            help: Some(AUTHTOKEN_HELP.to_string()),
            ..Self::unavailable(
                Some("development"),
                WebhookStatus::NoAuthtoken,
                NO_AUTHTOKEN_MESSAGE.to_string(),
            )
        }
    }

    /// `tunnel_url` is the tunnel's public base URL.
    #[must_use]
    pub fn ready(tunnel_url: String) -> Self {
        let webhook_url = format!("{}{WEBHOOK_PATH}", tunnel_url.trim_end_matches('/'));
        Self {
            webhook_url: Some(webhook_url),
            environment: Some("development".to_string()),
            status: WebhookStatus::Ready,
            message: None,
            help: None,
            tunnel_url: Some(tunnel_url),
        }
    }

    #[must_use]
    pub fn tunnel_failed() -> Self {
        Self::unavailable(
            Some("development"),
            WebhookStatus::TunnelFailed,
            TUNNEL_FAILED_MESSAGE.to_string(),
        )
    }

    /// Provider fault, downgraded to a modeled state.
    #[must_use]
    pub fn tunnel_error(message: impl Into<String>) -> Self {
        Self::unavailable(
            Some("development"),
            WebhookStatus::Error,
            non_empty_or(message.into(), UNKNOWN_TUNNEL_ERROR),
        )
    }

    /// Fault outside the provider call; served with HTTP 500.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::unavailable(
            None,
            WebhookStatus::Error,
            non_empty_or(message.into(), UNKNOWN_ERROR),
        )
    }

    #[must_use]
    pub fn status(&self) -> WebhookStatus {
        self.status
    }

    #[must_use]
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    #[must_use]
    pub fn tunnel_url(&self) -> Option<&str> {
        self.tunnel_url.as_deref()
    }

    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Runs the gate checks and, in development, asks the provider for a tunnel.
pub async fn resolve_webhook_url(
    config: &dyn ConfigSource,
    tunnels: &LazyTunnelProvider,
) -> WebhookUrlResponse {
    if !is_webhooks_enabled(config) {
        let mode = ExecutionMode::from_config(config);
        if mode.is_development() && tunnel_authtoken(config).is_none() {
            return WebhookUrlResponse::no_authtoken();
        }
        return WebhookUrlResponse::disabled(&mode);
    }

    let outcome = match tunnels.get().await {
        Ok(provider) => provider.establish(TUNNEL_TARGET_PORT).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(Some(url)) if !url.trim().is_empty() => WebhookUrlResponse::ready(url),
        Ok(_) => WebhookUrlResponse::tunnel_failed(),
        Err(e) => {
            tracing::error!(error = %e, "error starting tunnel");
            WebhookUrlResponse::tunnel_error(e.to_string())
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_ERROR.to_string()
    }
}

pub async fn get_webhook_url(Extension(state): Extension<Arc<AppState>>) -> Response {
    let resolved = AssertUnwindSafe(resolve_webhook_url(
        state.config.as_ref(),
        &state.tunnels,
    ))
    .catch_unwind()
    .await;

    match resolved {
        Ok(body) => Json(body).into_response(),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(error = %message, "error getting webhook URL");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookUrlResponse::unexpected(message)),
            )
                .into_response()
        }
    }
}
