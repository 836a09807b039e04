//! Router and shared state.

use crate::resolver::{get_webhook_url, panic_message};
use crate::tunnel::LazyTunnelProvider;
use axum::{
    Extension, Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use devtunnel_feature_gate::{ConfigSource, ExecutionMode, is_webhooks_enabled_client};
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct AppState {
    /// Read on every request; never snapshot at startup.
    pub config: Arc<dyn ConfigSource>,
    pub tunnels: LazyTunnelProvider,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/webhook-url", get(get_webhook_url))
        .route("/api/webhook-features", get(webhook_features))
        .layer(Extension(Arc::new(state)))
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Flags safe to hand to a browser. Never includes the authtoken.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookFeatures {
    webhooks_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// A faulting config source reports the feature off with HTTP 500.
async fn webhook_features(Extension(state): Extension<Arc<AppState>>) -> Response {
    let config = state.config.as_ref();
    let read = catch_unwind(AssertUnwindSafe(|| WebhookFeatures {
        webhooks_enabled: is_webhooks_enabled_client(config),
        environment: Some(ExecutionMode::from_config(config).label().to_string()),
        message: None,
    }));

    match read {
        Ok(features) => Json(features).into_response(),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(error = %message, "error reading webhook features");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookFeatures {
                    webhooks_enabled: false,
                    environment: None,
                    message: Some(message),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TunnelError;
    use crate::tunnel::TunnelProvider;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use devtunnel_feature_gate::{EXECUTION_MODE_VAR, NGROK_AUTHTOKEN_VAR, StaticConfig};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct FixedUrl(&'static str);

    #[async_trait]
    impl TunnelProvider for FixedUrl {
        async fn establish(&self, _target_port: u16) -> Result<Option<String>, TunnelError> {
            Ok(Some(self.0.to_string()))
        }
    }

    /// Configuration backend that faults on every read.
    struct BrokenConfig;

    impl ConfigSource for BrokenConfig {
        fn var(&self, name: &str) -> Option<String> {
            panic!("configuration backend unavailable while reading {name}");
        }
    }

    fn app(config: impl ConfigSource + 'static, tunnels: LazyTunnelProvider) -> Router {
        router(AppState {
            config: Arc::new(config),
            tunnels,
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app(StaticConfig::new(), LazyTunnelProvider::not_configured());
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_webhook_url_ready() {
        let config = StaticConfig::new()
            .with(EXECUTION_MODE_VAR, "development")
            .with(NGROK_AUTHTOKEN_VAR, "tok");
        let tunnels = LazyTunnelProvider::ready(Arc::new(FixedUrl("https://abc123.ngrok.io")));

        let (status, body) = get_json(app(config, tunnels), "/api/webhook-url").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["webhookUrl"], "https://abc123.ngrok.io/api/webhook");
        assert_eq!(body["tunnelUrl"], "https://abc123.ngrok.io");
    }

    #[tokio::test]
    async fn test_webhook_url_disabled_is_ok() {
        let config = StaticConfig::new().with(EXECUTION_MODE_VAR, "production");
        let (status, body) = get_json(
            app(config, LazyTunnelProvider::not_configured()),
            "/api/webhook-url",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "disabled");
        assert_eq!(body["environment"], "production");
        assert_eq!(body["webhookUrl"], Value::Null);
    }

    #[tokio::test]
    async fn test_provider_fault_is_ok() {
        let config = StaticConfig::new()
            .with(EXECUTION_MODE_VAR, "development")
            .with(NGROK_AUTHTOKEN_VAR, "tok");
        let (status, body) = get_json(
            app(config, LazyTunnelProvider::not_configured()),
            "/api/webhook-url",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(body["environment"], "development");
    }

    #[tokio::test]
    async fn test_config_fault_is_internal_error() {
        let (status, body) = get_json(
            app(BrokenConfig, LazyTunnelProvider::not_configured()),
            "/api/webhook-url",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(body["webhookUrl"], Value::Null);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("configuration backend unavailable")
        );
    }

    #[tokio::test]
    async fn test_webhook_features_hide_token() {
        let config = StaticConfig::new()
            .with(EXECUTION_MODE_VAR, "development")
            .with(NGROK_AUTHTOKEN_VAR, "secret-token");
        let (status, body) = get_json(
            app(config, LazyTunnelProvider::not_configured()),
            "/api/webhook-features",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "webhooksEnabled": true, "environment": "development" })
        );
    }

    #[tokio::test]
    async fn test_webhook_features_config_fault_is_internal_error() {
        let (status, body) = get_json(
            app(BrokenConfig, LazyTunnelProvider::not_configured()),
            "/api/webhook-features",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["webhooksEnabled"], false);
        assert!(body.get("environment").is_none());
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("configuration backend unavailable")
        );
    }

    #[tokio::test]
    async fn test_webhook_features_without_token() {
        let config = StaticConfig::new().with(EXECUTION_MODE_VAR, "development");
        let (_, body) = get_json(
            app(config, LazyTunnelProvider::not_configured()),
            "/api/webhook-features",
        )
        .await;
        assert_eq!(body["webhooksEnabled"], true);

        let (_, body) = get_json(
            app(StaticConfig::new(), LazyTunnelProvider::not_configured()),
            "/api/webhook-features",
        )
        .await;
        assert_eq!(body["webhooksEnabled"], false);
        assert_eq!(body["environment"], "unknown");
    }
}
