use crate::config::ConfigSource;
use crate::mode::ExecutionMode;
use crate::NGROK_AUTHTOKEN_VAR;

/// Returns the configured ngrok authtoken, treating blank values as unset.
#[must_use]
pub fn tunnel_authtoken(config: &dyn ConfigSource) -> Option<String> {
    config
        .var(NGROK_AUTHTOKEN_VAR)
        .filter(|v| !v.trim().is_empty())
}

/// Server-side gate: development mode AND an authtoken is configured.
#[must_use]
pub fn is_webhooks_enabled(config: &dyn ConfigSource) -> bool {
    ExecutionMode::from_config(config).is_development() && tunnel_authtoken(config).is_some()
}

/// Client-facing gate: development mode only.
///
/// The authtoken is never disclosed to clients, so this answer is optimistic:
/// the server may still report `no_authtoken`.
#[must_use]
pub fn is_webhooks_enabled_client(config: &dyn ConfigSource) -> bool {
    ExecutionMode::from_config(config).is_development()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EXECUTION_MODE_VAR, StaticConfig};

    fn cfg(mode: Option<&str>, token: Option<&str>) -> StaticConfig {
        let mut cfg = StaticConfig::new();
        if let Some(mode) = mode {
            cfg = cfg.with(EXECUTION_MODE_VAR, mode);
        }
        if let Some(token) = token {
            cfg = cfg.with(NGROK_AUTHTOKEN_VAR, token);
        }
        cfg
    }

    #[test]
    fn server_gate_requires_development_and_token() {
        assert!(is_webhooks_enabled(&cfg(Some("development"), Some("tok"))));

        for (mode, token) in [
            (Some("production"), Some("tok")),
            (Some("test"), Some("tok")),
            (None, Some("tok")),
            (Some("development"), None),
            (Some("development"), Some("")),
            (Some("development"), Some("   ")),
            (None, None),
        ] {
            assert!(
                !is_webhooks_enabled(&cfg(mode, token)),
                "mode={mode:?} token={token:?}"
            );
        }
    }

    #[test]
    fn client_gate_ignores_token() {
        assert!(is_webhooks_enabled_client(&cfg(Some("development"), None)));
        assert!(is_webhooks_enabled_client(&cfg(
            Some("development"),
            Some("tok")
        )));
        assert!(!is_webhooks_enabled_client(&cfg(Some("production"), Some("tok"))));
        assert!(!is_webhooks_enabled_client(&cfg(None, None)));
    }

    #[test]
    fn blank_token_is_unset() {
        assert_eq!(tunnel_authtoken(&cfg(None, Some(" "))), None);
        assert_eq!(
            tunnel_authtoken(&cfg(None, Some("abc"))).as_deref(),
            Some("abc")
        );
    }
}
