use crate::EXECUTION_MODE_VAR;
use crate::config::ConfigSource;
use std::fmt;

/// Execution mode as read from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    Development,
    /// Any other designation, kept verbatim (`production`, `test`, ...).
    Other(String),
    /// No execution mode configured.
    Unset,
}

impl ExecutionMode {
    /// Reads the execution mode from `config`.
    ///
    /// Only the exact value `development` selects [`ExecutionMode::Development`];
    /// an empty value counts as unset.
    #[must_use]
    pub fn from_config(config: &dyn ConfigSource) -> Self {
        match config.var(EXECUTION_MODE_VAR) {
            None => Self::Unset,
            Some(raw) if raw.is_empty() => Self::Unset,
            Some(raw) if raw == "development" => Self::Development,
            Some(raw) => Self::Other(raw),
        }
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Label reported to clients; `unknown` when unset.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Other(raw) => raw,
            Self::Unset => "unknown",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
