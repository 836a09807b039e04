use std::collections::HashMap;

/// Read-only access to process configuration.
///
/// Implementations must not cache: callers expect every lookup to reflect the
/// current configuration.
pub trait ConfigSource: Send + Sync {
    /// Returns the value of `name`, or `None` when unset or unreadable.
    fn var(&self, name: &str) -> Option<String>;
}

/// [`ConfigSource`] backed by the process environment.
///
/// Values that are not valid UTF-8 are reported as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed, in-memory [`ConfigSource`].
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    vars: HashMap<String, String>,
}

impl StaticConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for StaticConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for StaticConfig {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
