//! Tunnel provider seam.
//!
//! The resolver only needs one capability from a tunnel engine: "give me a
//! public URL for this local port". Providers are bound lazily so that
//! non-development runs never construct one.

pub mod ngrok;

use crate::error::TunnelError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub use ngrok::{NgrokAgentProvider, NgrokSettings};

#[async_trait]
pub trait TunnelProvider: Send + Sync {
    /// Establishes (or reuses) a tunnel to `target_port` on localhost.
    ///
    /// Returns the public base URL, or `None` when no tunnel could be
    /// established without a fault.
    async fn establish(&self, target_port: u16) -> Result<Option<String>, TunnelError>;
}

type ProviderLoader =
    Box<dyn Fn() -> Result<Arc<dyn TunnelProvider>, TunnelError> + Send + Sync>;

/// A tunnel provider resolved on first use.
///
/// Failed loads are not cached; the next caller tries again.
pub struct LazyTunnelProvider {
    loader: Option<ProviderLoader>,
    loaded: OnceCell<Arc<dyn TunnelProvider>>,
}

impl LazyTunnelProvider {
    /// No provider wired in; every lookup fails with [`TunnelError::NotConfigured`].
    #[must_use]
    pub fn not_configured() -> Self {
        Self {
            loader: None,
            loaded: OnceCell::new(),
        }
    }

    /// Defers construction to `loader`, invoked at most once successfully.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn TunnelProvider>, TunnelError> + Send + Sync + 'static,
    {
        Self {
            loader: Some(Box::new(loader)),
            loaded: OnceCell::new(),
        }
    }

    /// Wraps an already constructed provider.
    #[must_use]
    pub fn ready(provider: Arc<dyn TunnelProvider>) -> Self {
        Self {
            loader: None,
            loaded: OnceCell::new_with(Some(provider)),
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Returns the provider, loading it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::NotConfigured`] when there is neither a provider nor a
    /// loader, or whatever the loader fails with.
    pub async fn get(&self) -> Result<Arc<dyn TunnelProvider>, TunnelError> {
        if let Some(provider) = self.loaded.get() {
            return Ok(Arc::clone(provider));
        }
        let Some(loader) = &self.loader else {
            return Err(TunnelError::NotConfigured);
        };
        self.loaded
            .get_or_try_init(|| async { loader() })
            .await
            .map(Arc::clone)
    }
}
