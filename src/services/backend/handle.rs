use std::sync::Arc;

use tokio::sync::RwLock;

use super::{BackendError, ExamBackend, HttpBackend};
use crate::core::config::Settings;

/// Shared slot for the backend connection. Empty until `connect` or `install`
/// succeeds; every call made while empty fails with `NotInitialized`.
#[derive(Clone, Default)]
pub(crate) struct BackendHandle {
    slot: Arc<RwLock<Option<Arc<dyn ExamBackend>>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackendHealth {
    Connected,
    Disconnected,
}

impl BackendHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Builds the HTTP client when a backend URL is configured.
    /// Returns `false` when there is nothing to connect to.
    pub(crate) async fn connect(&self, settings: &Settings) -> anyhow::Result<bool> {
        let Some(base_url) = settings.backend().base_url.as_deref() else {
            return Ok(false);
        };

        let backend = HttpBackend::new(base_url, settings.backend())?;
        self.install(Arc::new(backend)).await;
        Ok(true)
    }

    pub(crate) async fn install(&self, backend: Arc<dyn ExamBackend>) {
        let mut guard = self.slot.write().await;
        *guard = Some(backend);
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.slot.write().await;
        *guard = None;
    }

    pub(crate) async fn get(&self) -> Result<Arc<dyn ExamBackend>, BackendError> {
        self.slot.read().await.clone().ok_or(BackendError::NotInitialized)
    }

    pub(crate) async fn health(&self) -> BackendHealth {
        if self.slot.read().await.is_some() {
            BackendHealth::Connected
        } else {
            BackendHealth::Disconnected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryBackend;

    #[tokio::test]
    async fn empty_handle_reports_not_initialized() {
        let handle = BackendHandle::new();

        let err = handle.get().await.err().expect("no backend yet");
        assert!(matches!(err, BackendError::NotInitialized));
        assert_eq!(err.to_string(), "actor not initialized");
        assert_eq!(handle.health().await, BackendHealth::Disconnected);
    }

    #[tokio::test]
    async fn install_then_disconnect() {
        let handle = BackendHandle::new();
        handle.install(Arc::new(InMemoryBackend::default())).await;
        assert!(handle.get().await.is_ok());
        assert_eq!(handle.health().await, BackendHealth::Connected);

        handle.disconnect().await;
        assert!(handle.get().await.is_err());
    }
}
