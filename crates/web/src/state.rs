//! Application state

use axum::http::HeaderMap;
use std::sync::Arc;

use todo_core::remote::{MemoryBackend, RemoteConnector, SupabaseConnector};

use crate::config::{Backend, WebConfig};
use crate::session::{SessionHandle, SessionRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    backend_name: &'static str,
    table: String,
    sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Build the state for the configured backend
    pub fn new(config: &WebConfig) -> todo_core::Result<Self> {
        let connector: Arc<dyn RemoteConnector> = match &config.backend {
            Backend::Supabase(supabase) => Arc::new(SupabaseConnector::new(supabase.clone())?),
            Backend::Memory => Arc::new(MemoryBackend::new()),
        };

        Ok(Self::with_connector(
            connector,
            config.backend.name(),
            config.table.clone(),
            config.secure_cookie,
        ))
    }

    pub fn with_connector(
        connector: Arc<dyn RemoteConnector>,
        backend_name: &'static str,
        table: impl Into<String>,
        secure_cookie: bool,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                backend_name,
                table: table.into(),
                sessions: Arc::new(SessionRegistry::new(connector, secure_cookie)),
            }),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend_name
    }

    pub fn table(&self) -> &str {
        &self.inner.table
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.inner.sessions
    }

    /// Resolve the caller's browser session
    pub async fn session(&self, headers: &HeaderMap) -> SessionHandle {
        self.inner.sessions.resolve(headers).await
    }
}
