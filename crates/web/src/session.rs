//! Browser sessions
//!
//! A cookie maps each browser to its own remote client and, while the task
//! list is open, its own task store.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use todo_core::gate::Route;
use todo_core::remote::{RemoteConnector, RemoteDataService};
use todo_core::store::{Mounted, TaskStore};

pub const SESSION_COOKIE: &str = "todo_sid";

/// State owned by one browser
pub struct ClientSession {
    remote: Arc<dyn RemoteDataService>,
    tasks: RwLock<Option<Arc<TaskStore>>>,
}

impl ClientSession {
    fn new(remote: Arc<dyn RemoteDataService>) -> Self {
        Self {
            remote,
            tasks: RwLock::new(None),
        }
    }

    pub fn remote(&self) -> &Arc<dyn RemoteDataService> {
        &self.remote
    }

    /// The mounted task store, if the task list is open
    pub async fn task_store(&self) -> Option<Arc<TaskStore>> {
        self.tasks.read().await.clone()
    }

    /// Return the mounted store, mounting it first if needed
    pub async fn mount_tasks(&self, table: &str) -> Result<Arc<TaskStore>, Route> {
        if let Some(store) = self.task_store().await {
            return Ok(store);
        }

        match TaskStore::mount(Arc::clone(&self.remote), table).await {
            Mounted::Ready(store) => {
                let store = Arc::new(store);
                *self.tasks.write().await = Some(Arc::clone(&store));
                Ok(store)
            }
            Mounted::Redirect(route) => Err(route),
        }
    }

    /// Close the task list; the store is torn down once in-flight handlers finish with it
    pub async fn unmount_tasks(&self) {
        let Some(store) = self.tasks.write().await.take() else {
            return;
        };
        match Arc::try_unwrap(store) {
            Ok(store) => store.teardown(),
            Err(_) => debug!("Task store still in use; dropping after in-flight calls"),
        }
    }
}

struct SessionEntry {
    session: Arc<ClientSession>,
    last_seen: Instant,
}

/// A resolved session plus the cookie to send if it was just created
pub struct SessionHandle {
    pub session: Arc<ClientSession>,
    set_cookie: Option<HeaderValue>,
}

impl SessionHandle {
    /// Attach the session cookie to a response when needed
    pub fn respond(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Some(cookie) = self.set_cookie {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        response
    }
}

/// All live sessions, keyed by cookie value
pub struct SessionRegistry {
    connector: Arc<dyn RemoteConnector>,
    secure_cookie: bool,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(connector: Arc<dyn RemoteConnector>, secure_cookie: bool) -> Self {
        Self {
            connector,
            secure_cookie,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Find the caller's session or start a new one
    pub async fn resolve(&self, headers: &HeaderMap) -> SessionHandle {
        let mut sessions = self.sessions.write().await;

        if let Some(id) = session_id_from_headers(headers) {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = Instant::now();
                return SessionHandle {
                    session: Arc::clone(&entry.session),
                    set_cookie: None,
                };
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        let session = Arc::new(ClientSession::new(self.connector.connect()));
        sessions.insert(
            id.clone(),
            SessionEntry {
                session: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );
        debug!("Started session {}", id);

        SessionHandle {
            session,
            set_cookie: HeaderValue::from_str(&self.cookie_value(&id)).ok(),
        }
    }

    fn cookie_value(&self, id: &str) -> String {
        let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than `idle`
    pub async fn cleanup_idle(&self, idle: Duration) {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= idle);

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Expired {} idle sessions", removed);
        }
    }
}

/// Start the idle-session sweeper background task
pub fn start_session_sweeper(registry: Arc<SessionRegistry>, idle: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            registry.cleanup_idle(idle).await;
        }
    });
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_core::remote::MemoryBackend;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(MemoryBackend::new()), false)
    }

    fn cookie_header(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn cookie_id(handle: &SessionHandle) -> String {
        let cookie = handle.set_cookie.as_ref().unwrap().to_str().unwrap();
        let pair = cookie.split(';').next().unwrap();
        pair.split_once('=').unwrap().1.to_string()
    }

    #[test]
    fn parses_session_cookie() {
        let headers = cookie_header("theme=dark; todo_sid=abc123; other=1");
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc123"));
        assert!(session_id_from_headers(&cookie_header("theme=dark")).is_none());
        assert!(session_id_from_headers(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn reuses_known_session() {
        let registry = registry();
        let first = registry.resolve(&HeaderMap::new()).await;
        let id = cookie_id(&first);

        let second = registry
            .resolve(&cookie_header(&format!("{}={}", SESSION_COOKIE, id)))
            .await;
        assert!(second.set_cookie.is_none());
        assert!(Arc::ptr_eq(&first.session, &second.session));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_cookie_starts_new_session() {
        let registry = registry();
        let handle = registry.resolve(&cookie_header("todo_sid=stale")).await;
        assert!(handle.set_cookie.is_some());
        assert_ne!(cookie_id(&handle), "stale");
    }

    #[tokio::test]
    async fn secure_cookie_flag() {
        let registry = SessionRegistry::new(Arc::new(MemoryBackend::new()), true);
        let handle = registry.resolve(&HeaderMap::new()).await;
        let cookie = handle.set_cookie.unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[tokio::test]
    async fn cleanup_drops_idle_sessions() {
        let registry = registry();
        registry.resolve(&HeaderMap::new()).await;
        registry.resolve(&HeaderMap::new()).await;

        registry.cleanup_idle(Duration::from_secs(3600)).await;
        assert_eq!(registry.len().await, 2);

        tokio::time::sleep(Duration::from_millis(5)).await;
        registry.cleanup_idle(Duration::ZERO).await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn mount_requires_sign_in_and_unmount_tears_down() {
        let backend = MemoryBackend::new();
        backend.register("s@example.com", "password").await.unwrap();
        let session = ClientSession::new(backend.connect());

        assert_eq!(session.mount_tasks("todos").await.err(), Some(Route::Login));

        session
            .remote()
            .sign_in("s@example.com", "password")
            .await
            .unwrap();
        let store = session.mount_tasks("todos").await.unwrap();
        let again = session.mount_tasks("todos").await.unwrap();
        assert!(Arc::ptr_eq(&store, &again));

        drop(store);
        drop(again);
        session.unmount_tasks().await;
        assert!(session.task_store().await.is_none());
    }
}
