//! Session gate
//!
//! Decides whether the task-list view may load, and the route map the
//! redirect targets live in.

use tracing::debug;

use crate::remote::{Identity, RemoteDataService};

/// Client-side routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login / sign-up form
    Login,
    /// The signed-in user's task list
    Tasks,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/",
            Self::Tasks => "/todos",
        }
    }

    /// Map a request path to a route; unknown paths land on the login view
    pub fn resolve(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/todos" => Self::Tasks,
            _ => Self::Login,
        }
    }
}

/// What a view should do after checking the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Proceed(Identity),
    Redirect(Route),
}

/// Query the current identity once; no retry
pub async fn check(remote: &dyn RemoteDataService) -> GateOutcome {
    match remote.current_identity().await {
        Some(identity) => GateOutcome::Proceed(identity),
        None => {
            debug!("No authenticated identity; redirecting to login");
            GateOutcome::Redirect(Route::Login)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBackend;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Login.path(), "/");
        assert_eq!(Route::Tasks.path(), "/todos");
        assert_eq!(Route::resolve("/todos"), Route::Tasks);
        assert_eq!(Route::resolve("/todos/"), Route::Tasks);
        assert_eq!(Route::resolve("/"), Route::Login);
        assert_eq!(Route::resolve("/anything/else"), Route::Login);
    }

    #[tokio::test]
    async fn test_gate_redirects_anonymous() {
        let backend = MemoryBackend::new();
        let service = backend.service();
        assert_eq!(check(&service).await, GateOutcome::Redirect(Route::Login));
    }

    #[tokio::test]
    async fn test_gate_proceeds_when_signed_in() {
        let backend = MemoryBackend::new();
        backend.register("gate@example.com", "password").await.unwrap();
        let service = backend.service();
        let identity = service.sign_in("gate@example.com", "password").await.unwrap();

        assert_eq!(check(&service).await, GateOutcome::Proceed(identity));
    }
}
