//! Route handlers

pub mod auth;
pub mod health;
pub mod tasks;

use axum::http::{header, HeaderValue, Uri};
use axum::response::Redirect;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use todo_core::gate::Route;

use crate::state::AppState;

/// Unknown paths go back to a known view
async fn fallback(uri: Uri) -> Redirect {
    Redirect::to(Route::resolve(uri.path()).path())
}

/// The full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(tasks::router())
        .fallback(fallback)
        .with_state(state)
        // Pages are per-session
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, Response, StatusCode},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    use todo_core::remote::MemoryBackend;

    use crate::state::AppState;

    pub fn build_app() -> (Router, MemoryBackend) {
        let backend = MemoryBackend::new();
        let state = AppState::with_connector(Arc::new(backend.clone()), "memory", "todos", false);
        (super::app(state), backend)
    }

    pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(
        app: &Router,
        uri: &str,
        form: &str,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(builder.body(Body::from(form.to_string())).unwrap())
            .await
            .unwrap()
    }

    /// `name=value` part of the response's session cookie
    pub fn session_cookie(response: &Response<Body>) -> String {
        let raw = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    pub fn location(response: &Response<Body>) -> &str {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Register and sign in through the form; returns the session cookie
    pub async fn signed_in(app: &Router, email: &str) -> String {
        let response = post_form(
            app,
            "/auth",
            &format!("mode=signup&email={}&password=secret-pass", email),
            None,
        )
        .await;
        let cookie = session_cookie(&response);
        assert_eq!(location(&response), "/todos");
        cookie
    }
}
