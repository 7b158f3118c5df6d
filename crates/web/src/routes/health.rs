//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    backend: String,
    table: String,
    active_sessions: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend_name().to_string(),
        table: state.table().to_string(),
        active_sessions: state.sessions().len().await,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{body_text, build_app, get};
    use axum::http::StatusCode;
    use serde_json::Value;

    #[tokio::test]
    async fn reports_backend_and_sessions() {
        let (app, _backend) = build_app();
        get(&app, "/", None).await;

        let response = get(&app, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "memory");
        assert_eq!(body["table"], "todos");
        assert_eq!(body["activeSessions"], 1);
    }
}
