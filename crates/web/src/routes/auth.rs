//! Login, sign-up and sign-out

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{info, warn};

use todo_core::gate::Route;
use todo_core::remote::SignUpOutcome;

use crate::state::AppState;
use crate::view::{AuthMode, AuthPage};

pub const CONFIRMATION_MESSAGE: &str = "Check your email for the login link!";

#[derive(Debug, Deserialize)]
struct AuthQuery {
    #[serde(default)]
    mode: AuthMode,
}

#[derive(Debug, Deserialize)]
struct AuthForm {
    #[serde(default)]
    mode: AuthMode,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Landing page; leaving the task list tears its store down
async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuthQuery>,
) -> Response {
    let handle = state.session(&headers).await;
    handle.session.unmount_tasks().await;
    handle.respond(Html(AuthPage::new(query.mode).render()))
}

async fn submit_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AuthForm>,
) -> Response {
    let handle = state.session(&headers).await;
    // The mounted list belongs to whoever was signed in before this attempt
    handle.session.unmount_tasks().await;
    let remote = handle.session.remote().clone();

    let mut page = AuthPage {
        mode: form.mode,
        email: form.email.clone(),
        ..AuthPage::default()
    };

    match form.mode {
        AuthMode::Login => match remote.sign_in(&form.email, &form.password).await {
            Ok(identity) => {
                info!("User {} signed in", identity.id);
                return handle.respond(Redirect::to(Route::Tasks.path()));
            }
            Err(e) => {
                warn!("Sign-in failed: {}", e);
                page.error = Some(e.to_string());
            }
        },
        AuthMode::Signup => match remote.sign_up(&form.email, &form.password).await {
            Ok(SignUpOutcome::SignedIn(identity)) => {
                info!("User {} signed up", identity.id);
                return handle.respond(Redirect::to(Route::Tasks.path()));
            }
            Ok(SignUpOutcome::ConfirmationRequired) => {
                info!("Sign-up pending email confirmation");
                page.message = Some(CONFIRMATION_MESSAGE.to_string());
            }
            Err(e) => {
                warn!("Sign-up failed: {}", e);
                page.error = Some(e.to_string());
            }
        },
    }

    handle.respond(Html(page.render()))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = state.session(&headers).await;
    handle.session.unmount_tasks().await;
    handle.session.remote().sign_out().await;
    handle.respond(Redirect::to(Route::Login.path()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(login_page))
        .route("/auth", post(submit_auth))
        .route("/logout", post(logout))
}
