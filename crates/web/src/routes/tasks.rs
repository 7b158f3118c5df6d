//! Task list page and its form actions
//!
//! Every action posts back and redirects to `/todos`, which renders the
//! session's store. Actions against a closed task list just redirect, so the
//! list mounts (and the gate runs) first.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{Html, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use todo_core::gate::Route;
use todo_core::store::{Draft, TaskStore};
use todo_core::task::TaskId;

use crate::session::SessionHandle;
use crate::state::AppState;
use crate::view::render_tasks_page;

#[derive(Debug, Deserialize)]
struct TaskForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
}

fn back_to_list() -> Redirect {
    Redirect::to(Route::Tasks.path())
}

/// Path segment as a task id; anything else matches no task
fn parse_task_id(raw: &str) -> Option<TaskId> {
    raw.parse::<i64>().ok().map(TaskId)
}

async fn open_store(state: &AppState, headers: &HeaderMap) -> (SessionHandle, Option<Arc<TaskStore>>) {
    let handle = state.session(headers).await;
    let store = handle.session.task_store().await;
    (handle, store)
}

async fn list_tasks(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = state.session(&headers).await;
    match handle.session.mount_tasks(state.table()).await {
        Ok(store) => {
            let snapshot = store.snapshot().await;
            handle.respond(Html(render_tasks_page(&snapshot)))
        }
        Err(route) => handle.respond(Redirect::to(route.path())),
    }
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TaskForm>,
) -> Response {
    let (handle, store) = open_store(&state, &headers).await;
    if let Some(store) = store {
        store.create(Draft::new(form.title, form.text)).await;
    }
    handle.respond(back_to_list())
}

async fn toggle_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let (handle, store) = open_store(&state, &headers).await;
    if let (Some(store), Some(id)) = (store, parse_task_id(&raw_id)) {
        store.toggle(id).await;
    }
    handle.respond(back_to_list())
}

async fn begin_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let (handle, store) = open_store(&state, &headers).await;
    if let (Some(store), Some(id)) = (store, parse_task_id(&raw_id)) {
        store.begin_edit(id).await;
    }
    handle.respond(back_to_list())
}

async fn save_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TaskForm>,
) -> Response {
    let (handle, store) = open_store(&state, &headers).await;
    if let Some(store) = store {
        store.edit_scratch(form.title, form.text).await;
        store.commit_edit().await;
    }
    handle.respond(back_to_list())
}

async fn cancel_edit(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (handle, store) = open_store(&state, &headers).await;
    if let Some(store) = store {
        store.cancel_edit().await;
    }
    handle.respond(back_to_list())
}

async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let (handle, store) = open_store(&state, &headers).await;
    if let (Some(store), Some(id)) = (store, parse_task_id(&raw_id)) {
        store.delete(id).await;
    }
    handle.respond(back_to_list())
}

async fn dismiss_notice(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (handle, store) = open_store(&state, &headers).await;
    if let Some(store) = store {
        store.dismiss_notice().await;
    }
    handle.respond(back_to_list())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_tasks).post(create_task))
        .route("/todos/{id}/toggle", post(toggle_task))
        .route("/todos/{id}/edit", post(begin_edit))
        .route("/todos/{id}/delete", post(delete_task))
        .route("/todos/edit/save", post(save_edit))
        .route("/todos/edit/cancel", post(cancel_edit))
        .route("/todos/notice/dismiss", post(dismiss_notice))
}
