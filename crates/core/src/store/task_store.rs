//! Task store with mount/teardown lifecycle

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::gate::{self, GateOutcome, Route};
use crate::remote::{Identity, RecordFilter, RecordOrder, RemoteDataService};
use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// Table holding task rows
pub const DEFAULT_TABLE: &str = "todos";

/// Notice shown when an insert fails in a way that points at an outdated table
pub const SCHEMA_HINT: &str =
    "Error: Database schema update required (missing title/text columns).";

const SCHEMA_ERROR_MARKERS: [&str; 2] = [
    "violates not-null constraint",
    "column \"title\" does not exist",
];

/// Contents of the create form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub text: String,
}

impl Draft {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// The single task currently in inline-edit mode, with its scratch fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCursor {
    pub id: TaskId,
    pub title: String,
    pub text: String,
}

/// Read-only copy of the store for rendering
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub tasks: Arc<Vec<Task>>,
    pub loading: bool,
    pub draft: Draft,
    pub editing: Option<EditCursor>,
    pub notice: Option<String>,
}

impl StoreSnapshot {
    pub fn is_editing(&self, id: TaskId) -> bool {
        self.editing.as_ref().is_some_and(|cursor| cursor.id == id)
    }
}

#[derive(Default)]
struct StoreState {
    tasks: Arc<Vec<Task>>,
    loading: bool,
    draft: Draft,
    editing: Option<EditCursor>,
    notice: Option<String>,
}

/// Result of mounting the task-list view
pub enum Mounted {
    Ready(TaskStore),
    Redirect(Route),
}

/// In-memory mirror of one user's task rows.
///
/// Each operation snapshots the list, awaits the backend without holding a
/// lock, then replaces the list with one derived from its snapshot. Calls that
/// resolve out of order are last-resolved-wins.
pub struct TaskStore {
    remote: Arc<dyn RemoteDataService>,
    table: String,
    owner: Identity,
    state: RwLock<StoreState>,
}

fn matches_schema_hint(message: &str) -> bool {
    SCHEMA_ERROR_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

impl TaskStore {
    /// Run the session gate, then load the owner's tasks
    pub async fn mount(remote: Arc<dyn RemoteDataService>, table: impl Into<String>) -> Mounted {
        let owner = match gate::check(remote.as_ref()).await {
            GateOutcome::Proceed(identity) => identity,
            GateOutcome::Redirect(route) => return Mounted::Redirect(route),
        };

        let store = Self {
            remote,
            table: table.into(),
            owner,
            state: RwLock::new(StoreState {
                loading: true,
                ..StoreState::default()
            }),
        };
        info!("Task store mounted for {}", store.owner.id);
        store.load().await;
        Mounted::Ready(store)
    }

    /// Drop the store when its view goes away
    pub fn teardown(self) {
        info!("Task store torn down for {}", self.owner.id);
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            tasks: Arc::clone(&state.tasks),
            loading: state.loading,
            draft: state.draft.clone(),
            editing: state.editing.clone(),
            notice: state.notice.clone(),
        }
    }

    pub async fn tasks(&self) -> Arc<Vec<Task>> {
        Arc::clone(&self.state.read().await.tasks)
    }

    async fn replace_tasks(&self, tasks: Vec<Task>) {
        self.state.write().await.tasks = Arc::new(tasks);
    }

    /// Fetch all of the owner's rows, newest first. Failures leave the list empty.
    pub async fn load(&self) {
        let filter = RecordFilter::eq("user_id", self.owner.id.clone());
        let result = self
            .remote
            .list_records(&self.table, Some(&filter), &RecordOrder::descending("id"))
            .await;

        let tasks = match result {
            Ok(rows) => rows.into_iter().map(Task::from).collect(),
            Err(e) => {
                error!("Error fetching tasks: {}", e);
                Vec::new()
            }
        };
        debug!("Loaded {} tasks", tasks.len());

        let mut state = self.state.write().await;
        state.tasks = Arc::new(tasks);
        state.loading = false;
    }

    /// Insert a task and put it at the head of the list.
    ///
    /// Returns whether the list changed. An empty title issues no call at all.
    pub async fn create(&self, draft: Draft) -> bool {
        if draft.title.trim().is_empty() {
            return false;
        }

        let Some(identity) = self.remote.current_identity().await else {
            debug!("Create skipped: no authenticated identity");
            return false;
        };

        let snapshot = self.tasks().await;
        let record = NewTask::new(draft.title.clone(), draft.text.clone(), identity.id);

        match self.remote.insert_record(&self.table, &record).await {
            Ok(row) => {
                let mut tasks = Vec::with_capacity(snapshot.len() + 1);
                tasks.push(Task::from(row));
                tasks.extend(snapshot.iter().cloned());

                let mut state = self.state.write().await;
                state.tasks = Arc::new(tasks);
                state.draft = Draft::default();
                state.notice = None;
                true
            }
            Err(e) => {
                error!("Error adding task: {}", e);
                let mut state = self.state.write().await;
                if matches_schema_hint(e.message()) {
                    state.notice = Some(SCHEMA_HINT.to_string());
                }
                state.draft = draft;
                false
            }
        }
    }

    /// Flip one task's completion flag; ignored while that task is being edited
    pub async fn toggle(&self, id: TaskId) -> bool {
        let snapshot = self.snapshot().await;
        if snapshot.is_editing(id) {
            return false;
        }
        let Some(current) = snapshot.tasks.iter().find(|t| t.id == id) else {
            return false;
        };

        let patch = TaskPatch::completion(!current.is_complete);
        if let Err(e) = self.remote.update_record(&self.table, id, &patch).await {
            error!("Error updating task {}: {}", id, e);
            return false;
        }

        let tasks = snapshot
            .tasks
            .iter()
            .map(|t| {
                let mut t = t.clone();
                if t.id == id {
                    t.is_complete = !t.is_complete;
                }
                t
            })
            .collect();
        self.replace_tasks(tasks).await;
        true
    }

    /// Put `id` in edit mode, discarding any other task's unsaved scratch
    pub async fn begin_edit(&self, id: TaskId) -> bool {
        let mut state = self.state.write().await;
        let Some(task) = state.tasks.iter().find(|t| t.id == id) else {
            return false;
        };
        let cursor = EditCursor {
            id,
            title: task.title.clone(),
            text: task.text.clone(),
        };
        state.editing = Some(cursor);
        true
    }

    /// Replace the scratch fields of the task under edit
    pub async fn edit_scratch(&self, title: impl Into<String>, text: impl Into<String>) {
        if let Some(cursor) = self.state.write().await.editing.as_mut() {
            cursor.title = title.into();
            cursor.text = text.into();
        }
    }

    /// Save the scratch fields; requires a non-empty title
    pub async fn commit_edit(&self) -> bool {
        let snapshot = self.snapshot().await;
        let Some(cursor) = snapshot.editing else {
            return false;
        };
        if cursor.title.trim().is_empty() {
            return false;
        }

        let patch = TaskPatch::content(cursor.title.clone(), cursor.text.clone());
        if let Err(e) = self.remote.update_record(&self.table, cursor.id, &patch).await {
            error!("Error updating task {}: {}", cursor.id, e);
            return false;
        }

        let tasks = snapshot
            .tasks
            .iter()
            .map(|t| {
                let mut t = t.clone();
                if t.id == cursor.id {
                    patch.apply(&mut t);
                }
                t
            })
            .collect();

        let mut state = self.state.write().await;
        state.tasks = Arc::new(tasks);
        state.editing = None;
        true
    }

    /// Leave edit mode without saving
    pub async fn cancel_edit(&self) {
        self.state.write().await.editing = None;
    }

    /// Delete one task permanently
    pub async fn delete(&self, id: TaskId) -> bool {
        let snapshot = self.tasks().await;
        if let Err(e) = self.remote.delete_record(&self.table, id).await {
            error!("Error deleting task {}: {}", id, e);
            return false;
        }

        let tasks = snapshot.iter().filter(|t| t.id != id).cloned().collect();
        let mut state = self.state.write().await;
        state.tasks = Arc::new(tasks);
        if state.editing.as_ref().is_some_and(|cursor| cursor.id == id) {
            state.editing = None;
        }
        true
    }

    pub async fn dismiss_notice(&self) {
        self.state.write().await.notice = None;
    }
}
