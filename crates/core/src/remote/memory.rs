//! In-memory backend
//!
//! Keeps users and table rows in process memory and enforces row-level
//! security per identity. Used for local development and tests.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    Identity, RecordFilter, RecordOrder, RemoteConnector, RemoteDataService, SignUpOutcome,
    SortDirection,
};
use crate::error::{AuthError, ServiceError};
use crate::task::{NewTask, TaskId, TaskPatch, TaskRow};

const MIN_PASSWORD_LEN: usize = 6;

struct MemoryUser {
    id: String,
    password_hash: String,
}

#[derive(Default)]
struct MemoryState {
    /// Users keyed by lowercased email
    users: HashMap<String, MemoryUser>,
    tables: HashMap<String, BTreeMap<TaskId, TaskRow>>,
    next_id: i64,
    failure: Option<ServiceError>,
    data_calls: u64,
}

/// Shared storage behind every [`MemoryService`] handle
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
    confirm_email: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require address confirmation on sign-up instead of signing in
    pub fn with_email_confirmation(mut self) -> Self {
        self.confirm_email = true;
        self
    }

    /// Open a new, signed-out handle
    pub fn service(&self) -> MemoryService {
        MemoryService {
            backend: self.clone(),
            identity: RwLock::new(None),
        }
    }

    /// Create a confirmed user directly and return its identity
    pub async fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let mut state = self.state.write().await;
        register_user(&mut state, email, password)
    }

    /// Store a row as-is, keeping its id; later inserts get larger ids
    pub async fn seed(&self, table: &str, row: TaskRow) {
        let mut state = self.state.write().await;
        state.next_id = state.next_id.max(row.id.0);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(row.id, row);
    }

    /// All rows of a table regardless of owner
    pub async fn rows(&self, table: &str) -> Vec<TaskRow> {
        let state = self.state.read().await;
        state
            .tables
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every table call fail with `error` until cleared
    pub async fn inject_failure(&self, error: ServiceError) {
        self.state.write().await.failure = Some(error);
    }

    pub async fn clear_failure(&self) {
        self.state.write().await.failure = None;
    }

    /// Number of table calls received so far
    pub async fn data_calls(&self) -> u64 {
        self.state.read().await.data_calls
    }

    /// Count the call and return the injected failure, if any
    async fn begin_call(&self) -> Result<tokio::sync::RwLockWriteGuard<'_, MemoryState>, ServiceError> {
        let mut state = self.state.write().await;
        state.data_calls += 1;
        match state.failure.clone() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

impl RemoteConnector for MemoryBackend {
    fn connect(&self) -> Arc<dyn RemoteDataService> {
        Arc::new(self.service())
    }
}

/// One session's view of a [`MemoryBackend`]
pub struct MemoryService {
    backend: MemoryBackend,
    identity: RwLock<Option<Identity>>,
}

impl MemoryService {
    async fn require_identity(&self) -> Result<Identity, ServiceError> {
        self.identity
            .read()
            .await
            .clone()
            .ok_or(ServiceError::Unauthenticated)
    }
}

#[async_trait]
impl RemoteDataService for MemoryService {
    async fn current_identity(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = {
            let state = self.backend.state.read().await;
            let user = state
                .users
                .get(&email.trim().to_lowercase())
                .ok_or(AuthError::InvalidCredentials)?;
            if !verify_password(&user.password_hash, password) {
                return Err(AuthError::InvalidCredentials);
            }
            Identity {
                id: user.id.clone(),
                email: Some(email.trim().to_lowercase()),
            }
        };

        debug!("Signed in {}", identity.id);
        *self.identity.write().await = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let identity = {
            let mut state = self.backend.state.write().await;
            register_user(&mut state, email, password)?
        };

        if self.backend.confirm_email {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }

        *self.identity.write().await = Some(identity.clone());
        Ok(SignUpOutcome::SignedIn(identity))
    }

    async fn sign_out(&self) {
        *self.identity.write().await = None;
    }

    async fn list_records(
        &self,
        table: &str,
        filter: Option<&RecordFilter>,
        order: &RecordOrder,
    ) -> Result<Vec<TaskRow>, ServiceError> {
        let state = self.backend.begin_call().await?;
        // Anonymous reads see nothing under row-level security
        let Some(identity) = self.identity.read().await.clone() else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<(Value, TaskRow)> = state
            .tables
            .get(table)
            .into_iter()
            .flat_map(|rows| rows.values())
            .filter(|row| row.user_id.as_deref() == Some(identity.id.as_str()))
            .map(|row| (row_value(row), row.clone()))
            .filter(|(value, _)| filter.map_or(true, |f| matches_filter(value, f)))
            .collect();

        rows.sort_by(|(a, _), (b, _)| {
            let ordering = compare_values(&a[&order.column], &b[&order.column]);
            match order.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn insert_record(&self, table: &str, record: &NewTask) -> Result<TaskRow, ServiceError> {
        let mut state = self.backend.begin_call().await?;
        let identity = self.require_identity().await.map_err(|_| {
            ServiceError::PermissionDenied(format!(
                "new row violates row-level security policy for table \"{}\"",
                table
            ))
        })?;
        if record.user_id != identity.id {
            return Err(ServiceError::PermissionDenied(format!(
                "new row violates row-level security policy for table \"{}\"",
                table
            )));
        }

        state.next_id += 1;
        let row = TaskRow {
            id: TaskId(state.next_id),
            user_id: Some(record.user_id.clone()),
            title: Some(record.title.clone()),
            task: None,
            text: Some(record.text.clone()),
            is_complete: Some(false),
            inserted_at: Some(Utc::now()),
        };
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_record(
        &self,
        table: &str,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<(), ServiceError> {
        let mut state = self.backend.begin_call().await?;
        let identity = self.require_identity().await?;

        // Rows hidden by row-level security are silently unaffected
        if let Some(row) = state
            .tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(&id))
            .filter(|row| row.user_id.as_deref() == Some(identity.id.as_str()))
        {
            if let Some(title) = &patch.title {
                row.title = Some(title.clone());
            }
            if let Some(text) = &patch.text {
                row.text = Some(text.clone());
            }
            if let Some(is_complete) = patch.is_complete {
                row.is_complete = Some(is_complete);
            }
        }
        Ok(())
    }

    async fn delete_record(&self, table: &str, id: TaskId) -> Result<(), ServiceError> {
        let mut state = self.backend.begin_call().await?;
        let identity = self.require_identity().await?;

        if let Some(rows) = state.tables.get_mut(table) {
            let owned = rows
                .get(&id)
                .is_some_and(|row| row.user_id.as_deref() == Some(identity.id.as_str()));
            if owned {
                rows.remove(&id);
            }
        }
        Ok(())
    }
}

fn register_user(state: &mut MemoryState, email: &str, password: &str) -> Result<Identity, AuthError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidInput(
            "Unable to validate email address: invalid format".into(),
        ));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidInput(format!(
            "Password should be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    if state.users.contains_key(&email) {
        return Err(AuthError::UserAlreadyExists);
    }

    let id = Uuid::new_v4().to_string();
    state.users.insert(
        email.clone(),
        MemoryUser {
            id: id.clone(),
            password_hash: hash_password(password),
        },
    );
    Ok(Identity {
        id,
        email: Some(email),
    })
}

fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4();
    format!("v1${}${}", hex::encode(salt.as_bytes()), digest(salt.as_bytes(), password))
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    let mut parts = stored_hash.split('$');
    let (Some("v1"), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    match hex::decode(salt) {
        Ok(salt) => digest(&salt, password) == expected,
        Err(_) => false,
    }
}

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn row_value(row: &TaskRow) -> Value {
    serde_json::to_value(row).unwrap_or(Value::Null)
}

fn matches_filter(row: &Value, filter: &RecordFilter) -> bool {
    match &row[&filter.column] {
        Value::String(s) => *s == filter.value,
        Value::Null => false,
        other => other.to_string() == filter.value,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        // Nulls sort last ascending, like PostgreSQL
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "todos";

    fn row(id: i64, owner: &str, title: &str) -> TaskRow {
        TaskRow {
            id: TaskId(id),
            user_id: Some(owner.to_string()),
            title: Some(title.to_string()),
            ..TaskRow::default()
        }
    }

    async fn signed_in(backend: &MemoryBackend, email: &str) -> (MemoryService, Identity) {
        let identity = backend.register(email, "secret-pass").await.unwrap();
        let service = backend.service();
        service.sign_in(email, "secret-pass").await.unwrap();
        (service, identity)
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let backend = MemoryBackend::new();
        let service = backend.service();

        let outcome = service.sign_up("Dev@Example.com", "dev-pass").await.unwrap();
        let SignUpOutcome::SignedIn(identity) = outcome else {
            panic!("expected immediate sign-in");
        };
        assert_eq!(service.current_identity().await, Some(identity.clone()));

        service.sign_out().await;
        assert!(service.current_identity().await.is_none());

        let again = service.sign_in("dev@example.com", "dev-pass").await.unwrap();
        assert_eq!(again.id, identity.id);
    }

    #[tokio::test]
    async fn test_auth_errors() {
        let backend = MemoryBackend::new();
        let service = backend.service();
        service.sign_up("a@example.com", "password").await.unwrap();

        assert_eq!(
            service.sign_up("a@example.com", "password").await,
            Err(AuthError::UserAlreadyExists)
        );
        assert_eq!(
            service.sign_in("a@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            service.sign_in("nobody@example.com", "password").await,
            Err(AuthError::InvalidCredentials)
        );
        assert!(matches!(
            service.sign_up("b@example.com", "123").await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_email_confirmation_keeps_signed_out() {
        let backend = MemoryBackend::new().with_email_confirmation();
        let service = backend.service();

        let outcome = service.sign_up("c@example.com", "password").await.unwrap();
        assert_eq!(outcome, SignUpOutcome::ConfirmationRequired);
        assert!(service.current_identity().await.is_none());
        assert!(service.sign_in("c@example.com", "password").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_enforces_row_level_security() {
        let backend = MemoryBackend::new();
        let (service, me) = signed_in(&backend, "me@example.com").await;
        backend.seed(TABLE, row(1, &me.id, "Mine")).await;
        backend.seed(TABLE, row(2, "someone-else", "Theirs")).await;
        backend.seed(TABLE, row(3, &me.id, "Also mine")).await;

        let rows = service
            .list_records(TABLE, None, &RecordOrder::descending("id"))
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![3, 1]);

        let anonymous = backend.service();
        let rows = anonymous
            .list_records(TABLE, None, &RecordOrder::descending("id"))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_list_filter_and_ascending_order() {
        let backend = MemoryBackend::new();
        let (service, me) = signed_in(&backend, "me@example.com").await;
        backend.seed(TABLE, row(5, &me.id, "B")).await;
        backend.seed(TABLE, row(4, &me.id, "A")).await;

        let rows = service
            .list_records(
                TABLE,
                Some(&RecordFilter::eq("user_id", me.id.clone())),
                &RecordOrder::ascending("title"),
            )
            .await
            .unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["A", "B"]);

        let rows = service
            .list_records(
                TABLE,
                Some(&RecordFilter::eq("id", "5")),
                &RecordOrder::ascending("id"),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_assigns_next_id() {
        let backend = MemoryBackend::new();
        let (service, me) = signed_in(&backend, "me@example.com").await;
        backend.seed(TABLE, row(2, &me.id, "B")).await;

        let inserted = service
            .insert_record(TABLE, &NewTask::new("Buy milk", "", me.id.clone()))
            .await
            .unwrap();
        assert_eq!(inserted.id, TaskId(3));
        assert_eq!(inserted.is_complete, Some(false));
        assert!(inserted.inserted_at.is_some());
    }

    #[tokio::test]
    async fn test_insert_for_other_owner_is_rejected() {
        let backend = MemoryBackend::new();
        let (service, _me) = signed_in(&backend, "me@example.com").await;

        let result = service
            .insert_record(TABLE, &NewTask::new("Sneaky", "", "someone-else"))
            .await;
        assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));
        assert!(backend.rows(TABLE).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_skip_foreign_rows() {
        let backend = MemoryBackend::new();
        let (service, me) = signed_in(&backend, "me@example.com").await;
        backend.seed(TABLE, row(1, &me.id, "Mine")).await;
        backend.seed(TABLE, row(2, "someone-else", "Theirs")).await;

        service
            .update_record(TABLE, TaskId(2), &TaskPatch::completion(true))
            .await
            .unwrap();
        service.delete_record(TABLE, TaskId(2)).await.unwrap();
        service
            .update_record(TABLE, TaskId(1), &TaskPatch::content("Renamed", "x"))
            .await
            .unwrap();

        let rows = backend.rows(TABLE).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title.as_deref(), Some("Renamed"));
        assert_eq!(rows[1].is_complete, None);

        service.delete_record(TABLE, TaskId(1)).await.unwrap();
        assert_eq!(backend.rows(TABLE).await.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_and_call_count() {
        let backend = MemoryBackend::new();
        let (service, _me) = signed_in(&backend, "me@example.com").await;

        backend
            .inject_failure(ServiceError::Transport("connection reset".into()))
            .await;
        let result = service
            .list_records(TABLE, None, &RecordOrder::descending("id"))
            .await;
        assert!(matches!(result, Err(ServiceError::Transport(_))));

        backend.clear_failure().await;
        assert!(service
            .list_records(TABLE, None, &RecordOrder::descending("id"))
            .await
            .is_ok());
        assert_eq!(backend.data_calls().await, 2);
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter22");
        assert!(verify_password(&hash, "hunter22"));
        assert!(!verify_password(&hash, "hunter23"));
        assert!(!verify_password("garbage", "hunter22"));
    }
}
