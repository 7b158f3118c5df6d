//! Remote data service
//!
//! The hosted auth + table backend is consumed only through
//! [`RemoteDataService`]. Each browser session gets its own handle from a
//! [`RemoteConnector`], since a handle carries that session's sign-in.

mod memory;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, ServiceError};
use crate::task::{NewTask, TaskId, TaskPatch, TaskRow};

pub use memory::{MemoryBackend, MemoryService};
pub use supabase::{SupabaseConfig, SupabaseConnector, SupabaseService};

/// The authenticated user as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful sign-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The backend opened a session right away
    SignedIn(Identity),
    /// The account exists but the address must be confirmed first
    ConfirmationRequired,
}

/// Equality filter on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub column: String,
    pub value: String,
}

impl RecordFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOrder {
    pub column: String,
    pub direction: SortDirection,
}

impl RecordOrder {
    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }
}

/// Hosted auth + table storage with row-level security
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// The signed-in user, if any
    async fn current_identity(&self) -> Option<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    /// Drop the session; never fails from the caller's point of view
    async fn sign_out(&self);

    async fn list_records(
        &self,
        table: &str,
        filter: Option<&RecordFilter>,
        order: &RecordOrder,
    ) -> Result<Vec<TaskRow>, ServiceError>;

    /// Insert one row and return it as stored
    async fn insert_record(&self, table: &str, record: &NewTask) -> Result<TaskRow, ServiceError>;

    async fn update_record(
        &self,
        table: &str,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<(), ServiceError>;

    async fn delete_record(&self, table: &str, id: TaskId) -> Result<(), ServiceError>;
}

/// Hands out one service handle per browser session
pub trait RemoteConnector: Send + Sync {
    fn connect(&self) -> Arc<dyn RemoteDataService>;
}
